//! Side effects the engine asks its collaborators to perform.
//!
//! Every mutating engine call returns the events it produced, in order.
//! Notification delivery, haptics and audio live outside the core; they
//! consume these values.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::types::WorkoutSession;

/// Rep counts that raise a milestone notification
pub const MILESTONES: [u32; 11] = [10, 25, 50, 75, 100, 150, 200, 250, 300, 500, 1000];

/// Voice count speaks every this many reps
pub const VOICE_COUNT_CADENCE: u32 = 5;

pub fn is_milestone(count: u32) -> bool {
    MILESTONES.contains(&count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticCue {
    Light,
    Medium,
    Heavy,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Click,
    Success,
    Complete,
    Beep,
    Achievement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RepCounted {
        count: u32,
    },
    PersonalBest {
        count: u32,
    },
    Milestone {
        count: u32,
    },
    /// Daily goal crossed; at most once per day
    GoalAchieved {
        goal: u32,
    },
    /// Voice-count announcement
    Speak {
        count: u32,
    },
    SessionCompleted {
        session: WorkoutSession,
    },
    CountdownFinished,
    RestStarted {
        duration_secs: u32,
    },
    RestFinished,
    AchievementUnlocked {
        /// First catalog entry sitting exactly on its target, if any
        title: Option<String>,
    },
    StreakContinues {
        streak: u32,
    },
    /// Daily reminder should be (re)scheduled, or cancelled when `at` is None
    ReminderScheduleChanged {
        at: Option<NaiveTime>,
    },
    Haptic {
        cue: HapticCue,
    },
    Sound {
        cue: SoundCue,
    },
}

impl Event {
    /// True for events the notification collaborator turns into alerts
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Event::Milestone { .. }
                | Event::GoalAchieved { .. }
                | Event::CountdownFinished
                | Event::RestFinished
                | Event::AchievementUnlocked { .. }
                | Event::StreakContinues { .. }
        )
    }
}
