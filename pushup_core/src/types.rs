//! Core domain types for the push-up tracker.
//!
//! This module defines the data model shared by the engine and its
//! collaborators:
//! - Session state and lifetime aggregates
//! - Completed session history records
//! - User settings and timer configuration
//! - The versioned snapshot handed to the persistence gateway

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current snapshot format written by [`crate::store::JsonFileStore`].
pub const STATE_VERSION: u32 = 1;

/// Daily goal used when none is stored (or a zero goal was stored).
pub const DEFAULT_DAILY_GOAL: u32 = 50;

/// Rest timer length used when none is stored.
pub const DEFAULT_REST_DURATION_SECS: u32 = 60;

// ============================================================================
// Timer Identity
// ============================================================================

/// Which timer acts as the session timer
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Count up from the first rep
    #[default]
    Stopwatch,
    /// Count toward a configured countdown duration
    Counter,
}

/// The three independent timers driven by the scheduler
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Stopwatch,
    Countdown,
    Rest,
}

// ============================================================================
// Session and Aggregate Types
// ============================================================================

/// The in-progress set. Never persisted; lost if the process exits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub current_count: u32,
    /// One instant per counted rep, oldest first
    pub rep_timestamps: Vec<DateTime<Utc>>,
}

/// Lifetime aggregates and daily bookkeeping
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifetimeStats {
    pub personal_best: u32,
    pub total_reps: u32,
    pub sessions_completed: u32,
    pub today_total: u32,
    /// Running total since the last `reset_all`; there is no weekly rollover
    pub week_total: u32,
    pub current_streak: u32,
    pub goal_achieved_today: bool,
    /// Set only when a session is completed
    pub last_workout_date: Option<DateTime<Utc>>,
    /// Last calendar day the daily reset ran for
    pub last_evaluated_day: Option<NaiveDate>,
}

/// A completed session, newest first in history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub count: u32,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl WorkoutSession {
    /// Duration as `m:ss`
    pub fn formatted_duration(&self) -> String {
        crate::timer::format_clock(self.duration_seconds)
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Configured countdown length
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CountdownConfig {
    pub minutes: u32,
    pub seconds: u32,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            minutes: 1,
            seconds: 0,
        }
    }
}

impl CountdownConfig {
    pub fn total_seconds(&self) -> u32 {
        self.minutes * 60 + self.seconds
    }
}

/// User-facing toggles and numbers that survive restarts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub daily_goal: u32,
    pub sound_enabled: bool,
    pub voice_count_enabled: bool,
    pub auto_rest_timer: bool,
    pub rest_duration_secs: u32,
    pub daily_reminders_enabled: bool,
    pub reminder_time: NaiveTime,
    pub milestone_notifications: bool,
    pub goal_notifications: bool,
    pub streak_reminders: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
            sound_enabled: true,
            voice_count_enabled: false,
            auto_rest_timer: false,
            rest_duration_secs: DEFAULT_REST_DURATION_SECS,
            daily_reminders_enabled: false,
            reminder_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            milestone_notifications: true,
            goal_notifications: true,
            streak_reminders: true,
        }
    }
}

// ============================================================================
// Persisted Snapshot
// ============================================================================

/// Everything the persistence gateway stores, written as one unit
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersistedState {
    pub version: u32,
    pub stats: LifetimeStats,
    pub settings: Settings,
    pub timer_mode: TimerMode,
    pub countdown: CountdownConfig,
    /// Most recent first. Corrupt entries are dropped individually on load.
    #[serde(deserialize_with = "crate::store::lenient_history")]
    pub session_history: Vec<WorkoutSession>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            stats: LifetimeStats::default(),
            settings: Settings::default(),
            timer_mode: TimerMode::default(),
            countdown: CountdownConfig::default(),
            session_history: Vec::new(),
        }
    }
}
