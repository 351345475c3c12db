//! Built-in achievement catalog and unlock detection.
//!
//! The catalog is fixed and ordered. Progress is never stored: it is
//! recomputed from [`LifetimeStats`] each time it is needed.

use crate::types::LifetimeStats;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Aggregate an achievement measures
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementMetric {
    TotalReps,
    PersonalBest,
    CurrentStreak,
    SessionsCompleted,
}

impl AchievementMetric {
    pub fn read(&self, stats: &LifetimeStats) -> u32 {
        match self {
            AchievementMetric::TotalReps => stats.total_reps,
            AchievementMetric::PersonalBest => stats.personal_best,
            AchievementMetric::CurrentStreak => stats.current_streak,
            AchievementMetric::SessionsCompleted => stats.sessions_completed,
        }
    }
}

/// Grouping used for display
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
    FirstReps,
    SessionMilestone,
    Streak,
    SessionCount,
    LifetimeTotal,
}

/// A catalog entry
#[derive(Clone, Debug, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub tier: AchievementTier,
    pub metric: AchievementMetric,
    pub target: u32,
}

/// A catalog entry evaluated against current stats
#[derive(Clone, Debug, Serialize)]
pub struct Achievement {
    pub def: &'static AchievementDef,
    pub current_progress: u32,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.current_progress >= self.def.target
    }

    /// 0.0 ..= 1.0 for progress bars
    pub fn progress_ratio(&self) -> f64 {
        (self.current_progress as f64 / self.def.target as f64).min(1.0)
    }
}

static CATALOG: Lazy<Vec<AchievementDef>> = Lazy::new(build_catalog);

/// The fixed catalog, in display order
pub fn catalog() -> &'static [AchievementDef] {
    &CATALOG
}

fn entry(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    tier: AchievementTier,
    metric: AchievementMetric,
    target: u32,
) -> AchievementDef {
    AchievementDef {
        id,
        title,
        description,
        icon,
        tier,
        metric,
        target,
    }
}

fn build_catalog() -> Vec<AchievementDef> {
    use AchievementMetric::*;
    use AchievementTier::*;

    vec![
        // First reps
        entry("first_step", "First Step", "Complete 1 push-up", "figure.walk", FirstReps, TotalReps, 1),
        entry("getting_started", "Getting Started", "Complete 10 push-ups", "star.fill", FirstReps, TotalReps, 10),
        entry("warm_up", "Warm Up", "Complete 25 push-ups", "bolt.fill", FirstReps, TotalReps, 25),
        // Best single session
        entry("half_century", "Half Century", "Complete 50 push-ups in one session", "50.circle.fill", SessionMilestone, PersonalBest, 50),
        entry("iron_arms", "Iron Arms", "Complete 75 push-ups in one session", "hammer.fill", SessionMilestone, PersonalBest, 75),
        entry("century_club", "Century Club", "Complete 100 push-ups in one session", "100.circle.fill", SessionMilestone, PersonalBest, 100),
        // Streaks
        entry("consistent", "Consistent", "Complete a 7-day streak", "flame.fill", Streak, CurrentStreak, 7),
        entry("on_fire", "On Fire", "Complete a 14-day streak", "flame.circle.fill", Streak, CurrentStreak, 14),
        entry("unbreakable", "Unbreakable", "Complete a 30-day streak", "shield.fill", Streak, CurrentStreak, 30),
        // Sessions
        entry("dedicated", "Dedicated", "Complete 30 sessions", "calendar.badge.checkmark", SessionCount, SessionsCompleted, 30),
        entry("habit_builder", "Habit Builder", "Complete 75 sessions", "calendar.circle.fill", SessionCount, SessionsCompleted, 75),
        entry("daily_grinder", "Daily Grinder", "Complete 150 sessions", "clock.fill", SessionCount, SessionsCompleted, 150),
        // Lifetime totals
        entry("thousand_club", "Thousand Club", "Complete 1,000 total push-ups", "trophy.fill", LifetimeTotal, TotalReps, 1_000),
        entry("iron_chest", "Iron Chest", "Complete 5,000 total push-ups", "medal.fill", LifetimeTotal, TotalReps, 5_000),
        entry("push_up_legend", "Push-Up Legend", "Complete 10,000 total push-ups", "crown.fill", LifetimeTotal, TotalReps, 10_000),
    ]
}

/// Evaluate every catalog entry against `stats`
pub fn evaluate(stats: &LifetimeStats) -> Vec<Achievement> {
    catalog()
        .iter()
        .map(|def| Achievement {
            def,
            current_progress: def.metric.read(stats),
        })
        .collect()
}

pub fn unlocked_count(stats: &LifetimeStats) -> usize {
    evaluate(stats).iter().filter(|a| a.is_unlocked()).count()
}

/// Result of comparing a new evaluation with the previous one
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlockDelta {
    pub unlocked_count: usize,
    /// True only when the unlocked count strictly increased
    pub newly_unlocked: bool,
    /// Title to announce: first entry whose progress equals its target
    pub headline: Option<&'static str>,
}

/// Re-evaluate and compare against the previously observed unlocked count
pub fn detect_unlock(previous_count: usize, stats: &LifetimeStats) -> UnlockDelta {
    let achievements = evaluate(stats);
    let unlocked_count = achievements.iter().filter(|a| a.is_unlocked()).count();
    let newly_unlocked = unlocked_count > previous_count;
    let headline = if newly_unlocked {
        achievements
            .iter()
            .find(|a| a.current_progress == a.def.target)
            .map(|a| a.def.title)
    } else {
        None
    };

    UnlockDelta {
        unlocked_count,
        newly_unlocked,
        headline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 15);

        let targets: Vec<u32> = catalog.iter().map(|d| d.target).collect();
        assert_eq!(
            targets,
            vec![1, 10, 25, 50, 75, 100, 7, 14, 30, 30, 75, 150, 1000, 5000, 10000]
        );
        assert!(catalog.iter().all(|d| d.target > 0));
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = catalog().iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn test_first_step_unlocks_at_one_rep() {
        let mut stats = LifetimeStats::default();
        assert_eq!(unlocked_count(&stats), 0);

        stats.total_reps = 1;
        let first = &evaluate(&stats)[0];
        assert_eq!(first.def.title, "First Step");
        assert!(first.is_unlocked());
    }

    #[test]
    fn test_detect_unlock_only_on_increase() {
        let mut stats = LifetimeStats::default();
        stats.total_reps = 1;

        let delta = detect_unlock(0, &stats);
        assert!(delta.newly_unlocked);
        assert_eq!(delta.headline, Some("First Step"));

        stats.total_reps = 2;
        let again = detect_unlock(delta.unlocked_count, &stats);
        assert!(!again.newly_unlocked);
        assert_eq!(again.headline, None);
    }

    #[test]
    fn test_headline_picks_first_exact_match() {
        let stats = LifetimeStats {
            total_reps: 30,
            personal_best: 50,
            ..Default::default()
        };
        let delta = detect_unlock(3, &stats);
        assert!(delta.newly_unlocked);
        assert_eq!(delta.headline, Some("Half Century"));
    }

    #[test]
    fn test_metrics_bind_to_stats() {
        let stats = LifetimeStats {
            current_streak: 14,
            sessions_completed: 31,
            ..Default::default()
        };
        let unlocked: Vec<_> = evaluate(&stats)
            .into_iter()
            .filter(|a| a.is_unlocked())
            .map(|a| a.def.id)
            .collect();
        assert_eq!(unlocked, vec!["consistent", "on_fire", "dedicated"]);
    }
}
