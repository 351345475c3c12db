//! Daily reset and streak continuity.
//!
//! A streak credits the day a session was *completed*: `last_workout_date`
//! only moves on session completion, and the comparison is made between
//! calendar days, not elapsed hours.

use crate::types::LifetimeStats;
use chrono::NaiveDate;

/// What a daily evaluation decided
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DailyReset {
    /// Already evaluated for this calendar day
    AlreadyEvaluated,
    /// No session has ever been completed
    ColdStart,
    /// Last session was today
    SameDay,
    /// Last session was yesterday; streak extended
    Continued { streak: u32 },
    /// Gap of more than one day; streak cleared
    Broken { days_missed: i64 },
}

impl DailyReset {
    /// Whether the aggregates changed and need saving
    pub fn changed_stats(&self) -> bool {
        !matches!(self, DailyReset::AlreadyEvaluated)
    }
}

/// Whole calendar days from `from` to `to`
pub fn calendar_day_difference(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Apply the daily-reset rules to `stats` for `today`
///
/// `last_workout_day` is the calendar day of `stats.last_workout_date`,
/// resolved by the caller's clock. Runs at most once per calendar day.
pub fn evaluate_daily_reset(
    stats: &mut LifetimeStats,
    last_workout_day: Option<NaiveDate>,
    today: NaiveDate,
) -> DailyReset {
    if stats.last_evaluated_day == Some(today) {
        return DailyReset::AlreadyEvaluated;
    }
    stats.last_evaluated_day = Some(today);

    let Some(last_day) = last_workout_day else {
        stats.current_streak = 0;
        return DailyReset::ColdStart;
    };

    let days = calendar_day_difference(last_day, today);
    // A clock moved backwards counts as the same day
    if days <= 0 {
        return DailyReset::SameDay;
    }

    stats.today_total = 0;
    stats.goal_achieved_today = false;

    if days == 1 {
        stats.current_streak += 1;
        tracing::info!("Streak continues: {} days", stats.current_streak);
        DailyReset::Continued {
            streak: stats.current_streak,
        }
    } else {
        tracing::info!(
            "Last workout was {} days ago, resetting streak of {}",
            days,
            stats.current_streak
        );
        stats.current_streak = 0;
        DailyReset::Broken { days_missed: days - 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stats_with_streak(streak: u32) -> LifetimeStats {
        LifetimeStats {
            current_streak: streak,
            today_total: 40,
            goal_achieved_today: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_yesterday_extends_streak_and_clears_daily_fields() {
        let mut stats = stats_with_streak(3);
        let outcome = evaluate_daily_reset(&mut stats, Some(day(2024, 5, 1)), day(2024, 5, 2));

        assert_eq!(outcome, DailyReset::Continued { streak: 4 });
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.today_total, 0);
        assert!(!stats.goal_achieved_today);
    }

    #[test]
    fn test_gap_breaks_streak() {
        let mut stats = stats_with_streak(5);
        let outcome = evaluate_daily_reset(&mut stats, Some(day(2024, 5, 1)), day(2024, 5, 4));

        assert_eq!(outcome, DailyReset::Broken { days_missed: 2 });
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.today_total, 0);
    }

    #[test]
    fn test_same_day_changes_nothing() {
        let mut stats = stats_with_streak(2);
        let outcome = evaluate_daily_reset(&mut stats, Some(day(2024, 5, 1)), day(2024, 5, 1));

        assert_eq!(outcome, DailyReset::SameDay);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.today_total, 40);
        assert!(stats.goal_achieved_today);
    }

    #[test]
    fn test_cold_start_zeroes_streak_only() {
        let mut stats = stats_with_streak(9);
        let outcome = evaluate_daily_reset(&mut stats, None, day(2024, 5, 1));

        assert_eq!(outcome, DailyReset::ColdStart);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.today_total, 40);
    }

    #[test]
    fn test_runs_once_per_day() {
        let mut stats = stats_with_streak(3);
        evaluate_daily_reset(&mut stats, Some(day(2024, 5, 1)), day(2024, 5, 2));
        let second = evaluate_daily_reset(&mut stats, Some(day(2024, 5, 1)), day(2024, 5, 2));

        assert_eq!(second, DailyReset::AlreadyEvaluated);
        assert_eq!(stats.current_streak, 4);
    }

    #[test]
    fn test_calendar_difference_crosses_month_and_year() {
        assert_eq!(calendar_day_difference(day(2023, 12, 31), day(2024, 1, 1)), 1);
        assert_eq!(calendar_day_difference(day(2024, 2, 28), day(2024, 3, 1)), 2);
    }
}
