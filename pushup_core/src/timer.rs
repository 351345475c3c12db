//! Stopwatch, countdown and rest timer state machines.
//!
//! These types only know how to react to a tick; they never schedule
//! anything. The engine owns the tick registrations and decides which
//! ticks are live.
//!
//! ## State Transitions
//!
//! ```text
//! Stopwatch:  Idle -> Running -> Idle
//! Countdown:  Idle -> Running -> [finished] -> Idle
//! Rest:       Idle -> Running -> [finished] -> Idle
//! ```
//!
//! Finishing is reported by the `tick()` call that reaches the end; the
//! timer is already back in `Idle` when that call returns.

use crate::types::CountdownConfig;
use serde::{Deserialize, Serialize};

/// Longest countdown that can be configured (59:59)
pub const MAX_COUNTDOWN_SECS: u32 = 59 * 60 + 59;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
}

/// Format whole seconds as `m:ss`
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

// ============================================================================
// Stopwatch
// ============================================================================

/// Counts up one second per tick with no terminal state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stopwatch {
    state: TimerState,
    elapsed_secs: f64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Returns true if the stopwatch was idle and is now running
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = TimerState::Running;
        true
    }

    /// Returns true if the stopwatch was running. Idempotent.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = TimerState::Idle;
        was_running
    }

    pub fn tick(&mut self) {
        if self.is_running() {
            self.elapsed_secs += 1.0;
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.elapsed_secs = 0.0;
    }
}

// ============================================================================
// Countdown
// ============================================================================

impl CountdownConfig {
    /// Add time, carrying seconds into minutes, capped at 59:59
    pub fn increase(&mut self, minutes: u32, seconds: u32) {
        let total = self
            .total_seconds()
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds)
            .min(MAX_COUNTDOWN_SECS);
        self.set_total(total);
    }

    /// Remove time, borrowing minutes for seconds, floored at 0:00
    pub fn decrease(&mut self, minutes: u32, seconds: u32) {
        let total = self
            .total_seconds()
            .saturating_sub(minutes.saturating_mul(60))
            .saturating_sub(seconds);
        self.set_total(total);
    }

    /// Clamp stored values into 0..=59 each
    pub fn normalized(self) -> Self {
        Self {
            minutes: self.minutes.min(59),
            seconds: self.seconds.min(59),
        }
    }

    fn set_total(&mut self, total: u32) {
        self.minutes = total / 60;
        self.seconds = total % 60;
    }
}

/// Counts elapsed seconds toward a configured duration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Countdown {
    config: CountdownConfig,
    state: TimerState,
    elapsed_secs: f64,
}

impl Countdown {
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            config: config.normalized(),
            state: TimerState::Idle,
            elapsed_secs: 0.0,
        }
    }

    pub fn config(&self) -> CountdownConfig {
        self.config
    }

    pub fn config_mut(&mut self) -> &mut CountdownConfig {
        &mut self.config
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn duration_secs(&self) -> f64 {
        self.config.total_seconds() as f64
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn remaining_secs(&self) -> f64 {
        (self.duration_secs() - self.elapsed_secs).max(0.0)
    }

    /// 0.0 ..= 1.0
    pub fn progress(&self) -> f64 {
        let total = self.duration_secs();
        if total <= 0.0 {
            return 0.0;
        }
        (self.elapsed_secs / total).min(1.0)
    }

    /// Remaining time while running, configured time otherwise
    pub fn display(&self) -> String {
        if self.is_running() {
            format_clock(self.remaining_secs())
        } else {
            format!("{}:{:02}", self.config.minutes, self.config.seconds)
        }
    }

    /// Whether the last run reached the configured duration
    pub fn is_finished(&self) -> bool {
        let total = self.duration_secs();
        !self.is_running() && total > 0.0 && self.elapsed_secs >= total
    }

    /// Start or resume. A finished countdown starts over from zero.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        if self.is_finished() {
            self.elapsed_secs = 0.0;
        }
        self.state = TimerState::Running;
        true
    }

    /// Pause, keeping elapsed time. Idempotent.
    pub fn pause(&mut self) -> bool {
        let was_running = self.is_running();
        if was_running {
            self.state = TimerState::Idle;
        }
        was_running
    }

    /// Advance one second. Returns true on the tick that finishes the countdown.
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.elapsed_secs += 1.0;
        let total = self.duration_secs();
        if total > 0.0 && self.elapsed_secs >= total {
            self.state = TimerState::Idle;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.elapsed_secs = 0.0;
    }
}

// ============================================================================
// Rest Timer
// ============================================================================

/// Counts down from the configured rest duration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestTimer {
    state: TimerState,
    remaining_secs: f64,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    /// Remaining time as `Ns`
    pub fn display(&self) -> String {
        format!("{}s", self.remaining_secs.max(0.0) as u64)
    }

    /// (Re)start from the full duration. Never stacks.
    pub fn start(&mut self, duration_secs: u32) {
        self.remaining_secs = duration_secs as f64;
        self.state = TimerState::Running;
    }

    /// Returns true if the timer was running. Idempotent.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = TimerState::Idle;
        self.remaining_secs = 0.0;
        was_running
    }

    /// Count down one second. Returns true on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.remaining_secs = (self.remaining_secs - 1.0).max(0.0);
        if self.remaining_secs <= 0.0 {
            self.state = TimerState::Idle;
            return true;
        }
        false
    }
}
