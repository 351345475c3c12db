//! The workout state engine.
//!
//! [`WorkoutEngine`] owns the session counter, the lifetime aggregates, the
//! three timers and their tick registrations. Every user action is a method
//! call that returns the [`Event`]s it produced; every action that changes
//! persisted data ends with a synchronous save through the [`StateStore`].
//!
//! Timer ticks arrive through [`WorkoutEngine::pump`] (or
//! [`WorkoutEngine::on_tick`] directly). A tick is applied only if its
//! handle is the live registration for that timer, so a tick that was
//! already queued when its timer was stopped or a session was reset is
//! dropped instead of mutating state.

use crate::achievements::{self, Achievement};
use crate::clock::{Clock, Tick, TickHandle};
use crate::events::{is_milestone, Event, HapticCue, SoundCue, VOICE_COUNT_CADENCE};
use crate::store::StateStore;
use crate::streak::{self, DailyReset};
use crate::timer::{Countdown, RestTimer, Stopwatch};
use crate::types::*;
use crate::Result;
use uuid::Uuid;

/// Every timer ticks once per second
pub const TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Default)]
struct TickHandles {
    stopwatch: Option<TickHandle>,
    countdown: Option<TickHandle>,
    rest: Option<TickHandle>,
}

impl TickHandles {
    fn slot(&mut self, timer: TimerKind) -> &mut Option<TickHandle> {
        match timer {
            TimerKind::Stopwatch => &mut self.stopwatch,
            TimerKind::Countdown => &mut self.countdown,
            TimerKind::Rest => &mut self.rest,
        }
    }

    fn get(&self, timer: TimerKind) -> Option<TickHandle> {
        match timer {
            TimerKind::Stopwatch => self.stopwatch,
            TimerKind::Countdown => self.countdown,
            TimerKind::Rest => self.rest,
        }
    }
}

/// Counter, timers, streaks and achievements behind one owner
pub struct WorkoutEngine<C: Clock, S: StateStore> {
    clock: C,
    store: S,
    stats: LifetimeStats,
    settings: Settings,
    timer_mode: TimerMode,
    history: Vec<WorkoutSession>,
    session: SessionState,
    stopwatch: Stopwatch,
    countdown: Countdown,
    rest: RestTimer,
    handles: TickHandles,
    unlocked_count: usize,
    has_new_achievement: bool,
}

impl<C: Clock, S: StateStore> WorkoutEngine<C, S> {
    /// Load persisted state and run the startup daily reset
    ///
    /// Returns the engine together with the events the daily reset produced
    /// (streak continuation, achievements unlocked by it).
    pub fn open(clock: C, store: S) -> Result<(Self, Vec<Event>)> {
        let state = store.load()?;
        let unlocked_count = achievements::unlocked_count(&state.stats);

        let mut engine = Self {
            clock,
            store,
            stats: state.stats,
            settings: state.settings,
            timer_mode: state.timer_mode,
            history: state.session_history,
            session: SessionState::default(),
            stopwatch: Stopwatch::new(),
            countdown: Countdown::new(state.countdown),
            rest: RestTimer::new(),
            handles: TickHandles::default(),
            unlocked_count,
            has_new_achievement: false,
        };

        tracing::info!(
            "Engine ready: {} total reps, {} sessions, streak {}",
            engine.stats.total_reps,
            engine.stats.sessions_completed,
            engine.stats.current_streak
        );

        let events = engine.evaluate_daily_reset()?;
        Ok((engine, events))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn stats(&self) -> &LifetimeStats {
        &self.stats
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timer_mode(&self) -> TimerMode {
        self.timer_mode
    }

    /// Completed sessions, most recent first
    pub fn history(&self) -> &[WorkoutSession] {
        &self.history
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn current_count(&self) -> u32 {
        self.session.current_count
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn rest_timer(&self) -> &RestTimer {
        &self.rest
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Live tick registration for `timer`, if it is running
    pub fn tick_handle(&self, timer: TimerKind) -> Option<TickHandle> {
        self.handles.get(timer)
    }

    /// Elapsed time of whichever timer the current mode uses
    pub fn session_elapsed_secs(&self) -> f64 {
        match self.timer_mode {
            TimerMode::Stopwatch => self.stopwatch.elapsed_secs(),
            TimerMode::Counter => self.countdown.elapsed_secs(),
        }
    }

    pub fn reps_per_minute(&self) -> u32 {
        let elapsed = self.session_elapsed_secs();
        if elapsed <= 0.0 {
            return 0;
        }
        (self.session.current_count as f64 / elapsed * 60.0).round() as u32
    }

    pub fn average_per_session(&self) -> u32 {
        if self.stats.sessions_completed == 0 {
            return 0;
        }
        self.stats.total_reps / self.stats.sessions_completed
    }

    /// Raw ratio of today's reps to the goal; may exceed 1.0
    pub fn goal_progress(&self) -> f64 {
        if self.settings.daily_goal == 0 {
            return 0.0;
        }
        self.stats.today_total as f64 / self.settings.daily_goal as f64
    }

    /// Goal progress clamped for progress bars
    pub fn goal_progress_display(&self) -> f64 {
        self.goal_progress().min(1.0)
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        achievements::evaluate(&self.stats)
    }

    pub fn has_new_achievement(&self) -> bool {
        self.has_new_achievement
    }

    pub fn clear_new_achievement(&mut self) {
        self.has_new_achievement = false;
    }

    /// The snapshot handed to the store
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            version: STATE_VERSION,
            stats: self.stats.clone(),
            settings: self.settings.clone(),
            timer_mode: self.timer_mode,
            countdown: self.countdown.config(),
            session_history: self.history.clone(),
        }
    }

    // ── Counter ──────────────────────────────────────────────────────

    /// Count one rep
    pub fn increment(&mut self) -> Result<Vec<Event>> {
        let mut events = self.count_rep();
        self.refresh_achievements(&mut events);
        self.persist()?;
        Ok(events)
    }

    /// Remove the last rep of the current session. No-op at zero.
    pub fn decrement(&mut self) -> Result<Vec<Event>> {
        if self.session.current_count == 0 {
            return Ok(Vec::new());
        }

        // Settle a day change first so the undo lands on today's total
        let mut events = self.apply_daily_reset();

        self.session.current_count -= 1;
        self.session.rep_timestamps.pop();
        self.stats.total_reps = self.stats.total_reps.saturating_sub(1);
        self.stats.today_total = self.stats.today_total.saturating_sub(1);
        self.stats.week_total = self.stats.week_total.saturating_sub(1);
        tracing::debug!("Rep removed, count now {}", self.session.current_count);

        events.push(Event::Haptic {
            cue: HapticCue::Light,
        });

        // Undoing a rep never lowers the unlock baseline, so redoing it
        // does not announce the same achievement twice
        let baseline = self.unlocked_count;
        self.refresh_achievements(&mut events);
        self.unlocked_count = self.unlocked_count.max(baseline);

        self.persist()?;
        Ok(events)
    }

    /// Count `n` reps one at a time, keeping every per-rep side effect
    pub fn quick_add(&mut self, n: u32) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(self.increment()?);
        }
        Ok(events)
    }

    fn count_rep(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        // A rep after midnight belongs to the new day
        let mut events = self.apply_daily_reset();

        self.session.current_count += 1;
        self.session.rep_timestamps.push(now);
        self.stats.total_reps = self.stats.total_reps.saturating_add(1);
        self.stats.today_total = self.stats.today_total.saturating_add(1);
        self.stats.week_total = self.stats.week_total.saturating_add(1);

        let count = self.session.current_count;
        tracing::debug!("Rep counted: {} (today {})", count, self.stats.today_total);
        events.push(Event::RepCounted { count });

        // First rep of a stopwatch session starts timing
        if self.timer_mode == TimerMode::Stopwatch && !self.stopwatch.is_running() {
            self.start_stopwatch();
        }

        if count > self.stats.personal_best {
            self.stats.personal_best = count;
            events.push(Event::PersonalBest { count });
            events.push(Event::Haptic {
                cue: HapticCue::Success,
            });
            self.push_sound(&mut events, SoundCue::Success);
        } else {
            events.push(Event::Haptic {
                cue: HapticCue::Light,
            });
            self.push_sound(&mut events, SoundCue::Click);
        }

        if self.settings.voice_count_enabled && count % VOICE_COUNT_CADENCE == 0 {
            events.push(Event::Speak { count });
        }

        if self.settings.milestone_notifications && is_milestone(count) {
            events.push(Event::Milestone { count });
        }

        let goal = self.settings.daily_goal;
        if goal > 0 && !self.stats.goal_achieved_today && self.stats.today_total >= goal {
            self.stats.goal_achieved_today = true;
            tracing::info!("Daily goal of {} reached", goal);
            if self.settings.goal_notifications {
                events.push(Event::GoalAchieved { goal });
            }
        }

        if self.settings.auto_rest_timer {
            events.extend(self.start_rest_timer());
        }

        events
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Close the current session into history. No-op at zero.
    pub fn reset_session(&mut self) -> Result<Vec<Event>> {
        if self.session.current_count == 0 {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let session = WorkoutSession {
            id: Uuid::new_v4(),
            count: self.session.current_count,
            completed_at: now,
            duration_seconds: self.session_elapsed_secs().max(0.0),
        };
        self.history.insert(0, session.clone());
        self.stats.sessions_completed += 1;

        self.session = SessionState::default();
        self.stop_all_timers();
        self.stopwatch.reset();
        self.countdown.reset();

        tracing::info!(
            "Session completed: {} reps in {}",
            session.count,
            session.formatted_duration()
        );

        let mut events = vec![
            Event::SessionCompleted { session },
            Event::Haptic {
                cue: HapticCue::Medium,
            },
        ];
        self.push_sound(&mut events, SoundCue::Complete);

        // Normally settled by the first rep of the day already
        events.extend(self.apply_daily_reset());
        self.stats.last_workout_date = Some(now);

        self.refresh_achievements(&mut events);
        self.persist()?;
        Ok(events)
    }

    /// Remove one history entry. Aggregates are left as they are.
    pub fn delete_session(&mut self, id: Uuid) -> Result<bool> {
        let before = self.history.len();
        self.history.retain(|s| s.id != id);
        if self.history.len() == before {
            tracing::debug!("No session {} to delete", id);
            return Ok(false);
        }

        tracing::info!("Deleted session {}", id);
        self.persist()?;
        Ok(true)
    }

    /// Zero every counter, streak and history entry. Irreversible.
    pub fn reset_all(&mut self) -> Result<Vec<Event>> {
        self.stop_all_timers();
        self.stopwatch.reset();
        self.countdown.reset();

        self.session = SessionState::default();
        self.history.clear();
        self.stats = LifetimeStats {
            last_evaluated_day: Some(self.clock.today()),
            ..LifetimeStats::default()
        };
        self.unlocked_count = achievements::unlocked_count(&self.stats);
        self.has_new_achievement = false;

        tracing::info!("All statistics and history reset");
        self.persist()?;
        Ok(vec![Event::Haptic {
            cue: HapticCue::Heavy,
        }])
    }

    // ── Daily reset ──────────────────────────────────────────────────

    /// Re-run the day-boundary check, e.g. when the app resumes
    pub fn evaluate_daily_reset(&mut self) -> Result<Vec<Event>> {
        let before = self.stats.clone();
        let mut events = self.apply_daily_reset();
        if self.stats == before {
            return Ok(events);
        }
        self.refresh_achievements(&mut events);
        self.persist()?;
        Ok(events)
    }

    fn apply_daily_reset(&mut self) -> Vec<Event> {
        let last_day = self
            .stats
            .last_workout_date
            .map(|at| self.clock.local_date(at));
        let today = self.clock.today();

        let outcome = streak::evaluate_daily_reset(&mut self.stats, last_day, today);
        tracing::debug!("Daily reset for {}: {:?}", today, outcome);

        match outcome {
            DailyReset::Continued { streak }
                if streak > 0 && self.settings.streak_reminders =>
            {
                vec![Event::StreakContinues { streak }]
            }
            _ => Vec::new(),
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Change settings through a closure, then normalise and save
    pub fn update_settings<F>(&mut self, f: F) -> Result<Vec<Event>>
    where
        F: FnOnce(&mut Settings),
    {
        let before = self.settings.clone();
        f(&mut self.settings);

        if self.settings.daily_goal == 0 {
            self.settings.daily_goal = DEFAULT_DAILY_GOAL;
        }
        if self.settings.rest_duration_secs == 0 {
            self.settings.rest_duration_secs = DEFAULT_REST_DURATION_SECS;
        }

        let mut events = Vec::new();
        if before.daily_reminders_enabled != self.settings.daily_reminders_enabled
            || before.reminder_time != self.settings.reminder_time
        {
            let at = self
                .settings
                .daily_reminders_enabled
                .then_some(self.settings.reminder_time);
            events.push(Event::ReminderScheduleChanged { at });
        }

        if before != self.settings {
            tracing::info!("Settings updated");
            self.persist()?;
        }
        Ok(events)
    }

    /// Choose the session timer; the one no longer in use is paused
    pub fn set_timer_mode(&mut self, mode: TimerMode) -> Result<()> {
        if mode == self.timer_mode {
            return Ok(());
        }
        match self.timer_mode {
            TimerMode::Stopwatch => self.stop_stopwatch(),
            TimerMode::Counter => self.pause_countdown(),
        }
        self.timer_mode = mode;
        tracing::info!("Timer mode set to {:?}", mode);
        self.persist()
    }

    /// Set the countdown length outright, each part clamped to 0..=59
    pub fn set_countdown(&mut self, minutes: u32, seconds: u32) -> Result<()> {
        *self.countdown.config_mut() = CountdownConfig { minutes, seconds }.normalized();
        self.persist()
    }

    pub fn increase_countdown(&mut self, minutes: u32, seconds: u32) -> Result<()> {
        self.countdown.config_mut().increase(minutes, seconds);
        self.persist()
    }

    pub fn decrease_countdown(&mut self, minutes: u32, seconds: u32) -> Result<()> {
        self.countdown.config_mut().decrease(minutes, seconds);
        self.persist()
    }

    // ── Timers ───────────────────────────────────────────────────────

    /// Start or stop the stopwatch. Returns whether it is now running.
    pub fn toggle_stopwatch(&mut self) -> bool {
        if self.stopwatch.is_running() {
            self.stop_stopwatch();
        } else {
            self.start_stopwatch();
        }
        self.stopwatch.is_running()
    }

    /// Start or pause the countdown. Returns whether it is now running.
    pub fn toggle_countdown(&mut self) -> bool {
        if self.countdown.is_running() {
            self.pause_countdown();
        } else {
            self.countdown.start();
            self.register(TimerKind::Countdown);
        }
        self.countdown.is_running()
    }

    /// Toggle whichever timer the current mode uses
    pub fn toggle_active_timer(&mut self) -> bool {
        match self.timer_mode {
            TimerMode::Stopwatch => self.toggle_stopwatch(),
            TimerMode::Counter => self.toggle_countdown(),
        }
    }

    /// Stop the countdown and return it to zero elapsed
    pub fn reset_countdown(&mut self) {
        self.unregister(TimerKind::Countdown);
        self.countdown.reset();
    }

    /// Start the rest timer from the full rest duration, restarting if running
    pub fn start_rest_timer(&mut self) -> Vec<Event> {
        let duration_secs = self.settings.rest_duration_secs;
        self.rest.start(duration_secs);
        self.register(TimerKind::Rest);
        tracing::debug!("Rest timer started for {}s", duration_secs);
        vec![Event::RestStarted { duration_secs }]
    }

    pub fn stop_rest_timer(&mut self) {
        self.unregister(TimerKind::Rest);
        self.rest.stop();
    }

    /// Deliver every tick the clock has due
    pub fn pump(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for tick in self.clock.poll() {
            events.extend(self.on_tick(tick));
        }
        events
    }

    /// Apply one tick, discarding it if its registration is no longer live
    pub fn on_tick(&mut self, tick: Tick) -> Vec<Event> {
        if self.handles.get(tick.timer) != Some(tick.handle) {
            tracing::debug!(
                "Discarding stale {:?} tick {}",
                tick.timer,
                tick.handle.id()
            );
            return Vec::new();
        }

        let mut events = Vec::new();
        match tick.timer {
            TimerKind::Stopwatch => self.stopwatch.tick(),
            TimerKind::Countdown => {
                if self.countdown.tick() {
                    self.unregister(TimerKind::Countdown);
                    tracing::info!("Countdown finished");
                    events.push(Event::CountdownFinished);
                    events.push(Event::Haptic {
                        cue: HapticCue::Heavy,
                    });
                    self.push_sound(&mut events, SoundCue::Complete);
                    if self.settings.auto_rest_timer {
                        events.extend(self.start_rest_timer());
                    }
                }
            }
            TimerKind::Rest => {
                if self.rest.tick() {
                    self.unregister(TimerKind::Rest);
                    tracing::debug!("Rest finished");
                    events.push(Event::RestFinished);
                    self.push_sound(&mut events, SoundCue::Beep);
                    events.push(Event::Haptic {
                        cue: HapticCue::Medium,
                    });
                }
            }
        }
        events
    }

    fn start_stopwatch(&mut self) {
        if self.stopwatch.start() {
            self.register(TimerKind::Stopwatch);
        }
    }

    fn stop_stopwatch(&mut self) {
        self.unregister(TimerKind::Stopwatch);
        self.stopwatch.stop();
    }

    fn pause_countdown(&mut self) {
        self.unregister(TimerKind::Countdown);
        self.countdown.pause();
    }

    fn stop_all_timers(&mut self) {
        self.stop_stopwatch();
        self.pause_countdown();
        self.stop_rest_timer();
    }

    /// Replace any live registration for `timer` with a fresh one
    fn register(&mut self, timer: TimerKind) {
        self.unregister(timer);
        let handle = self.clock.register_tick(TICK_INTERVAL_MS, timer);
        *self.handles.slot(timer) = Some(handle);
    }

    fn unregister(&mut self, timer: TimerKind) {
        if let Some(handle) = self.handles.slot(timer).take() {
            self.clock.cancel(handle);
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn push_sound(&self, events: &mut Vec<Event>, cue: SoundCue) {
        if self.settings.sound_enabled {
            events.push(Event::Sound { cue });
        }
    }

    fn refresh_achievements(&mut self, events: &mut Vec<Event>) {
        let delta = achievements::detect_unlock(self.unlocked_count, &self.stats);
        self.unlocked_count = delta.unlocked_count;
        if !delta.newly_unlocked {
            return;
        }

        self.has_new_achievement = true;
        tracing::info!("Achievement unlocked: {:?}", delta.headline);
        events.push(Event::Haptic {
            cue: HapticCue::Success,
        });
        self.push_sound(events, SoundCue::Achievement);
        events.push(Event::AchievementUnlocked {
            title: delta.headline.map(str::to_string),
        });
    }

    fn persist(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        self.store.save(&snapshot)
    }
}
