//! Time sources and the repeating-tick scheduler.
//!
//! The engine never sleeps or spawns threads. It asks a [`Clock`] to
//! register a repeating tick for a timer and receives a [`TickHandle`].
//! The composition root calls [`Clock::poll`] and feeds each returned
//! [`Tick`] back into the engine, which drops ticks whose handle is no
//! longer the live one for that timer.
//!
//! [`SystemClock`] follows wall time. [`ManualClock`] is a virtual clock
//! whose time only moves when told to, which keeps timer tests exact.

use crate::types::TimerKind;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::time::Instant;

/// Opaque identity of one tick registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One firing of a registered tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub handle: TickHandle,
    pub timer: TimerKind,
}

/// Wall time plus repeating-tick registration
pub trait Clock {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day an instant falls on, in the user's frame of reference
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }

    /// Calendar day of `now()`
    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    /// Register a repeating tick every `interval_ms` for `timer`
    fn register_tick(&mut self, interval_ms: u64, timer: TimerKind) -> TickHandle;

    /// Cancel a registration. Cancelling twice is a no-op.
    fn cancel(&mut self, handle: TickHandle);

    /// Drain ticks that have come due since the last poll, oldest first
    fn poll(&mut self) -> Vec<Tick>;
}

#[derive(Debug)]
struct Registration {
    handle: TickHandle,
    timer: TimerKind,
    interval_ms: u64,
    /// Virtual ms at which the next firing is due (ManualClock)
    next_due_ms: u64,
    /// Wall-clock origin and firings delivered so far (SystemClock)
    origin: Option<Instant>,
    delivered: u64,
}

// ============================================================================
// System Clock
// ============================================================================

/// Wall-clock implementation for the real application
#[derive(Debug, Default)]
pub struct SystemClock {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn register_tick(&mut self, interval_ms: u64, timer: TimerKind) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.registrations.push(Registration {
            handle,
            timer,
            interval_ms: interval_ms.max(1),
            next_due_ms: 0,
            origin: Some(Instant::now()),
            delivered: 0,
        });
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.registrations.retain(|r| r.handle != handle);
    }

    fn poll(&mut self) -> Vec<Tick> {
        let mut due = Vec::new();
        for reg in &mut self.registrations {
            let Some(origin) = reg.origin else { continue };
            let elapsed_ms = origin.elapsed().as_millis() as u64;
            let fired = elapsed_ms / reg.interval_ms;
            while reg.delivered < fired {
                reg.delivered += 1;
                due.push((reg.delivered * reg.interval_ms, reg.handle.0, Tick {
                    handle: reg.handle,
                    timer: reg.timer,
                }));
            }
        }
        due.sort_by_key(|(at, id, _)| (*at, *id));
        due.into_iter().map(|(_, _, tick)| tick).collect()
    }
}

// ============================================================================
// Manual Clock
// ============================================================================

/// Virtual clock for deterministic tests and simulations
///
/// Dates are computed in UTC so results do not depend on the host zone.
#[derive(Debug)]
pub struct ManualClock {
    start: DateTime<Utc>,
    elapsed_ms: u64,
    next_id: u64,
    registrations: Vec<Registration>,
    pending: Vec<(u64, u64, Tick)>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            elapsed_ms: 0,
            next_id: 0,
            registrations: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Move virtual time forward, queueing every tick that comes due
    pub fn advance(&mut self, by: Duration) {
        let step = by.num_milliseconds().max(0) as u64;
        let target = self.elapsed_ms + step;
        for reg in &mut self.registrations {
            while reg.next_due_ms <= target {
                self.pending.push((
                    reg.next_due_ms,
                    reg.handle.0,
                    Tick {
                        handle: reg.handle,
                        timer: reg.timer,
                    },
                ));
                reg.next_due_ms += reg.interval_ms;
            }
        }
        self.elapsed_ms = target;
    }

    /// Jump the wall time without firing ticks (e.g. app resumed next day)
    pub fn set_now(&mut self, at: DateTime<Utc>) {
        self.start = at - Duration::milliseconds(self.elapsed_ms as i64);
    }

    /// Number of live registrations
    pub fn active_registrations(&self) -> usize {
        self.registrations.len()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + Duration::milliseconds(self.elapsed_ms as i64)
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.date_naive()
    }

    fn register_tick(&mut self, interval_ms: u64, timer: TimerKind) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        let interval_ms = interval_ms.max(1);
        self.registrations.push(Registration {
            handle,
            timer,
            interval_ms,
            next_due_ms: self.elapsed_ms + interval_ms,
            origin: None,
            delivered: 0,
        });
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        // Ticks already queued stay queued; the engine discards them.
        self.registrations.retain(|r| r.handle != handle);
    }

    fn poll(&mut self) -> Vec<Tick> {
        let mut due = std::mem::take(&mut self.pending);
        due.sort_by_key(|(at, id, _)| (*at, *id));
        due.into_iter().map(|(_, _, tick)| tick).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> ManualClock {
        ManualClock::starting_at(Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap())
    }

    #[test]
    fn test_manual_clock_fires_once_per_interval() {
        let mut clock = clock();
        let handle = clock.register_tick(1000, TimerKind::Stopwatch);

        clock.advance(Duration::milliseconds(3500));
        let ticks = clock.poll();

        assert_eq!(ticks.len(), 3);
        assert!(ticks.iter().all(|t| t.handle == handle));
        assert!(clock.poll().is_empty());
    }

    #[test]
    fn test_cancel_stops_future_ticks() {
        let mut clock = clock();
        let handle = clock.register_tick(1000, TimerKind::Rest);
        clock.advance(Duration::seconds(1));
        clock.cancel(handle);
        clock.cancel(handle);
        clock.advance(Duration::seconds(5));

        assert_eq!(clock.poll().len(), 1);
        assert_eq!(clock.active_registrations(), 0);
    }

    #[test]
    fn test_ticks_interleave_by_due_time() {
        let mut clock = clock();
        clock.register_tick(1000, TimerKind::Stopwatch);
        clock.advance(Duration::milliseconds(500));
        clock.register_tick(1000, TimerKind::Rest);
        clock.advance(Duration::seconds(2));

        let kinds: Vec<_> = clock.poll().into_iter().map(|t| t.timer).collect();
        assert_eq!(
            kinds,
            vec![
                TimerKind::Stopwatch,
                TimerKind::Rest,
                TimerKind::Stopwatch,
                TimerKind::Rest
            ]
        );
    }

    #[test]
    fn test_now_and_today_follow_virtual_time() {
        let mut clock = clock();
        clock.advance(Duration::hours(20));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());

        clock.set_now(Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }
}
