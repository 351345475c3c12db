#![forbid(unsafe_code)]

//! Core domain model and workout state engine for the push-up tracker.
//!
//! This crate provides:
//! - Domain types (session state, lifetime stats, history, settings)
//! - Stopwatch, countdown and rest timer state machines
//! - Clock/scheduler abstraction with a virtual clock for tests
//! - Streak and daily-reset rules
//! - The fixed achievement catalog
//! - The engine tying them together and emitting collaborator events
//! - Persistence (atomic JSON snapshot) and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod timer;
pub mod events;
pub mod streak;
pub mod achievements;
pub mod store;
pub mod export;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, ManualClock, SystemClock, Tick, TickHandle};
pub use events::{Event, HapticCue, SoundCue};
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use export::export_history_csv;
pub use engine::WorkoutEngine;
