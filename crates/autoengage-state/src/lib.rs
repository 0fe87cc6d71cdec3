//! # AutoEngage State
//!
//! Durable automation state for the engagement engine.
//!
//! ## Features
//!
//! - Single `AutomationState` aggregate persisted after every change
//! - Bounded activity log with oldest-first eviction
//! - Durable alarms that survive process restarts
//! - Memory and file-backed stores

pub mod alarm;
pub mod error;
pub mod log;
pub mod state;
pub mod store;

pub use alarm::{AlarmKind, PendingAlarm};
pub use error::StateError;
pub use log::{ActivityLog, LOG_CAPACITY};
pub use state::AutomationState;
pub use store::{FileStateStore, MemoryStateStore, StateStore};
