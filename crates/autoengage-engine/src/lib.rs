//! # AutoEngage Engine
//!
//! The automation engine driving a queue of post URLs through a single
//! browser tab: one URL in flight at a time, durable progress across
//! restarts, watchdog timeouts, and bounded exponential-backoff retries.
//!
//! ## Architecture
//!
//! A single actor task ([`AutomationEngine`]) consumes a closed
//! [`EngineEvent`] set over an mpsc channel. Every event runs through a
//! pure transition function (`transition`) that mutates the in-memory
//! [`AutomationState`](autoengage_state::AutomationState) snapshot and
//! returns [`Command`]s; the actor persists the snapshot, then executes
//! the commands (navigation, actuator dispatch, timers, notifications).
//!
//! ```text
//! EngineHandle ──events──▶ AutomationEngine ──▶ transition() ──▶ Commands
//!                              │                                    │
//!                              └── StateStore.save() ◀──────────────┘
//! ```
//!
//! Tab-load signals, actuator outcomes, and timer fires all re-enter the
//! loop as events, so control messages stay live while a URL is in flight.

pub mod backoff;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod timer;
pub mod transition;

pub use config::EngineConfig;
pub use engine::{AutomationEngine, EngineHandle};
pub use error::EngineError;
pub use event::{ControlRequest, EngineEvent, TimerClass, TimerEvent};
pub use transition::Command;
