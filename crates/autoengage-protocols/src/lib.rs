//! # AutoEngage Protocols
//!
//! Data contracts and collaborator traits for the autoengage automation
//! engine. Contains only plain data and interface definitions - no machinery.
//!
//! ## Core Traits
//!
//! - [`PageActuator`] - performs like/comment actions on the loaded page
//! - [`TabController`] - owns the single browser tab used by a run
//! - [`Notifier`] - surfaces progress and errors to the UI/indicator layer

pub mod actuator;
pub mod codes;
pub mod control;
pub mod gating;
pub mod notify;
pub mod status;
pub mod tab;

// Re-export core types
pub use actuator::{ActionRequest, ActuatorError, ActuatorOutcome, PageActuator};
pub use codes::{ActionError, ErrorCode};
pub use control::{ExportFormat, ExportPayload, RunSettings, SettingsError, StartRequest};
pub use gating::{ActionPlan, PageObservation, SkipReason};
pub use notify::{EngineNotification, Notifier};
pub use status::{LogEntry, LogKind, RunPhase, Statistics, Summary, UrlPhase, UrlStatus};
pub use tab::{TabController, TabError, TabId};
