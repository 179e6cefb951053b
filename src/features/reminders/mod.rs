//! # Reminders Feature
//!
//! Daily medicine reminders and the exercise check-in: time parsing, trigger
//! registry, delivery, and button-press correlation.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Recurring per-medicine triggers with correlated Taken/Missed buttons
//! - 1.0.0: Initial scheduler

pub mod actions;
pub mod correlator;
pub mod dispatcher;
pub mod registry;
pub mod scheduler;
pub mod time_tokens;
pub mod transport;

pub use actions::{ActionPayload, DoseStatus, ExerciseStatus};
pub use correlator::{Acknowledgement, ResponseCorrelator};
pub use dispatcher::{BatchReport, ReminderDispatcher, ReminderEvent};
pub use registry::{ReconcileReport, Trigger, TriggerJob, TriggerRegistry};
pub use scheduler::ReminderScheduler;
pub use time_tokens::{join_tokens, parse_times, TimeToken};
pub use transport::{ActionButton, ActionStyle, MessageTransport, SerenityTransport};
