//! # Features
//!
//! Self-contained feature modules. Each declares its version and whether it
//! can be toggled in its own module header.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Medicine reminders, adherence summaries, conversational input flows

pub mod adherence;
pub mod conversation;
pub mod reminders;

pub use adherence::{AdherenceAggregator, WeeklySummary};
pub use conversation::{ConversationManager, Flow, FlowOutput, FlowReply};
pub use reminders::{
    MessageTransport, ReminderDispatcher, ReminderScheduler, ResponseCorrelator, SerenityTransport,
    TimeToken, TriggerRegistry,
};
