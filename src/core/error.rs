//! Typed errors for the scheduling core
//!
//! Application glue (handlers, database, startup) uses `anyhow`; these types
//! cover the failures callers branch on.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use thiserror::Error;

/// User-correctable input that could not be understood. Re-prompt, never advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("couldn't parse time token: {0}")]
    TimeToken(String),

    #[error("no reminder times given")]
    NoTimes,

    #[error("couldn't parse quantity: {0}")]
    Quantity(String),

    #[error("expected a numeric id, got: {0}")]
    Id(String),

    #[error("{0} can't be empty")]
    Empty(&'static str),
}

/// The trigger registry refused a token that is not canonical `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schedule token '{token}' for trigger {key}")]
pub struct InvalidScheduleError {
    pub key: String,
    pub token: String,
}

/// A single recipient could not be reached. Logged and swallowed by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delivery to {recipient} failed: {reason}")]
pub struct DeliveryError {
    pub recipient: u64,
    pub reason: String,
}

/// An inbound button payload that doesn't decode to a known action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedActionError {
    #[error("expected 4 fields, got {0}")]
    FieldCount(usize),

    #[error("unknown action kind: {0}")]
    UnknownKind(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown status '{status}' for {kind} action")]
    UnknownStatus { kind: &'static str, status: String },
}
