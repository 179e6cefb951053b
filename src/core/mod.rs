//! # Core Module
//!
//! Core domain types, configuration, and error handling for the reminder bot.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add typed error taxonomy for parsing, scheduling, delivery and button actions
//! - 1.1.0: Add response module with Discord message length helpers
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::{DeliveryError, InvalidScheduleError, MalformedActionError, ParseError};
pub use response::{fit_lines_to_message, truncate_for_message, MESSAGE_LIMIT};
