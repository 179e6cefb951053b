//! # Conversation Feature
//!
//! Per-user multi-step flows driven by direct messages after a slash command
//! opens them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod flows;
pub mod quantity;

use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

pub use flows::{ExerciseStep, Flow, FlowOutput, MedicineStep, Transition};
pub use quantity::parse_minutes;

/// What to tell the user after feeding a message into their flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowReply {
    Prompt(String),
    Complete(FlowOutput),
}

/// Active flow per user. Starting a new flow replaces the old one.
#[derive(Clone, Default)]
pub struct ConversationManager {
    active: Arc<DashMap<u64, Flow>>,
}

impl ConversationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, user_id: u64, flow: Flow) {
        if self.active.insert(user_id, flow).is_some() {
            debug!("Replaced active flow for user {user_id}");
        }
    }

    pub fn cancel(&self, user_id: u64) -> bool {
        self.active.remove(&user_id).is_some()
    }

    pub fn is_active(&self, user_id: u64) -> bool {
        self.active.contains_key(&user_id)
    }

    /// Advance the user's flow with `input`. `None` when no flow is active.
    pub fn feed(&self, user_id: u64, input: &str) -> Option<FlowReply> {
        let (_, flow) = self.active.remove(&user_id)?;
        match flow.advance(input) {
            Transition::Next { flow, prompt } => {
                self.active.insert(user_id, flow);
                Some(FlowReply::Prompt(prompt))
            }
            Transition::Retry {
                flow,
                prompt,
                error,
            } => {
                debug!("User {user_id} input rejected: {error}");
                self.active.insert(user_id, flow);
                Some(FlowReply::Prompt(prompt))
            }
            Transition::Complete(output) => Some(FlowReply::Complete(output)),
        }
    }
}
