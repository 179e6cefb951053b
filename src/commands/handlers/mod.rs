//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 3.0.0: Medicine, exercise and progress handlers
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod exercise;
pub mod medicine;
pub mod progress;
pub mod utility;

use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use std::sync::Arc;

use super::handler::SlashCommandHandler;

/// Flows read plain messages from DMs only.
pub const DM_HINT: &str = "_Reply to me in a direct message._";

/// Prompt for the first step of a flow, with a DM hint outside DMs.
pub fn flow_prompt(command: &ApplicationCommandInteraction, prompt: &str) -> String {
    if command.guild_id.is_some() {
        format!("{prompt}\n\n{DM_HINT}")
    } else {
        prompt.to_string()
    }
}

/// Create all registered command handlers
pub fn create_all_handlers() -> Vec<Arc<dyn SlashCommandHandler>> {
    vec![
        Arc::new(utility::UtilityHandler),
        Arc::new(medicine::MedicineHandler),
        Arc::new(exercise::ExerciseHandler),
        Arc::new(progress::ProgressHandler),
    ]
}
