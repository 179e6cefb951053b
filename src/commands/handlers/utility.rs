//! Utility command handlers
//!
//! Handles: start, cancel
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: /start onboarding and /cancel for conversation flows
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::{reply, SlashCommandHandler};

pub const WELCOME_TEXT: &str = "Hello 👋 Healthally here!\n\n\
Commands:\n\
/add_medicine - log your medicine (name → dose → times) to get scheduled reminders\n\
/log_exercise - log an exercise routine (name → minutes) and track your progress\n\
/delete_medicine - cancel future reminders for a medicine\n\
/delete_exercise - delete a logged exercise entry\n\
/progress - weekly summary of medicine intake and exercise routine\n\
/cancel - stop whatever I'm currently asking you";

pub const CANCELLED_TEXT: &str = "Cancelled.";

/// Handler for utility commands: start, cancel
pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["start", "cancel"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "start" => reply(serenity_ctx, command, WELCOME_TEXT).await,
            "cancel" => {
                let user_id = command.user.id.0;
                if ctx.conversations.cancel(user_id) {
                    info!("User {user_id} cancelled their active flow");
                }
                reply(serenity_ctx, command, CANCELLED_TEXT).await
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utility_handler_commands() {
        let names = UtilityHandler.command_names();
        assert_eq!(names, &["start", "cancel"]);
    }

    #[test]
    fn test_welcome_lists_every_command() {
        for command in [
            "/add_medicine",
            "/log_exercise",
            "/delete_medicine",
            "/delete_exercise",
            "/progress",
            "/cancel",
        ] {
            assert!(WELCOME_TEXT.contains(command), "welcome text misses {command}");
        }
    }
}
