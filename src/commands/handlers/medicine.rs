//! Medicine command handlers
//!
//! Handles: add_medicine, delete_medicine
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use super::flow_prompt;
use crate::commands::context::{CommandContext, NO_MEDICINES_TEXT};
use crate::commands::handler::{reply, SlashCommandHandler};
use crate::features::conversation::Flow;

pub struct MedicineHandler;

#[async_trait]
impl SlashCommandHandler for MedicineHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["add_medicine", "delete_medicine"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.0;
        match command.data.name.as_str() {
            "add_medicine" => {
                let (flow, prompt) = Flow::add_medicine();
                ctx.conversations.begin(user_id, flow);
                reply(serenity_ctx, command, &flow_prompt(command, prompt)).await
            }
            "delete_medicine" => match ctx.medicine_listing(user_id).await? {
                Some(listing) => {
                    ctx.conversations.begin(user_id, Flow::DeleteMedicine);
                    reply(serenity_ctx, command, &flow_prompt(command, &listing)).await
                }
                None => reply(serenity_ctx, command, NO_MEDICINES_TEXT).await,
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medicine_handler_commands() {
        let names = MedicineHandler.command_names();
        assert!(names.contains(&"add_medicine"));
        assert!(names.contains(&"delete_medicine"));
        assert_eq!(names.len(), 2);
    }
}
