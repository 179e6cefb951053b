//! Exercise command handlers
//!
//! Handles: log_exercise, delete_exercise
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use super::flow_prompt;
use crate::commands::context::{CommandContext, NO_EXERCISES_TEXT};
use crate::commands::handler::{reply, SlashCommandHandler};
use crate::features::conversation::Flow;

pub struct ExerciseHandler;

#[async_trait]
impl SlashCommandHandler for ExerciseHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["log_exercise", "delete_exercise"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.0;
        match command.data.name.as_str() {
            "log_exercise" => {
                let (flow, prompt) = Flow::log_exercise();
                ctx.conversations.begin(user_id, flow);
                reply(serenity_ctx, command, &flow_prompt(command, prompt)).await
            }
            "delete_exercise" => match ctx.exercise_listing(user_id).await? {
                Some(listing) => {
                    ctx.conversations.begin(user_id, Flow::DeleteExercise);
                    reply(serenity_ctx, command, &flow_prompt(command, &listing)).await
                }
                None => reply(serenity_ctx, command, NO_EXERCISES_TEXT).await,
            },
            _ => Ok(()),
        }
    }
}
