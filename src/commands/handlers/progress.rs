//! Progress command handler
//!
//! Handles: progress
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::{reply, SlashCommandHandler};

pub struct ProgressHandler;

#[async_trait]
impl SlashCommandHandler for ProgressHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["progress"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.0;
        let summary = ctx.aggregator.weekly_summary(user_id, Utc::now()).await?;
        debug!(
            "Progress for {user_id}: {}/{} doses, {} exercise day(s)",
            summary.taken, summary.expected, summary.exercise.active_days
        );
        reply(serenity_ctx, command, &summary.render()).await
    }
}
