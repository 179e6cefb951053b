//! Slash command handler trait
//!
//! - **Version**: 1.1.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 1.1.0: Shared interaction reply helper
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core::truncate_for_message;

/// Trait for slash command handlers
///
/// A handler owns one or more command names and is looked up through the
/// `CommandRegistry` by the name Discord sends.
///
/// # Example
///
/// ```ignore
/// pub struct ProgressHandler;
///
/// #[async_trait]
/// impl SlashCommandHandler for ProgressHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["progress"]
///     }
///
///     async fn handle(
///         &self,
///         ctx: Arc<CommandContext>,
///         serenity_ctx: &Context,
///         command: &ApplicationCommandInteraction,
///     ) -> Result<()> {
///         let summary = ctx.aggregator.weekly_summary(command.user.id.0, Utc::now()).await?;
///         reply(serenity_ctx, command, &summary.render()).await
///     }
/// }
/// ```
#[async_trait]
pub trait SlashCommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    /// Handle the slash command
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared command context with the store, scheduler and flows
    /// * `serenity_ctx` - Serenity context for Discord API calls
    /// * `command` - The slash command interaction to handle
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()>;
}

/// Answer an interaction with a plain message.
pub async fn reply(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    text: &str,
) -> Result<()> {
    let content = truncate_for_message(text);
    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(&content))
        })
        .await?;
    Ok(())
}
