use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handler::reply;
use crate::commands::registry::CommandRegistry;
use crate::features::conversation::FlowReply;

pub const FLOW_FAILURE_TEXT: &str = "⚠️ Something went wrong saving that. Please try again.";

/// Entry point for slash commands and the DM messages that drive flows.
#[derive(Clone)]
pub struct CommandHandler {
    registry: CommandRegistry,
    context: Arc<CommandContext>,
}

impl CommandHandler {
    pub fn new(context: CommandContext) -> Self {
        CommandHandler {
            registry: CommandRegistry::with_all_handlers(),
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let user_id = command.user.id.0;
        let guild_id = command
            .guild_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "DM".to_string());

        info!(
            "[{}] 📥 Slash command received | Command: {} | User: {} | Guild: {}",
            request_id, command.data.name, user_id, guild_id
        );

        // Any command registers the caller so they get the daily check-in.
        self.context
            .database
            .add_user(user_id, &command.user.name)
            .await?;

        match self.registry.get(&command.data.name) {
            Some(handler) => {
                debug!("[{}] 🎯 Dispatching /{}", request_id, command.data.name);
                handler
                    .handle(Arc::clone(&self.context), ctx, command)
                    .await?;
                info!("[{request_id}] ✅ Slash command completed");
            }
            None => {
                warn!("[{}] ❓ Unknown slash command: {}", request_id, command.data.name);
                reply(ctx, command, "Unknown command.").await?;
            }
        }
        Ok(())
    }

    /// Direct messages feed the sender's active flow; anything else is ignored.
    pub async fn handle_message(&self, ctx: &Context, msg: &Message) -> Result<()> {
        if msg.author.bot || msg.guild_id.is_some() {
            return Ok(());
        }

        let request_id = Uuid::new_v4();
        let user_id = msg.author.id.0;
        debug!(
            "[{}] 📥 DM from {} | Content: '{}'",
            request_id,
            user_id,
            msg.content.chars().take(100).collect::<String>()
        );

        let response = match self.respond_to_text(user_id, &msg.content, Utc::now()).await {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(()),
            Err(e) => {
                error!("[{request_id}] ❌ Flow completion failed for {user_id}: {e:#}");
                FLOW_FAILURE_TEXT.to_string()
            }
        };

        msg.channel_id.say(&ctx.http, response).await?;
        Ok(())
    }

    /// Feed `text` into the user's flow and return what to say back, if anything.
    pub async fn respond_to_text(
        &self,
        user_id: u64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        match self.context.conversations.feed(user_id, text) {
            None => Ok(None),
            Some(FlowReply::Prompt(prompt)) => Ok(Some(prompt)),
            Some(FlowReply::Complete(output)) => self
                .context
                .complete_flow(user_id, output, now)
                .await
                .map(Some),
        }
    }
}
