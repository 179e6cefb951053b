use anyhow::Result;
use chrono::Utc;
use log::info;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;

use crate::features::reminders::correlator::{Acknowledgement, ResponseCorrelator};

/// Handler for reminder button presses
pub struct MessageComponentHandler {
    correlator: ResponseCorrelator,
}

impl MessageComponentHandler {
    pub fn new(correlator: ResponseCorrelator) -> Self {
        Self { correlator }
    }

    /// Record the press and replace the reminder with its acknowledgement.
    ///
    /// Buttons are cleared on success so a dose can't be logged twice from the
    /// same message. On error they stay, letting the user try again.
    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        let custom_id = &interaction.data.custom_id;
        let user_id = interaction.user.id.0;

        info!("Processing component interaction: {custom_id} from user: {user_id}");

        let ack = self.correlator.handle(custom_id, user_id, Utc::now()).await;
        let text = ack.text();
        let clear_buttons = ack != Acknowledgement::Error;

        interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::UpdateMessage)
                    .interaction_response_data(|message| {
                        message.content(text);
                        if clear_buttons {
                            message.components(|c| c);
                        }
                        message
                    })
            })
            .await?;

        Ok(())
    }
}
