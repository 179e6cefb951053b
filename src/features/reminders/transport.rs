//! Outbound message transport
//!
//! The scheduling core only knows [`MessageTransport`]; the bot wires in
//! [`SerenityTransport`], which delivers direct messages with button rows.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use async_trait::async_trait;
use serenity::builder::CreateComponents;
use serenity::http::Http;
use serenity::model::application::component::ButtonStyle;
use serenity::model::id::UserId;
use std::sync::Arc;

use crate::core::{truncate_for_message, DeliveryError};

/// Discord allows at most 5 buttons per action row.
const BUTTONS_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStyle {
    Positive,
    Negative,
}

impl From<ActionStyle> for ButtonStyle {
    fn from(style: ActionStyle) -> Self {
        match style {
            ActionStyle::Positive => ButtonStyle::Success,
            ActionStyle::Negative => ButtonStyle::Danger,
        }
    }
}

/// An interactive reply control. `custom_id` is echoed back verbatim on press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub custom_id: String,
    pub style: ActionStyle,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, custom_id: impl Into<String>, style: ActionStyle) -> Self {
        Self {
            label: label.into(),
            custom_id: custom_id.into(),
            style,
        }
    }
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(
        &self,
        recipient_id: u64,
        text: &str,
        actions: &[ActionButton],
    ) -> Result<(), DeliveryError>;
}

/// Build Discord button rows for a set of actions.
pub fn create_action_components(actions: &[ActionButton]) -> CreateComponents {
    let mut components = CreateComponents::default();
    for chunk in actions.chunks(BUTTONS_PER_ROW) {
        components.create_action_row(|row| {
            for action in chunk {
                row.create_button(|btn| {
                    btn.custom_id(&action.custom_id)
                        .label(&action.label)
                        .style(action.style.into())
                });
            }
            row
        });
    }
    components
}

/// Direct-message transport over the Discord REST API.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageTransport for SerenityTransport {
    async fn send_message(
        &self,
        recipient_id: u64,
        text: &str,
        actions: &[ActionButton],
    ) -> Result<(), DeliveryError> {
        let fail = |e: serenity::Error| DeliveryError {
            recipient: recipient_id,
            reason: e.to_string(),
        };

        let dm = UserId(recipient_id)
            .create_dm_channel(&self.http)
            .await
            .map_err(fail)?;

        let content = truncate_for_message(text);
        dm.send_message(&self.http, |m| {
            m.content(&content);
            if !actions.is_empty() {
                m.set_components(create_action_components(actions));
            }
            m
        })
        .await
        .map_err(fail)?;

        Ok(())
    }
}
