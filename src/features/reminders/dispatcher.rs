//! Reminder delivery
//!
//! Builds reminder text and Taken/Missed (or Done/Skip) buttons with an
//! embedded correlation token and pushes them through the transport.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Exercise broadcast sends run as isolated tasks with a per-recipient report
//! - 1.0.0: Medicine reminders with correlation tokens

use anyhow::Result;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::task::JoinSet;

use super::actions::{ActionPayload, DoseStatus, ExerciseStatus};
use super::transport::{ActionButton, ActionStyle, MessageTransport};
use crate::core::DeliveryError;
use crate::database::Database;

pub const EXERCISE_CHECK_IN_TEXT: &str = "🏃‍♀️ Did you complete your exercise today? Reply with the buttons.\n\n\
If you already exercised, press ✅ Done. If not, press ❌ Skip. It's time to stretch some muscles!";

/// Minute-resolution, lexicographically sortable: `YYYYMMDDHHMM`.
pub fn correlation_token(at: DateTime<Tz>) -> String {
    at.format("%Y%m%d%H%M").to_string()
}

fn truncate_to_minute(at: DateTime<Tz>) -> DateTime<Tz> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

pub fn medicine_reminder_text(name: &str, dose: &str) -> String {
    format!("💊 Time to take **{name}** ({dose}) 💊")
}

pub fn medicine_actions(medicine_id: i64, correlation_token: &str) -> Vec<ActionButton> {
    let payload = |status| ActionPayload::Medicine {
        medicine_id,
        correlation_token: correlation_token.to_string(),
        status,
    };
    vec![
        ActionButton::new(
            "Taken ✅",
            payload(DoseStatus::Taken).to_string(),
            ActionStyle::Positive,
        ),
        ActionButton::new(
            "Missed ❌",
            payload(DoseStatus::Missed).to_string(),
            ActionStyle::Negative,
        ),
    ]
}

pub fn exercise_actions(user_id: u64, correlation_token: &str) -> Vec<ActionButton> {
    let payload = |status| ActionPayload::Exercise {
        user_id,
        correlation_token: correlation_token.to_string(),
        status,
    };
    vec![
        ActionButton::new(
            "Done ✅",
            payload(ExerciseStatus::Done).to_string(),
            ActionStyle::Positive,
        ),
        ActionButton::new(
            "Skip ❌",
            payload(ExerciseStatus::Skip).to_string(),
            ActionStyle::Negative,
        ),
    ]
}

/// Context carried from a fired trigger into the delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEvent {
    pub medicine_id: i64,
    pub user_id: u64,
    pub fired_at: DateTime<Tz>,
    pub correlation_token: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub delivered: Vec<u64>,
    pub failed: Vec<DeliveryError>,
}

pub struct ReminderDispatcher {
    transport: Arc<dyn MessageTransport>,
    database: Database,
    timezone: Tz,
}

impl ReminderDispatcher {
    pub fn new(transport: Arc<dyn MessageTransport>, database: Database, timezone: Tz) -> Self {
        Self {
            transport,
            database,
            timezone,
        }
    }

    pub async fn send_medicine_reminder(
        &self,
        medicine_id: i64,
        user_id: u64,
        name: &str,
        dose: &str,
        now: DateTime<Utc>,
    ) -> Result<ReminderEvent, DeliveryError> {
        let fired_at = truncate_to_minute(now.with_timezone(&self.timezone));
        let token = correlation_token(fired_at);

        self.transport
            .send_message(
                user_id,
                &medicine_reminder_text(name, dose),
                &medicine_actions(medicine_id, &token),
            )
            .await?;

        debug!("Sent reminder for medicine {medicine_id} to {user_id} ({token})");
        Ok(ReminderEvent {
            medicine_id,
            user_id,
            fired_at,
            correlation_token: token,
        })
    }

    /// Send the daily check-in to every registered user.
    ///
    /// Each send runs in its own task; an unreachable or slow recipient never
    /// holds up or aborts the others.
    pub async fn broadcast_exercise_check_in(&self, now: DateTime<Utc>) -> Result<BatchReport> {
        let token = correlation_token(truncate_to_minute(now.with_timezone(&self.timezone)));
        let users = self.database.list_users().await?;

        let mut sends = JoinSet::new();
        for user_id in users {
            let transport = Arc::clone(&self.transport);
            let actions = exercise_actions(user_id, &token);
            sends.spawn(async move {
                let result = transport
                    .send_message(user_id, EXERCISE_CHECK_IN_TEXT, &actions)
                    .await;
                (user_id, result)
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((user_id, Ok(()))) => report.delivered.push(user_id),
                Ok((_, Err(e))) => {
                    warn!("Exercise check-in not delivered: {e}");
                    report.failed.push(e);
                }
                Err(e) => error!("Exercise check-in task failed: {e}"),
            }
        }
        report.delivered.sort_unstable();

        info!(
            "Exercise check-in {token}: {} delivered, {} failed",
            report.delivered.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
