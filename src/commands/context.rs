//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Scheduler, conversation flows and adherence aggregator replace the chat services
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::info;

use crate::core::fit_lines_to_message;
use crate::database::Database;
use crate::features::adherence::{format_minutes, AdherenceAggregator};
use crate::features::conversation::{ConversationManager, FlowOutput};
use crate::features::reminders::{join_tokens, ReminderScheduler};

/// How many exercise entries `/delete_exercise` offers.
pub const EXERCISE_LISTING_LIMIT: usize = 20;

pub const NO_MEDICINES_TEXT: &str = "You have no active medicines.";
pub const NO_EXERCISES_TEXT: &str = "No exercise entries found.";

/// Shared context for all command handlers
///
/// Owns the services a command or a finished conversation flow touches:
/// the store, the reminder scheduler, active flows and the weekly aggregator.
#[derive(Clone)]
pub struct CommandContext {
    pub database: Database,
    pub scheduler: ReminderScheduler,
    pub conversations: ConversationManager,
    pub aggregator: AdherenceAggregator,
    pub timezone: Tz,
}

impl CommandContext {
    pub fn new(database: Database, scheduler: ReminderScheduler, timezone: Tz) -> Self {
        Self {
            aggregator: AdherenceAggregator::new(database.clone(), timezone),
            conversations: ConversationManager::new(),
            database,
            scheduler,
            timezone,
        }
    }

    /// Apply a completed flow and produce the confirmation text.
    pub async fn complete_flow(
        &self,
        user_id: u64,
        output: FlowOutput,
        now: DateTime<Utc>,
    ) -> Result<String> {
        match output {
            FlowOutput::Medicine(medicine) => {
                let stored = self.scheduler.create_medicine(user_id, &medicine, now).await?;
                Ok(format!(
                    "Saved medicine #{}: {} ({}) at {} daily ✅",
                    stored.id,
                    stored.name,
                    stored.dose,
                    join_tokens(&medicine.times)
                ))
            }
            FlowOutput::Exercise(exercise) => {
                let today = now.with_timezone(&self.timezone).date_naive();
                let total = self
                    .database
                    .add_exercise(user_id, &exercise, today, now)
                    .await?;
                info!(
                    "User {user_id} logged {} mins of {} ({} today)",
                    exercise.minutes, exercise.name, total
                );
                Ok(format!(
                    "✅ Logged {} mins for {} today. (You can log as many times for the same exercise or different exercise as you wish)",
                    format_minutes(exercise.minutes),
                    exercise.name
                ))
            }
            FlowOutput::DeleteMedicine(id) => {
                if self.scheduler.delete_medicine(user_id, id).await? {
                    Ok(format!("Cancelled future reminders for medicine #{id} ✅"))
                } else {
                    Ok(format!("❌ Medicine #{id} not found or doesn't belong to you."))
                }
            }
            FlowOutput::DeleteExercise(id) => {
                if self.database.delete_exercise(id, user_id).await? {
                    Ok("✅ Deleted exercise entry.".to_string())
                } else {
                    Ok(format!("❌ Exercise entry #{id} not found or doesn't belong to you."))
                }
            }
        }
    }

    /// The pick-an-id prompt for `/delete_medicine`, or `None` if there is nothing to delete.
    pub async fn medicine_listing(&self, user_id: u64) -> Result<Option<String>> {
        let medicines = self.database.list_medicines(user_id).await?;
        if medicines.is_empty() {
            return Ok(None);
        }
        let lines: Vec<String> = medicines
            .iter()
            .map(|m| {
                format!(
                    "{}) {} ({}) - times: {}",
                    m.id,
                    m.name,
                    m.dose,
                    m.times.join(", ")
                )
            })
            .collect();
        Ok(Some(fit_lines_to_message(
            "Reply with the medicine ID to cancel future reminders:\n",
            &lines,
        )))
    }

    pub async fn exercise_listing(&self, user_id: u64) -> Result<Option<String>> {
        let entries = self
            .database
            .list_recent_exercises(user_id, EXERCISE_LISTING_LIMIT)
            .await?;
        if entries.is_empty() {
            return Ok(None);
        }
        let lines: Vec<String> = entries
            .iter()
            .map(|e| {
                format!(
                    "{}) {} - {} mins {}",
                    e.id,
                    e.date,
                    format_minutes(e.minutes),
                    e.name
                )
            })
            .collect();
        Ok(Some(fit_lines_to_message(
            "Reply with the entry ID to delete:\n",
            &lines,
        )))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::context;
    use super::*;
    use crate::database::{NewExercise, NewMedicine};
    use crate::features::reminders::TimeToken;
    use chrono::TimeZone;

    #[test]
    fn test_command_context_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }

    #[tokio::test]
    async fn test_complete_medicine_flow_registers_triggers() {
        let ctx = context().await;
        let reply = ctx
            .complete_flow(
                1,
                FlowOutput::Medicine(NewMedicine {
                    name: "Paracetamol".to_string(),
                    dose: "500mg".to_string(),
                    times: vec![TimeToken::new(9, 0).unwrap(), TimeToken::new(21, 0).unwrap()],
                }),
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(reply.starts_with("Saved medicine #"));
        assert!(reply.contains("Paracetamol (500mg) at 09:00, 21:00 daily"));
        assert_eq!(ctx.scheduler.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_medicine_flow() {
        let ctx = context().await;
        let stored = ctx
            .scheduler
            .create_medicine(
                1,
                &NewMedicine {
                    name: "A".to_string(),
                    dose: "1".to_string(),
                    times: vec![TimeToken::new(8, 0).unwrap()],
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let listing = ctx.medicine_listing(1).await.unwrap().unwrap();
        assert!(listing.contains(&format!("{}) A (1) - times: 08:00", stored.id)));
        assert!(ctx.medicine_listing(2).await.unwrap().is_none());

        let denied = ctx
            .complete_flow(2, FlowOutput::DeleteMedicine(stored.id), Utc::now())
            .await
            .unwrap();
        assert!(denied.contains("not found"));
        assert_eq!(ctx.scheduler.registry().len(), 1);

        let done = ctx
            .complete_flow(1, FlowOutput::DeleteMedicine(stored.id), Utc::now())
            .await
            .unwrap();
        assert_eq!(
            done,
            format!("Cancelled future reminders for medicine #{} ✅", stored.id)
        );
        assert!(ctx.scheduler.registry().is_empty());
    }

    #[tokio::test]
    async fn test_exercise_flow_uses_local_date() {
        let ctx = context().await;
        // 20:00 UTC on the 9th is the 10th in IST.
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        let reply = ctx
            .complete_flow(
                1,
                FlowOutput::Exercise(NewExercise {
                    name: "cycling".to_string(),
                    minutes: 20.0,
                }),
                now,
            )
            .await
            .unwrap();
        assert!(reply.starts_with("✅ Logged 20 mins for cycling today."));

        let entries = ctx.database.list_recent_exercises(1, 10).await.unwrap();
        assert_eq!(entries[0].date.to_string(), "2024-03-10");

        let listing = ctx.exercise_listing(1).await.unwrap().unwrap();
        assert!(listing.contains("2024-03-10 - 20 mins cycling"));

        let deleted = ctx
            .complete_flow(1, FlowOutput::DeleteExercise(entries[0].id), now)
            .await
            .unwrap();
        assert_eq!(deleted, "✅ Deleted exercise entry.");
        assert!(ctx.exercise_listing(1).await.unwrap().is_none());
    }
}
