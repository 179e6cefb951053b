//! Button press handling
//!
//! Decodes an inbound action payload and turns it into an adherence log entry
//! (medicine) or a motivational reply (exercise). Never fails outward: every
//! problem becomes [`Acknowledgement::Error`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use super::actions::{ActionPayload, DoseStatus, ExerciseStatus};
use crate::database::Database;

pub const ERROR_ACK_TEXT: &str = "Error processing button. Try again.";
pub const EXERCISE_DONE_TEXT: &str = "Great! keep going on the fitness streak 🎯💪";
pub const EXERCISE_SKIP_TEXT: &str = "No worries! Try a short session later, even 10 minutes helps. \
Remember, any amount of physical activity is better than none 💪";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    DoseLogged { log_id: i64, status: DoseStatus },
    Exercise(ExerciseStatus),
    Error,
}

impl Acknowledgement {
    pub fn text(&self) -> String {
        match self {
            Acknowledgement::DoseLogged { status, .. } => {
                format!("Logged: {} ✅", status.as_str().to_uppercase())
            }
            Acknowledgement::Exercise(ExerciseStatus::Done) => EXERCISE_DONE_TEXT.to_string(),
            Acknowledgement::Exercise(ExerciseStatus::Skip) => EXERCISE_SKIP_TEXT.to_string(),
            Acknowledgement::Error => ERROR_ACK_TEXT.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ResponseCorrelator {
    database: Database,
}

impl ResponseCorrelator {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Handle a raw button payload pressed by `responder`.
    pub async fn handle(&self, raw: &str, responder: u64, now: DateTime<Utc>) -> Acknowledgement {
        let payload = match raw.parse::<ActionPayload>() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed action '{raw}' from {responder}: {e}");
                return Acknowledgement::Error;
            }
        };

        match payload {
            ActionPayload::Medicine {
                medicine_id,
                correlation_token,
                status,
            } => match self
                .database
                .log_med_status(medicine_id, responder, &correlation_token, status, now)
                .await
            {
                Ok(log_id) => {
                    info!(
                        "Logged {} for medicine {medicine_id} by {responder} ({correlation_token})",
                        status.as_str()
                    );
                    Acknowledgement::DoseLogged { log_id, status }
                }
                Err(e) => {
                    error!("Failed to log dose for medicine {medicine_id}: {e}");
                    Acknowledgement::Error
                }
            },
            // Acknowledgement only; exercise check-ins are not persisted.
            ActionPayload::Exercise {
                user_id, status, ..
            } => {
                info!("Exercise check-in {} from {user_id}", status.as_str());
                Acknowledgement::Exercise(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_medicine_action_writes_one_log() {
        let db = Database::new(":memory:").await.unwrap();
        let correlator = ResponseCorrelator::new(db.clone());

        let ack = correlator
            .handle("MED|3|202401020900|taken", 42, Utc::now())
            .await;

        assert!(matches!(
            ack,
            Acknowledgement::DoseLogged {
                status: DoseStatus::Taken,
                ..
            }
        ));
        assert_eq!(ack.text(), "Logged: TAKEN ✅");

        let logs = db.med_logs_for(3).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].user_id, 42);
        assert_eq!(logs[0].status, "taken");
        assert_eq!(logs[0].correlation_token, "202401020900");
    }

    #[tokio::test]
    async fn test_missed_ack_text() {
        let db = Database::new(":memory:").await.unwrap();
        let correlator = ResponseCorrelator::new(db);
        let ack = correlator.handle("MED|3|tok|missed", 42, Utc::now()).await;
        assert_eq!(ack.text(), "Logged: MISSED ✅");
    }

    #[tokio::test]
    async fn test_exercise_action_is_not_persisted() {
        let db = Database::new(":memory:").await.unwrap();
        let correlator = ResponseCorrelator::new(db.clone());

        let done = correlator.handle("EX|42|tok|done", 42, Utc::now()).await;
        let skip = correlator.handle("EX|42|tok|skip", 42, Utc::now()).await;

        assert_eq!(done, Acknowledgement::Exercise(ExerciseStatus::Done));
        assert_eq!(done.text(), EXERCISE_DONE_TEXT);
        assert_eq!(skip.text(), EXERCISE_SKIP_TEXT);
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(db.taken_count_since(42, epoch).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payloads_get_error_ack() {
        let db = Database::new(":memory:").await.unwrap();
        let correlator = ResponseCorrelator::new(db);

        for raw in ["", "MED|1|tok", "XX|1|tok|taken", "MED|x|tok|taken", "MED|1|tok|maybe"] {
            let ack = correlator.handle(raw, 1, Utc::now()).await;
            assert_eq!(ack, Acknowledgement::Error, "payload {raw:?}");
            assert_eq!(ack.text(), ERROR_ACK_TEXT);
        }
    }
}
