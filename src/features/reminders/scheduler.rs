//! Reminder scheduler
//!
//! Owns the trigger registry and dispatcher, keeps triggers in step with
//! medicine create/delete, and runs the tick loop that fires due triggers.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Daily recurring medicine triggers, startup reconciliation, exercise broadcast
//! - 1.0.0: One-shot reminder polling

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use super::dispatcher::ReminderDispatcher;
use super::registry::{ReconcileReport, Trigger, TriggerJob, TriggerRegistry};
use super::time_tokens::TimeToken;
use super::transport::MessageTransport;
use crate::core::{Config, ParseError};
use crate::database::{Database, Medicine, NewMedicine};

#[derive(Clone)]
pub struct ReminderScheduler {
    registry: Arc<TriggerRegistry>,
    dispatcher: Arc<ReminderDispatcher>,
    database: Database,
    /// Serializes create/delete so a delete can't interleave with a register.
    lifecycle: Arc<Mutex<()>>,
    tick: Duration,
    exercise_at: TimeToken,
}

impl ReminderScheduler {
    pub fn new(transport: Arc<dyn MessageTransport>, database: Database, config: &Config) -> Self {
        let registry = Arc::new(TriggerRegistry::new(config.timezone));
        let dispatcher = Arc::new(ReminderDispatcher::new(
            transport,
            database.clone(),
            config.timezone,
        ));
        Self {
            registry,
            dispatcher,
            database,
            lifecycle: Arc::new(Mutex::new(())),
            tick: Duration::from_secs(config.scheduler_tick_seconds),
            exercise_at: config.exercise_reminder_at,
        }
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    /// Reload medicine triggers from the store and install the daily exercise
    /// check-in. The caller logs failures and keeps starting.
    pub async fn start_up(&self, now: DateTime<Utc>) -> Result<ReconcileReport> {
        let _guard = self.lifecycle.lock().await;
        self.registry.register_daily_exercise(self.exercise_at, now)?;
        info!("Daily exercise check-in scheduled at {}", self.exercise_at);
        self.registry.reconcile_all(&self.database, now).await
    }

    /// Store a medicine and register one trigger per time token.
    pub async fn create_medicine(
        &self,
        user_id: u64,
        medicine: &NewMedicine,
        now: DateTime<Utc>,
    ) -> Result<Medicine> {
        if medicine.times.is_empty() {
            return Err(ParseError::NoTimes.into());
        }

        let _guard = self.lifecycle.lock().await;
        let id = self.database.add_medicine(user_id, medicine, now).await?;
        let Some(stored) = self.database.get_medicine(id).await? else {
            bail!("Medicine {id} vanished right after insert");
        };
        let count = self.registry.register_medicine(&stored, now)?;

        info!(
            "Medicine {id} ({}) for user {user_id}: {count} trigger(s)",
            stored.name
        );
        Ok(stored)
    }

    /// Remove a user's medicine and every trigger derived from it.
    ///
    /// Returns `false` without touching anything when the medicine doesn't
    /// exist or belongs to someone else.
    pub async fn delete_medicine(&self, user_id: u64, medicine_id: i64) -> Result<bool> {
        let _guard = self.lifecycle.lock().await;
        match self.database.get_medicine(medicine_id).await? {
            Some(medicine) if medicine.user_id == user_id => {}
            _ => {
                debug!("User {user_id} tried to delete medicine {medicine_id} they don't own");
                return Ok(false);
            }
        }

        // Store first: if the delete fails the triggers must keep matching it.
        if !self.database.delete_medicine(medicine_id, user_id).await? {
            return Ok(false);
        }
        let removed = self.registry.deregister_all(medicine_id);
        info!("Deleted medicine {medicine_id} for user {user_id} ({removed} trigger(s))");
        Ok(true)
    }

    /// Spawn one task per due trigger. Dropping the handles detaches them.
    pub fn fire_due(&self, now: DateTime<Utc>) -> Vec<JoinHandle<()>> {
        self.registry
            .take_due(now)
            .into_iter()
            .map(|trigger| {
                let dispatcher = Arc::clone(&self.dispatcher);
                tokio::spawn(async move { Self::fire(dispatcher, trigger, now).await })
            })
            .collect()
    }

    async fn fire(dispatcher: Arc<ReminderDispatcher>, trigger: Trigger, now: DateTime<Utc>) {
        let fire_id = Uuid::new_v4();
        debug!("[{fire_id}] Firing {}", trigger.key);

        match trigger.job {
            TriggerJob::MedicineReminder {
                medicine_id,
                user_id,
                name,
                dose,
            } => {
                if let Err(e) = dispatcher
                    .send_medicine_reminder(medicine_id, user_id, &name, &dose, now)
                    .await
                {
                    warn!("[{fire_id}] Reminder {} not delivered: {e}", trigger.key);
                }
            }
            TriggerJob::ExerciseBroadcast => {
                if let Err(e) = dispatcher.broadcast_exercise_check_in(now).await {
                    error!("[{fire_id}] Exercise check-in failed: {e}");
                }
            }
        }
    }

    /// Tick forever, firing whatever is due.
    pub async fn run(self) {
        info!(
            "Reminder scheduler started ({} trigger(s), tick {}s)",
            self.registry.len(),
            self.tick.as_secs()
        );
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let fired = self.fire_due(Utc::now());
            if !fired.is_empty() {
                debug!("Fired {} trigger(s)", fired.len());
            }
        }
    }
}
