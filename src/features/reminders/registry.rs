//! Trigger registry
//!
//! One daily trigger per (medicine, time token) plus the fixed exercise
//! check-in. Keys are deterministic so re-registering replaces in place.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Startup reconciliation report, per-medicine failures no longer abort the sweep
//! - 1.1.0: Next-fire instants computed in the configured timezone (DST aware)
//! - 1.0.0: DashMap-backed registry with prefix removal

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fmt;

use super::time_tokens::TimeToken;
use crate::core::InvalidScheduleError;
use crate::database::{Database, Medicine};

pub const EXERCISE_TRIGGER_KEY: &str = "daily_exercise_reminder";

pub fn medicine_key_prefix(medicine_id: i64) -> String {
    format!("med_{medicine_id}_")
}

pub fn medicine_trigger_key(medicine_id: i64, token: &str) -> String {
    format!("{}{token}", medicine_key_prefix(medicine_id))
}

/// What a trigger does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerJob {
    MedicineReminder {
        medicine_id: i64,
        user_id: u64,
        name: String,
        dose: String,
    },
    ExerciseBroadcast,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub key: String,
    pub job: TriggerJob,
    pub at: TimeToken,
    pub next_fire: DateTime<Tz>,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub medicines: usize,
    pub registered: usize,
    pub rejected: Vec<InvalidScheduleError>,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} trigger(s) from {} medicine(s), {} rejected",
            self.registered,
            self.medicines,
            self.rejected.len()
        )
    }
}

/// First local occurrence of `token` strictly after `after`.
///
/// A wall-clock time that doesn't exist on a day (DST gap) moves to the next
/// day; an ambiguous one resolves to its earliest instant.
pub fn next_occurrence(token: TimeToken, after: DateTime<Tz>) -> DateTime<Tz> {
    let tz = after.timezone();
    let mut date = after.date_naive();
    // A gap can swallow at most one day's occurrence.
    for _ in 0..4 {
        let candidate = date
            .and_hms_opt(u32::from(token.hour()), u32::from(token.minute()), 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest());
        if let Some(candidate) = candidate {
            if candidate > after {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    after + Duration::days(1)
}

pub struct TriggerRegistry {
    triggers: DashMap<String, Trigger>,
    timezone: Tz,
}

impl TriggerRegistry {
    pub fn new(timezone: Tz) -> Self {
        Self {
            triggers: DashMap::new(),
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Install or replace the trigger under `key`.
    ///
    /// `token` must be canonical `HH:MM`; anything else is refused before the
    /// map is touched.
    pub fn register(
        &self,
        key: &str,
        token: &str,
        job: TriggerJob,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidScheduleError> {
        let at = TimeToken::from_canonical(token).ok_or_else(|| InvalidScheduleError {
            key: key.to_string(),
            token: token.to_string(),
        })?;

        let next_fire = next_occurrence(at, now.with_timezone(&self.timezone));
        let replaced = self
            .triggers
            .insert(
                key.to_string(),
                Trigger {
                    key: key.to_string(),
                    job,
                    at,
                    next_fire,
                },
            )
            .is_some();

        debug!(
            "{} trigger {key}, next fire {next_fire}",
            if replaced { "Replaced" } else { "Registered" }
        );
        Ok(())
    }

    /// Register every time token of a stored medicine. A single malformed
    /// token rejects the medicine and nothing is registered for it.
    pub fn register_medicine(
        &self,
        medicine: &Medicine,
        now: DateTime<Utc>,
    ) -> Result<usize, InvalidScheduleError> {
        if let Some(bad) = medicine
            .times
            .iter()
            .find(|t| TimeToken::from_canonical(t).is_none())
        {
            return Err(InvalidScheduleError {
                key: medicine_trigger_key(medicine.id, bad),
                token: bad.clone(),
            });
        }

        // Duplicate tokens share a key, so count what actually lands in the map.
        let tokens: BTreeSet<&str> = medicine.times.iter().map(String::as_str).collect();
        for &token in &tokens {
            self.register(
                &medicine_trigger_key(medicine.id, token),
                token,
                TriggerJob::MedicineReminder {
                    medicine_id: medicine.id,
                    user_id: medicine.user_id,
                    name: medicine.name.clone(),
                    dose: medicine.dose.clone(),
                },
                now,
            )?;
        }
        Ok(tokens.len())
    }

    pub fn register_daily_exercise(
        &self,
        at: TimeToken,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidScheduleError> {
        self.register(
            EXERCISE_TRIGGER_KEY,
            &at.to_string(),
            TriggerJob::ExerciseBroadcast,
            now,
        )
    }

    /// Remove every trigger derived from `medicine_id`. Zero matches is fine.
    pub fn deregister_all(&self, medicine_id: i64) -> usize {
        let prefix = medicine_key_prefix(medicine_id);
        let before = self.triggers.len();
        self.triggers.retain(|key, _| !key.starts_with(&prefix));
        let removed = before.saturating_sub(self.triggers.len());
        if removed > 0 {
            info!("Removed {removed} trigger(s) for medicine {medicine_id}");
        }
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.triggers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.triggers.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn next_fire(&self, key: &str) -> Option<DateTime<Tz>> {
        self.triggers.get(key).map(|t| t.next_fire)
    }

    /// Collect every trigger due at `now` and advance each past `now`.
    ///
    /// A trigger fires at most once per call however late the tick is.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<Trigger> {
        let local_now = now.with_timezone(&self.timezone);
        let mut due = Vec::new();
        for mut entry in self.triggers.iter_mut() {
            if entry.next_fire <= local_now {
                due.push((*entry).clone());
                entry.next_fire = next_occurrence(entry.at, local_now);
            }
        }
        due
    }

    /// Rebuild medicine triggers from the store. Run once at startup.
    ///
    /// A medicine with a malformed stored token is logged and skipped; the
    /// rest still load.
    pub async fn reconcile_all(
        &self,
        database: &Database,
        now: DateTime<Utc>,
    ) -> Result<ReconcileReport> {
        let medicines = database.list_all_medicines().await?;
        let mut report = ReconcileReport {
            medicines: medicines.len(),
            ..Default::default()
        };

        for medicine in &medicines {
            match self.register_medicine(medicine, now) {
                Ok(count) => report.registered += count,
                Err(e) => {
                    warn!("Skipping medicine {} during reconciliation: {e}", medicine.id);
                    report.rejected.push(e);
                }
            }
        }

        info!("Reconciled {report}");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NewMedicine;
    use chrono::NaiveDateTime;

    const TZ: Tz = chrono_tz::Asia::Kolkata;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn medicine(id: i64, times: &[&str]) -> Medicine {
        Medicine {
            id,
            user_id: 1,
            name: format!("med{id}"),
            dose: "1 tab".to_string(),
            times: times.iter().map(|t| t.to_string()).collect(),
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = TriggerRegistry::new(TZ);
        let now = utc(2024, 1, 1, 0, 0);
        let med = medicine(1, &["09:00"]);

        registry.register_medicine(&med, now).unwrap();
        registry.register_medicine(&med, now).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("med_1_09:00"));
    }

    #[test]
    fn test_deregister_removes_only_that_medicine() {
        let registry = TriggerRegistry::new(TZ);
        let now = utc(2024, 1, 1, 0, 0);
        registry
            .register_medicine(&medicine(1, &["09:00", "21:00"]), now)
            .unwrap();
        registry.register_medicine(&medicine(2, &["09:00"]), now).unwrap();

        assert_eq!(registry.deregister_all(1), 2);
        assert_eq!(registry.keys(), vec!["med_2_09:00"]);
        assert_eq!(registry.deregister_all(1), 0);
    }

    #[test]
    fn test_prefix_does_not_match_longer_ids() {
        let registry = TriggerRegistry::new(TZ);
        let now = utc(2024, 1, 1, 0, 0);
        registry.register_medicine(&medicine(1, &["09:00"]), now).unwrap();
        registry.register_medicine(&medicine(12, &["09:00"]), now).unwrap();

        registry.deregister_all(1);
        assert_eq!(registry.keys(), vec!["med_12_09:00"]);
    }

    #[test]
    fn test_rejects_non_canonical_tokens() {
        let registry = TriggerRegistry::new(TZ);
        let err = registry
            .register("med_1_9am", "9am", TriggerJob::ExerciseBroadcast, Utc::now())
            .unwrap_err();
        assert_eq!(err.token, "9am");
        assert!(registry.is_empty());

        assert!(registry
            .register_medicine(&medicine(3, &["08:00", "25:00"]), Utc::now())
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_next_fire_is_strictly_after_registration() {
        let registry = TriggerRegistry::new(TZ);
        // 03:30 UTC == 09:00 IST
        let now = utc(2024, 1, 1, 3, 30);
        registry.register_medicine(&medicine(1, &["09:00"]), now).unwrap();

        let next = registry.next_fire("med_1_09:00").unwrap();
        assert_eq!(next.with_timezone(&Utc), utc(2024, 1, 2, 3, 30));
    }

    #[test]
    fn test_take_due_fires_once_per_day() {
        let registry = TriggerRegistry::new(TZ);
        registry
            .register_medicine(&medicine(1, &["09:00"]), utc(2024, 1, 1, 0, 0))
            .unwrap();

        assert!(registry.take_due(utc(2024, 1, 1, 3, 29)).is_empty());
        assert_eq!(registry.take_due(utc(2024, 1, 1, 3, 30)).len(), 1);
        assert!(registry.take_due(utc(2024, 1, 1, 3, 31)).is_empty());

        // Three days late still fires once.
        assert_eq!(registry.take_due(utc(2024, 1, 4, 12, 0)).len(), 1);
        assert!(registry.take_due(utc(2024, 1, 4, 12, 1)).is_empty());
        assert_eq!(
            registry.next_fire("med_1_09:00").unwrap().with_timezone(&Utc),
            utc(2024, 1, 5, 3, 30)
        );
    }

    #[test]
    fn test_dst_gap_moves_to_next_valid_day() {
        let tz: Tz = chrono_tz::Europe::Berlin;
        // 02:30 does not exist in Berlin on 2024-03-31.
        let after = tz.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let next = next_occurrence(TimeToken::new(2, 30).unwrap(), after);
        assert_eq!(next, tz.with_ymd_and_hms(2024, 4, 1, 2, 30, 0).unwrap());
    }

    #[test]
    fn test_ambiguous_time_uses_earliest() {
        let tz: Tz = chrono_tz::Europe::Berlin;
        // 02:30 happens twice on 2024-10-27.
        let after = tz.with_ymd_and_hms(2024, 10, 27, 0, 0, 0).unwrap();
        let next = next_occurrence(TimeToken::new(2, 30).unwrap(), after);
        assert_eq!(next.with_timezone(&Utc), utc(2024, 10, 27, 0, 30));
    }

    #[tokio::test]
    async fn test_reconcile_all_loads_every_medicine() {
        let db = Database::new(":memory:").await.unwrap();
        let now = utc(2024, 1, 1, 0, 0);
        let a = db
            .add_medicine(
                1,
                &NewMedicine {
                    name: "A".to_string(),
                    dose: "1".to_string(),
                    times: vec![TimeToken::new(9, 0).unwrap(), TimeToken::new(21, 0).unwrap()],
                },
                now,
            )
            .await
            .unwrap();
        let b = db
            .add_medicine(
                2,
                &NewMedicine {
                    name: "B".to_string(),
                    dose: "1".to_string(),
                    times: vec![TimeToken::new(9, 0).unwrap()],
                },
                now,
            )
            .await
            .unwrap();

        let registry = TriggerRegistry::new(TZ);
        let report = registry.reconcile_all(&db, now).await.unwrap();

        assert_eq!(report.medicines, 2);
        assert_eq!(report.registered, 3);
        assert!(report.rejected.is_empty());
        assert!(registry.contains(&medicine_trigger_key(a, "21:00")));
        assert!(registry.contains(&medicine_trigger_key(b, "09:00")));

        // Running again replaces rather than duplicates.
        registry.reconcile_all(&db, now).await.unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_tokens_count_once() {
        let registry = TriggerRegistry::new(TZ);
        let med = medicine(1, &["09:00", "21:00", "09:00"]);

        let count = registry.register_medicine(&med, utc(2024, 1, 1, 0, 0)).unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_skips_malformed_stored_tokens() {
        let db = Database::new(":memory:").await.unwrap();
        db.execute_raw(
            "INSERT INTO medicines (med_id, user_id, name, dose, times, created_at) VALUES
                (1, 1, 'Good', '1 tab', '[\"08:00\",\"20:00\"]', '2024-01-01 00:00:00'),
                (2, 1, 'Bad', '1 tab', '[\"9am\"]', '2024-01-01 00:00:00');",
        )
        .await
        .unwrap();

        let registry = TriggerRegistry::new(TZ);
        let report = registry
            .reconcile_all(&db, utc(2024, 1, 1, 0, 0))
            .await
            .unwrap();

        assert_eq!(report.medicines, 2);
        assert_eq!(report.registered, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].token, "9am");
        assert_eq!(report.to_string(), "2 trigger(s) from 2 medicine(s), 1 rejected");
        assert!(registry.contains(&medicine_trigger_key(1, "08:00")));
        assert!(registry.contains(&medicine_trigger_key(1, "20:00")));
        let bad_prefix = medicine_key_prefix(2);
        assert!(registry.keys().iter().all(|k| !k.starts_with(&bad_prefix)));
    }
}
