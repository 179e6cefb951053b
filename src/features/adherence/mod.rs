//! # Adherence Feature
//!
//! Trailing 7-day summaries: expected vs. taken doses and exercise totals.
//! Everything is computed on local calendar days in the configured timezone.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;

use crate::database::{Database, ExerciseEntry, Medicine};

/// Days in the adherence window, today included.
pub const WINDOW_DAYS: i64 = 7;

/// Sum over medicines of `min(7, days since local creation + 1) x tokens`.
/// A medicine created after `today` contributes nothing.
pub fn expected_doses(medicines: &[Medicine], today: NaiveDate, timezone: Tz) -> u64 {
    medicines
        .iter()
        .map(|medicine| {
            let created = medicine
                .created_at_utc()
                .with_timezone(&timezone)
                .date_naive();
            let active_days = ((today - created).num_days() + 1).clamp(0, WINDOW_DAYS);
            active_days as u64 * medicine.times.len() as u64
        })
        .sum()
}

/// Rounded percentage, 0 when nothing was expected.
pub fn adherence_percent(taken: u64, expected: u64) -> u64 {
    if expected == 0 {
        return 0;
    }
    ((taken as f64 * 100.0) / expected as f64).round() as u64
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseSummary {
    pub active_days: usize,
    pub total_minutes: f64,
    pub top_activity: Option<String>,
}

/// Aggregate entries that already fall inside the window.
///
/// The top activity has the largest summed minutes; ties go to the
/// alphabetically first name.
pub fn summarize_exercise(entries: &[ExerciseEntry]) -> ExerciseSummary {
    let mut per_activity: BTreeMap<&str, f64> = BTreeMap::new();
    let mut days: Vec<NaiveDate> = Vec::new();
    let mut total_minutes = 0.0;

    for entry in entries {
        *per_activity.entry(entry.name.as_str()).or_default() += entry.minutes;
        total_minutes += entry.minutes;
        if !days.contains(&entry.date) {
            days.push(entry.date);
        }
    }

    // BTreeMap iterates names in order; keep the first of equal totals.
    let mut top: Option<(&str, f64)> = None;
    for (name, minutes) in per_activity {
        match top {
            Some((_, best)) if minutes <= best => {}
            _ => top = Some((name, minutes)),
        }
    }

    ExerciseSummary {
        active_days: days.len(),
        total_minutes,
        top_activity: top.map(|(name, _)| name.to_string()),
    }
}

/// `45` for whole minutes, `12.5` otherwise.
pub fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{minutes:.1}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummary {
    pub exercise: ExerciseSummary,
    pub taken: u64,
    pub expected: u64,
    pub percent: u64,
}

impl WeeklySummary {
    pub fn render(&self) -> String {
        format!(
            "📊 Last 7 days summary:\n\
             • Exercise days: {}\n\
             • Total minutes: {}\n\
             • Most common activity: {}\n\
             • Medicine adherence: {}/{} ({}%)",
            self.exercise.active_days,
            format_minutes(self.exercise.total_minutes),
            self.exercise.top_activity.as_deref().unwrap_or("-"),
            self.taken,
            self.expected,
            self.percent
        )
    }
}

#[derive(Clone)]
pub struct AdherenceAggregator {
    database: Database,
    timezone: Tz,
}

impl AdherenceAggregator {
    pub fn new(database: Database, timezone: Tz) -> Self {
        Self { database, timezone }
    }

    /// First local day of the window ending today.
    pub fn window_start(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive() - Duration::days(WINDOW_DAYS - 1)
    }

    pub async fn weekly_summary(&self, user_id: u64, now: DateTime<Utc>) -> Result<WeeklySummary> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let start = self.window_start(now);
        let start_utc = start
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| self.timezone.from_local_datetime(&midnight).earliest())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| now - Duration::days(WINDOW_DAYS));

        let medicines = self.database.list_medicines(user_id).await?;
        let expected = expected_doses(&medicines, today, self.timezone);
        let taken = self.database.taken_count_since(user_id, start_utc).await?;
        let entries = self.database.exercises_since(user_id, start).await?;

        Ok(WeeklySummary {
            exercise: summarize_exercise(&entries),
            taken,
            expected,
            percent: adherence_percent(taken, expected),
        })
    }
}
