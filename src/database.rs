//! # Database
//!
//! SQLite persistence for users, medicines, adherence logs and exercise entries.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Medicine schedules, append-only adherence logs, accumulating exercise entries
//! - 1.0.0: Initial users table

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::features::reminders::{DoseStatus, TimeToken};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        username TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS medicines (
        med_id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        dose TEXT NOT NULL,
        times TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS med_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        med_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        scheduled_time TEXT NOT NULL,
        status TEXT NOT NULL,
        logged_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS exercises (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        minutes REAL NOT NULL,
        date TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_medicines_user ON medicines(user_id);
    CREATE INDEX IF NOT EXISTS idx_med_logs_user ON med_logs(user_id, logged_at);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_exercises_day ON exercises(user_id, name, date);
";

/// A stored medicine. `times` are kept as stored so the trigger registry can
/// reject anything that isn't canonical `HH:MM`.
#[derive(Debug, Clone, PartialEq)]
pub struct Medicine {
    pub id: i64,
    pub user_id: u64,
    pub name: String,
    pub dose: String,
    pub times: Vec<String>,
    pub created_at: NaiveDateTime,
}

impl Medicine {
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

/// Validated output of the add-medicine flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedicine {
    pub name: String,
    pub dose: String,
    pub times: Vec<TimeToken>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseEntry {
    pub id: i64,
    pub user_id: u64,
    pub name: String,
    pub minutes: f64,
    pub date: NaiveDate,
}

/// Validated output of the log-exercise flow. `name` is already lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdherenceLog {
    pub id: i64,
    pub medicine_id: i64,
    pub user_id: u64,
    pub correlation_token: String,
    pub status: String,
    pub logged_at: NaiveDateTime,
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid stored timestamp '{raw}'"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date '{raw}'"))
}

/// Single-value query helper for `SELECT changes()` and friends.
fn scalar(conn: &Connection, sql: &str) -> Result<i64> {
    let mut stmt = conn.prepare(sql)?;
    stmt.next()?;
    Ok(stmt.read::<i64, _>(0)?)
}

fn read_medicine(stmt: &Statement<'_>) -> Result<Medicine> {
    let times_json = stmt.read::<String, _>("times")?;
    let times: Vec<String> = serde_json::from_str(&times_json)
        .with_context(|| format!("Invalid stored times '{times_json}'"))?;
    Ok(Medicine {
        id: stmt.read::<i64, _>("med_id")?,
        user_id: stmt.read::<i64, _>("user_id")? as u64,
        name: stmt.read::<String, _>("name")?,
        dose: stmt.read::<String, _>("dose")?,
        times,
        created_at: parse_timestamp(&stmt.read::<String, _>("created_at")?)?,
    })
}

fn read_exercise(stmt: &Statement<'_>) -> Result<ExerciseEntry> {
    Ok(ExerciseEntry {
        id: stmt.read::<i64, _>("id")?,
        user_id: stmt.read::<i64, _>("user_id")? as u64,
        name: stmt.read::<String, _>("name")?,
        minutes: stmt.read::<f64, _>("minutes")?,
        date: parse_date(&stmt.read::<String, _>("date")?)?,
    })
}

/// Cloneable handle around a single SQLite connection.
///
/// The connection is only touched while the mutex is held and no statement
/// outlives a call, so every method is one serialized unit of work.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        let connection = sqlite::open(database_path)
            .with_context(|| format!("Failed to open database at {database_path}"))?;
        connection.execute(SCHEMA)?;
        info!("Database initialized at {database_path}");
        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    // ---- users ----

    pub async fn add_user(&self, user_id: u64, username: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO users (user_id, username) VALUES (?, ?)")?;
        stmt.bind((1, user_id as i64))?;
        stmt.bind((2, username))?;
        stmt.next()?;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<u64>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("SELECT user_id FROM users ORDER BY user_id")?;
        let mut users = Vec::new();
        while let State::Row = stmt.next()? {
            users.push(stmt.read::<i64, _>(0)? as u64);
        }
        Ok(users)
    }

    // ---- medicines ----

    pub async fn add_medicine(
        &self,
        user_id: u64,
        medicine: &NewMedicine,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let times: Vec<String> = medicine.times.iter().map(ToString::to_string).collect();
        let times_json = serde_json::to_string(&times)?;

        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "INSERT INTO medicines (user_id, name, dose, times, created_at) VALUES (?, ?, ?, ?, ?)",
        )?;
        stmt.bind((1, user_id as i64))?;
        stmt.bind((2, medicine.name.as_str()))?;
        stmt.bind((3, medicine.dose.as_str()))?;
        stmt.bind((4, times_json.as_str()))?;
        stmt.bind((5, format_timestamp(created_at).as_str()))?;
        stmt.next()?;
        drop(stmt);

        let id = scalar(&conn, "SELECT last_insert_rowid()")?;
        debug!("Stored medicine {id} for user {user_id}");
        Ok(id)
    }

    pub async fn list_medicines(&self, user_id: u64) -> Result<Vec<Medicine>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT med_id, user_id, name, dose, times, created_at
             FROM medicines WHERE user_id = ? ORDER BY med_id",
        )?;
        stmt.bind((1, user_id as i64))?;
        let mut medicines = Vec::new();
        while let State::Row = stmt.next()? {
            medicines.push(read_medicine(&stmt)?);
        }
        Ok(medicines)
    }

    /// Every medicine of every user, for startup reconciliation.
    pub async fn list_all_medicines(&self) -> Result<Vec<Medicine>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT med_id, user_id, name, dose, times, created_at FROM medicines ORDER BY med_id",
        )?;
        let mut medicines = Vec::new();
        while let State::Row = stmt.next()? {
            medicines.push(read_medicine(&stmt)?);
        }
        Ok(medicines)
    }

    pub async fn get_medicine(&self, med_id: i64) -> Result<Option<Medicine>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT med_id, user_id, name, dose, times, created_at FROM medicines WHERE med_id = ?",
        )?;
        stmt.bind((1, med_id))?;
        match stmt.next()? {
            State::Row => Ok(Some(read_medicine(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    /// Hard delete, scoped to the owner. Adherence logs are kept.
    pub async fn delete_medicine(&self, med_id: i64, user_id: u64) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("DELETE FROM medicines WHERE med_id = ? AND user_id = ?")?;
        stmt.bind((1, med_id))?;
        stmt.bind((2, user_id as i64))?;
        stmt.next()?;
        drop(stmt);
        Ok(scalar(&conn, "SELECT changes()")? > 0)
    }

    // ---- adherence logs ----

    pub async fn log_med_status(
        &self,
        med_id: i64,
        user_id: u64,
        correlation_token: &str,
        status: DoseStatus,
        logged_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "INSERT INTO med_logs (med_id, user_id, scheduled_time, status, logged_at)
             VALUES (?, ?, ?, ?, ?)",
        )?;
        stmt.bind((1, med_id))?;
        stmt.bind((2, user_id as i64))?;
        stmt.bind((3, correlation_token))?;
        stmt.bind((4, status.as_str()))?;
        stmt.bind((5, format_timestamp(logged_at).as_str()))?;
        stmt.next()?;
        drop(stmt);
        scalar(&conn, "SELECT last_insert_rowid()")
    }

    /// `taken` log entries for a user at or after `since`.
    pub async fn taken_count_since(&self, user_id: u64, since: DateTime<Utc>) -> Result<u64> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COUNT(*) FROM med_logs WHERE user_id = ? AND status = ? AND logged_at >= ?",
        )?;
        stmt.bind((1, user_id as i64))?;
        stmt.bind((2, DoseStatus::Taken.as_str()))?;
        stmt.bind((3, format_timestamp(since).as_str()))?;
        stmt.next()?;
        Ok(stmt.read::<i64, _>(0)?.max(0) as u64)
    }

    pub async fn med_logs_for(&self, med_id: i64) -> Result<Vec<AdherenceLog>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, med_id, user_id, scheduled_time, status, logged_at
             FROM med_logs WHERE med_id = ? ORDER BY id",
        )?;
        stmt.bind((1, med_id))?;
        let mut logs = Vec::new();
        while let State::Row = stmt.next()? {
            logs.push(AdherenceLog {
                id: stmt.read::<i64, _>("id")?,
                medicine_id: stmt.read::<i64, _>("med_id")?,
                user_id: stmt.read::<i64, _>("user_id")? as u64,
                correlation_token: stmt.read::<String, _>("scheduled_time")?,
                status: stmt.read::<String, _>("status")?,
                logged_at: parse_timestamp(&stmt.read::<String, _>("logged_at")?)?,
            });
        }
        Ok(logs)
    }

    // ---- exercises ----

    /// Add minutes to the (user, name, date) entry, creating it if needed.
    /// Returns the accumulated total for that day.
    pub async fn add_exercise(
        &self,
        user_id: u64,
        exercise: &NewExercise,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let conn = self.connection.lock().await;

        let mut select = conn.prepare(
            "SELECT id, minutes FROM exercises WHERE user_id = ? AND name = ? AND date = ?",
        )?;
        select.bind((1, user_id as i64))?;
        select.bind((2, exercise.name.as_str()))?;
        select.bind((3, date_str.as_str()))?;
        let existing = match select.next()? {
            State::Row => Some((select.read::<i64, _>(0)?, select.read::<f64, _>(1)?)),
            State::Done => None,
        };
        drop(select);

        match existing {
            Some((id, minutes)) => {
                let total = minutes + exercise.minutes;
                let mut update = conn.prepare("UPDATE exercises SET minutes = ? WHERE id = ?")?;
                update.bind((1, total))?;
                update.bind((2, id))?;
                update.next()?;
                Ok(total)
            }
            None => {
                let mut insert = conn.prepare(
                    "INSERT INTO exercises (user_id, name, minutes, date, created_at)
                     VALUES (?, ?, ?, ?, ?)",
                )?;
                insert.bind((1, user_id as i64))?;
                insert.bind((2, exercise.name.as_str()))?;
                insert.bind((3, exercise.minutes))?;
                insert.bind((4, date_str.as_str()))?;
                insert.bind((5, format_timestamp(now).as_str()))?;
                insert.next()?;
                Ok(exercise.minutes)
            }
        }
    }

    pub async fn list_recent_exercises(
        &self,
        user_id: u64,
        limit: usize,
    ) -> Result<Vec<ExerciseEntry>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, minutes, date FROM exercises
             WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ?",
        )?;
        stmt.bind((1, user_id as i64))?;
        stmt.bind((2, limit as i64))?;
        let mut entries = Vec::new();
        while let State::Row = stmt.next()? {
            entries.push(read_exercise(&stmt)?);
        }
        Ok(entries)
    }

    /// Entries dated on or after `since` (local calendar dates).
    pub async fn exercises_since(&self, user_id: u64, since: NaiveDate) -> Result<Vec<ExerciseEntry>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, minutes, date FROM exercises
             WHERE user_id = ? AND date >= ? ORDER BY date, id",
        )?;
        stmt.bind((1, user_id as i64))?;
        stmt.bind((2, since.format(DATE_FORMAT).to_string().as_str()))?;
        let mut entries = Vec::new();
        while let State::Row = stmt.next()? {
            entries.push(read_exercise(&stmt)?);
        }
        Ok(entries)
    }

    pub async fn delete_exercise(&self, id: i64, user_id: u64) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("DELETE FROM exercises WHERE id = ? AND user_id = ?")?;
        stmt.bind((1, id))?;
        stmt.bind((2, user_id as i64))?;
        stmt.next()?;
        drop(stmt);
        Ok(scalar(&conn, "SELECT changes()")? > 0)
    }

    /// Run raw SQL against the store, for shaping fixtures that the typed API refuses to write.
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        conn.execute(sql)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn paracetamol() -> NewMedicine {
        NewMedicine {
            name: "Paracetamol".to_string(),
            dose: "500mg".to_string(),
            times: vec![TimeToken::new(9, 0).unwrap(), TimeToken::new(21, 0).unwrap()],
        }
    }

    #[tokio::test]
    async fn test_users_are_registered_once() {
        let db = Database::new(":memory:").await.unwrap();
        db.add_user(1, "alice").await.unwrap();
        db.add_user(1, "alice").await.unwrap();
        db.add_user(2, "bob").await.unwrap();
        assert_eq!(db.list_users().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_medicine_round_trip_and_owner_scoped_delete() {
        let db = Database::new(":memory:").await.unwrap();
        let created = at(2024, 1, 1, 8, 30);
        let id = db.add_medicine(1, &paracetamol(), created).await.unwrap();

        let stored = db.get_medicine(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Paracetamol");
        assert_eq!(stored.times, vec!["09:00", "21:00"]);
        assert_eq!(stored.created_at_utc(), created);
        assert_eq!(db.list_medicines(1).await.unwrap().len(), 1);
        assert!(db.list_medicines(2).await.unwrap().is_empty());

        assert!(!db.delete_medicine(id, 2).await.unwrap());
        assert!(db.delete_medicine(id, 1).await.unwrap());
        assert!(db.get_medicine(id).await.unwrap().is_none());
        assert!(!db.delete_medicine(id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_logs_survive_medicine_delete() {
        let db = Database::new(":memory:").await.unwrap();
        let id = db
            .add_medicine(1, &paracetamol(), at(2024, 1, 1, 0, 0))
            .await
            .unwrap();
        db.log_med_status(id, 1, "202401010900", DoseStatus::Taken, at(2024, 1, 1, 3, 31))
            .await
            .unwrap();
        db.log_med_status(id, 1, "202401012100", DoseStatus::Missed, at(2024, 1, 1, 15, 31))
            .await
            .unwrap();
        db.delete_medicine(id, 1).await.unwrap();

        let logs = db.med_logs_for(id).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, "taken");
        assert_eq!(logs[0].correlation_token, "202401010900");

        assert_eq!(db.taken_count_since(1, at(2024, 1, 1, 0, 0)).await.unwrap(), 1);
        assert_eq!(db.taken_count_since(1, at(2024, 1, 2, 0, 0)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exercise_minutes_accumulate_per_day() {
        let db = Database::new(":memory:").await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let now = at(2024, 3, 5, 10, 0);
        let cycling = |minutes| NewExercise {
            name: "cycling".to_string(),
            minutes,
        };

        assert_eq!(db.add_exercise(1, &cycling(20.0), today, now).await.unwrap(), 20.0);
        assert_eq!(db.add_exercise(1, &cycling(25.0), today, now).await.unwrap(), 45.0);

        let entries = db.list_recent_exercises(1, 200).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].minutes, 45.0);
        assert_eq!(entries[0].date, today);
    }

    #[tokio::test]
    async fn test_exercise_listing_order_and_delete() {
        let db = Database::new(":memory:").await.unwrap();
        let now = at(2024, 3, 5, 10, 0);
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let walk = NewExercise {
            name: "walk".to_string(),
            minutes: 10.0,
        };
        let yoga = NewExercise {
            name: "yoga".to_string(),
            minutes: 30.0,
        };

        db.add_exercise(1, &walk, day(1), now).await.unwrap();
        db.add_exercise(1, &walk, day(4), now).await.unwrap();
        db.add_exercise(1, &yoga, day(4), now).await.unwrap();

        let recent = db.list_recent_exercises(1, 200).await.unwrap();
        let names: Vec<(&str, NaiveDate)> =
            recent.iter().map(|e| (e.name.as_str(), e.date)).collect();
        assert_eq!(
            names,
            vec![("yoga", day(4)), ("walk", day(4)), ("walk", day(1))]
        );

        assert_eq!(db.exercises_since(1, day(2)).await.unwrap().len(), 2);

        let yoga_id = recent[0].id;
        assert!(!db.delete_exercise(yoga_id, 2).await.unwrap());
        assert!(db.delete_exercise(yoga_id, 1).await.unwrap());
        assert_eq!(db.list_recent_exercises(1, 200).await.unwrap().len(), 2);
    }
}
