//! Environment-driven bot configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Fixed timezone, daily exercise check-in time and scheduler tick
//! - 1.0.0: Discord token, database path and log level

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use std::env;

use crate::features::reminders::TimeToken;

pub const DEFAULT_DATABASE_PATH: &str = "healthally.db";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_EXERCISE_HOUR: u8 = 17;
pub const DEFAULT_EXERCISE_MINUTE: u8 = 0;
pub const DEFAULT_TICK_SECONDS: u64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub discord_guild_id: Option<String>,
    pub database_path: String,
    pub log_level: String,
    /// Every user shares this zone for reminder times and calendar days.
    pub timezone: Tz,
    pub exercise_reminder_at: TimeToken,
    pub scheduler_tick_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_token =
            get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let timezone_name = get("BOT_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow!("Invalid BOT_TIMEZONE '{timezone_name}': {e}"))?;

        let hour = match get("EXERCISE_REMINDER_HOUR") {
            Some(raw) => raw
                .parse::<u8>()
                .with_context(|| format!("Invalid EXERCISE_REMINDER_HOUR '{raw}'"))?,
            None => DEFAULT_EXERCISE_HOUR,
        };
        let minute = match get("EXERCISE_REMINDER_MINUTE") {
            Some(raw) => raw
                .parse::<u8>()
                .with_context(|| format!("Invalid EXERCISE_REMINDER_MINUTE '{raw}'"))?,
            None => DEFAULT_EXERCISE_MINUTE,
        };
        let exercise_reminder_at = TimeToken::new(hour, minute).ok_or_else(|| {
            anyhow!("Exercise reminder time {hour}:{minute} is outside 00:00-23:59")
        })?;

        let scheduler_tick_seconds = match get("SCHEDULER_TICK_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid SCHEDULER_TICK_SECONDS '{raw}'"))?,
            None => DEFAULT_TICK_SECONDS,
        }
        .clamp(1, 60);

        Ok(Config {
            discord_token,
            discord_guild_id: get("DISCORD_GUILD_ID"),
            database_path: get("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            timezone,
            exercise_reminder_at,
            scheduler_tick_seconds,
        })
    }
}
