//! Button payloads round-tripped through Discord custom ids
//!
//! Format: `KIND|arg|token|status`
//! - `MED|<medicine_id>|<token>|taken|missed`
//! - `EX|<user_id>|<token>|done|skip`
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::fmt;
use std::str::FromStr;

use crate::core::MalformedActionError;

pub const MEDICINE_KIND: &str = "MED";
pub const EXERCISE_KIND: &str = "EX";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseStatus {
    Taken,
    Missed,
}

impl DoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoseStatus::Taken => "taken",
            DoseStatus::Missed => "missed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "taken" => Some(DoseStatus::Taken),
            "missed" => Some(DoseStatus::Missed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseStatus {
    Done,
    Skip,
}

impl ExerciseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseStatus::Done => "done",
            ExerciseStatus::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    Medicine {
        medicine_id: i64,
        correlation_token: String,
        status: DoseStatus,
    },
    Exercise {
        user_id: u64,
        correlation_token: String,
        status: ExerciseStatus,
    },
}

impl fmt::Display for ActionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPayload::Medicine {
                medicine_id,
                correlation_token,
                status,
            } => write!(
                f,
                "{MEDICINE_KIND}|{medicine_id}|{correlation_token}|{}",
                status.as_str()
            ),
            ActionPayload::Exercise {
                user_id,
                correlation_token,
                status,
            } => write!(
                f,
                "{EXERCISE_KIND}|{user_id}|{correlation_token}|{}",
                status.as_str()
            ),
        }
    }
}

impl FromStr for ActionPayload {
    type Err = MalformedActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split('|').collect();
        if parts.len() != 4 {
            return Err(MalformedActionError::FieldCount(parts.len()));
        }
        let (kind, id, token, status) = (parts[0], parts[1], parts[2], parts[3]);

        match kind {
            MEDICINE_KIND => {
                let medicine_id = id
                    .parse::<i64>()
                    .map_err(|_| MalformedActionError::InvalidId(id.to_string()))?;
                let status =
                    DoseStatus::parse(status).ok_or_else(|| MalformedActionError::UnknownStatus {
                        kind: MEDICINE_KIND,
                        status: status.to_string(),
                    })?;
                Ok(ActionPayload::Medicine {
                    medicine_id,
                    correlation_token: token.to_string(),
                    status,
                })
            }
            EXERCISE_KIND => {
                let user_id = id
                    .parse::<u64>()
                    .map_err(|_| MalformedActionError::InvalidId(id.to_string()))?;
                let status = match status {
                    "done" => ExerciseStatus::Done,
                    "skip" => ExerciseStatus::Skip,
                    other => {
                        return Err(MalformedActionError::UnknownStatus {
                            kind: EXERCISE_KIND,
                            status: other.to_string(),
                        })
                    }
                };
                Ok(ActionPayload::Exercise {
                    user_id,
                    correlation_token: token.to_string(),
                    status,
                })
            }
            other => Err(MalformedActionError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medicine_payload_format() {
        let payload = ActionPayload::Medicine {
            medicine_id: 7,
            correlation_token: "202401010900".to_string(),
            status: DoseStatus::Taken,
        };
        assert_eq!(payload.to_string(), "MED|7|202401010900|taken");
        assert_eq!("MED|7|202401010900|taken".parse::<ActionPayload>(), Ok(payload));
    }

    #[test]
    fn test_exercise_payload_parse() {
        let parsed: ActionPayload = "EX|42|202401011700|skip".parse().unwrap();
        assert_eq!(
            parsed,
            ActionPayload::Exercise {
                user_id: 42,
                correlation_token: "202401011700".to_string(),
                status: ExerciseStatus::Skip,
            }
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(
            "MED|1|tok".parse::<ActionPayload>(),
            Err(MalformedActionError::FieldCount(3))
        );
        assert_eq!(
            "ZZ|1|tok|taken".parse::<ActionPayload>(),
            Err(MalformedActionError::UnknownKind("ZZ".to_string()))
        );
        assert_eq!(
            "MED|abc|tok|taken".parse::<ActionPayload>(),
            Err(MalformedActionError::InvalidId("abc".to_string()))
        );
        assert!(matches!(
            "MED|1|tok|done".parse::<ActionPayload>(),
            Err(MalformedActionError::UnknownStatus { kind: "MED", .. })
        ));
        assert!(matches!(
            "EX|1|tok|taken".parse::<ActionPayload>(),
            Err(MalformedActionError::UnknownStatus { kind: "EX", .. })
        ));
        assert!("".parse::<ActionPayload>().is_err());
    }
}
