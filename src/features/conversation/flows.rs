//! Multi-step input flows as explicit state machines
//!
//! Each flow consumes one user message per step and either advances, asks
//! again, or completes with a validated record.

use crate::core::ParseError;
use crate::database::{NewExercise, NewMedicine};
use crate::features::reminders::parse_times;

use super::quantity::parse_minutes;

pub const MEDICINE_NAME_PROMPT: &str = "Medicine name? (e.g., Paracetamol)";
pub const DOSE_PROMPT: &str = "Dose? (e.g., 500 mg or 1 tablet)";
pub const TIMES_PROMPT: &str =
    "Suggest time for the reminder as comma-separated. e.g., 09:00, 21:00 or 9am, 9pm";
pub const TIMES_RETRY_PROMPT: &str =
    "⚠️ Couldn't understand time(s). Try like: 09:00, 21:00 or 9am, 9pm or 10pm";
pub const EXERCISE_NAME_PROMPT: &str = "What exercise did you do? (e.g., cycling, pushups)";
pub const DURATION_PROMPT: &str = "Duration of the exercise today? (e.g., 45 or 45 mins)";
pub const DURATION_RETRY_PROMPT: &str = "Couldn't parse duration. Enter a number (e.g., 45).";
pub const MEDICINE_ID_RETRY_PROMPT: &str = "Please reply with a numeric medicine ID.";
pub const EXERCISE_ID_RETRY_PROMPT: &str = "Please reply with a numeric entry ID.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedicineStep {
    Name,
    Dose { name: String },
    Times { name: String, dose: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseStep {
    Name,
    Duration { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    AddMedicine(MedicineStep),
    LogExercise(ExerciseStep),
    DeleteMedicine,
    DeleteExercise,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutput {
    Medicine(NewMedicine),
    Exercise(NewExercise),
    DeleteMedicine(i64),
    DeleteExercise(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Input accepted, move to the next step.
    Next { flow: Flow, prompt: String },
    /// Input rejected, same step again.
    Retry {
        flow: Flow,
        prompt: String,
        error: ParseError,
    },
    Complete(FlowOutput),
}

fn non_empty(input: &str, what: &'static str) -> Result<String, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ParseError::Empty(what))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_id(input: &str) -> Result<i64, ParseError> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| ParseError::Id(trimmed.to_string()))
}

impl Flow {
    pub fn add_medicine() -> (Flow, &'static str) {
        (Flow::AddMedicine(MedicineStep::Name), MEDICINE_NAME_PROMPT)
    }

    pub fn log_exercise() -> (Flow, &'static str) {
        (Flow::LogExercise(ExerciseStep::Name), EXERCISE_NAME_PROMPT)
    }

    /// Feed one message into the flow.
    pub fn advance(self, input: &str) -> Transition {
        match self {
            Flow::AddMedicine(step) => Self::advance_medicine(step, input),
            Flow::LogExercise(step) => Self::advance_exercise(step, input),
            Flow::DeleteMedicine => match parse_id(input) {
                Ok(id) => Transition::Complete(FlowOutput::DeleteMedicine(id)),
                Err(error) => Transition::Retry {
                    flow: Flow::DeleteMedicine,
                    prompt: MEDICINE_ID_RETRY_PROMPT.to_string(),
                    error,
                },
            },
            Flow::DeleteExercise => match parse_id(input) {
                Ok(id) => Transition::Complete(FlowOutput::DeleteExercise(id)),
                Err(error) => Transition::Retry {
                    flow: Flow::DeleteExercise,
                    prompt: EXERCISE_ID_RETRY_PROMPT.to_string(),
                    error,
                },
            },
        }
    }

    fn advance_medicine(step: MedicineStep, input: &str) -> Transition {
        match step {
            MedicineStep::Name => match non_empty(input, "Medicine name") {
                Ok(name) => Transition::Next {
                    flow: Flow::AddMedicine(MedicineStep::Dose { name }),
                    prompt: DOSE_PROMPT.to_string(),
                },
                Err(error) => Transition::Retry {
                    flow: Flow::AddMedicine(MedicineStep::Name),
                    prompt: MEDICINE_NAME_PROMPT.to_string(),
                    error,
                },
            },
            MedicineStep::Dose { name } => match non_empty(input, "Dose") {
                Ok(dose) => Transition::Next {
                    flow: Flow::AddMedicine(MedicineStep::Times { name, dose }),
                    prompt: TIMES_PROMPT.to_string(),
                },
                Err(error) => Transition::Retry {
                    flow: Flow::AddMedicine(MedicineStep::Dose { name }),
                    prompt: DOSE_PROMPT.to_string(),
                    error,
                },
            },
            MedicineStep::Times { name, dose } => match parse_times(input) {
                Ok(times) => Transition::Complete(FlowOutput::Medicine(NewMedicine {
                    name,
                    dose,
                    times,
                })),
                Err(error) => Transition::Retry {
                    flow: Flow::AddMedicine(MedicineStep::Times { name, dose }),
                    prompt: TIMES_RETRY_PROMPT.to_string(),
                    error,
                },
            },
        }
    }

    fn advance_exercise(step: ExerciseStep, input: &str) -> Transition {
        match step {
            ExerciseStep::Name => match non_empty(input, "Exercise name") {
                Ok(name) => Transition::Next {
                    flow: Flow::LogExercise(ExerciseStep::Duration {
                        name: name.to_lowercase(),
                    }),
                    prompt: DURATION_PROMPT.to_string(),
                },
                Err(error) => Transition::Retry {
                    flow: Flow::LogExercise(ExerciseStep::Name),
                    prompt: EXERCISE_NAME_PROMPT.to_string(),
                    error,
                },
            },
            ExerciseStep::Duration { name } => match parse_minutes(input) {
                Ok(minutes) => Transition::Complete(FlowOutput::Exercise(NewExercise {
                    name,
                    minutes,
                })),
                Err(error) => Transition::Retry {
                    flow: Flow::LogExercise(ExerciseStep::Duration { name }),
                    prompt: DURATION_RETRY_PROMPT.to_string(),
                    error,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::TimeToken;

    fn expect_next(transition: Transition) -> Flow {
        match transition {
            Transition::Next { flow, .. } => flow,
            other => panic!("expected Next, got {other:?}"),
        }
    }

    #[test]
    fn test_add_medicine_happy_path() {
        let (flow, prompt) = Flow::add_medicine();
        assert_eq!(prompt, MEDICINE_NAME_PROMPT);

        let flow = expect_next(flow.advance("  Paracetamol "));
        let flow = expect_next(flow.advance("500mg"));
        assert_eq!(
            flow,
            Flow::AddMedicine(MedicineStep::Times {
                name: "Paracetamol".to_string(),
                dose: "500mg".to_string()
            })
        );

        match flow.advance("9am, 21:00") {
            Transition::Complete(FlowOutput::Medicine(medicine)) => {
                assert_eq!(medicine.name, "Paracetamol");
                assert_eq!(medicine.dose, "500mg");
                assert_eq!(
                    medicine.times,
                    vec![TimeToken::new(9, 0).unwrap(), TimeToken::new(21, 0).unwrap()]
                );
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_times_stay_in_times_step() {
        let flow = Flow::AddMedicine(MedicineStep::Times {
            name: "A".to_string(),
            dose: "1".to_string(),
        });
        match flow.clone().advance("9am, 25:00") {
            Transition::Retry {
                flow: retry_flow,
                prompt,
                error,
            } => {
                assert_eq!(retry_flow, flow);
                assert_eq!(prompt, TIMES_RETRY_PROMPT);
                assert_eq!(error, ParseError::TimeToken("25:00".to_string()));
            }
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_name_retries() {
        let (flow, _) = Flow::add_medicine();
        assert!(matches!(
            flow.advance("   "),
            Transition::Retry {
                error: ParseError::Empty(_),
                ..
            }
        ));
    }

    #[test]
    fn test_log_exercise_lowercases_name() {
        let (flow, _) = Flow::log_exercise();
        let flow = expect_next(flow.advance("Cycling"));
        assert!(matches!(
            flow.clone().advance("soon"),
            Transition::Retry { .. }
        ));
        assert_eq!(
            flow.advance("45 mins"),
            Transition::Complete(FlowOutput::Exercise(NewExercise {
                name: "cycling".to_string(),
                minutes: 45.0
            }))
        );
    }

    #[test]
    fn test_delete_flows_need_numeric_ids() {
        assert_eq!(
            Flow::DeleteMedicine.advance(" 12 "),
            Transition::Complete(FlowOutput::DeleteMedicine(12))
        );
        assert!(matches!(
            Flow::DeleteMedicine.advance("twelve"),
            Transition::Retry {
                flow: Flow::DeleteMedicine,
                ..
            }
        ));
        assert!(matches!(
            Flow::DeleteExercise.advance("#3"),
            Transition::Retry {
                flow: Flow::DeleteExercise,
                ..
            }
        ));
    }
}
