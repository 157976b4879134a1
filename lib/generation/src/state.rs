//! Per-topic retry state machine.
//!
//! ```text
//! Pending --Begin--> Calling --Response--> Validating --Validate--> Success
//!                       ^                                      |--> Retry --Resubmit--> Calling
//!                       |______________________________________|--> Aborted
//! ```
//!
//! [`transition`] is pure: it never calls a service. The engine performs the
//! generation call while in `Calling` and feeds the raw text back in as a
//! `Response` event.

use crate::schema::{parse_records, ValidationError};
use reframe_core::{GeneratedRecord, GenerationMode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum TopicState {
    /// Prompt not yet sent
    Pending,
    /// Waiting for the service; `failures` validation failures so far
    Calling { failures: u32 },
    /// Raw response received, not yet checked
    Validating { failures: u32, raw: String },
    /// Last response was invalid and attempts remain
    Retry { failures: u32, error: ValidationError },
    /// Terminal: the response validated
    Success { records: Vec<GeneratedRecord>, attempts: u32 },
    /// Terminal: the attempt budget is spent
    Aborted { attempts: u32, error: ValidationError },
}

impl TopicState {
    pub fn name(&self) -> &'static str {
        match self {
            TopicState::Pending => "pending",
            TopicState::Calling { .. } => "calling",
            TopicState::Validating { .. } => "validating",
            TopicState::Retry { .. } => "retry",
            TopicState::Success { .. } => "success",
            TopicState::Aborted { .. } => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TopicState::Success { .. } | TopicState::Aborted { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopicEvent {
    Begin,
    Response(String),
    Validate,
    Resubmit,
}

impl TopicEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TopicEvent::Begin => "begin",
            TopicEvent::Response(_) => "response",
            TopicEvent::Validate => "validate",
            TopicEvent::Resubmit => "resubmit",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal transition: `{event}` in state `{state}`")]
pub struct IllegalTransition {
    pub state: &'static str,
    pub event: &'static str,
}

/// Advance `state` by one `event`.
///
/// A failed validation moves to `Retry` while fewer than `max_attempts`
/// responses have failed, and to `Aborted` once that many have.
pub fn transition(
    state: TopicState,
    event: TopicEvent,
    mode: GenerationMode,
    max_attempts: u32,
) -> Result<TopicState, IllegalTransition> {
    match (state, event) {
        (TopicState::Pending, TopicEvent::Begin) => Ok(TopicState::Calling { failures: 0 }),
        (TopicState::Calling { failures }, TopicEvent::Response(raw)) => {
            Ok(TopicState::Validating { failures, raw })
        }
        (TopicState::Validating { failures, raw }, TopicEvent::Validate) => {
            match parse_records(&raw, mode) {
                Ok(records) => Ok(TopicState::Success {
                    records,
                    attempts: failures + 1,
                }),
                Err(error) => {
                    let failures = failures + 1;
                    if failures >= max_attempts {
                        Ok(TopicState::Aborted {
                            attempts: failures,
                            error,
                        })
                    } else {
                        Ok(TopicState::Retry { failures, error })
                    }
                }
            }
        }
        (TopicState::Retry { failures, .. }, TopicEvent::Resubmit) => {
            Ok(TopicState::Calling { failures })
        }
        (state, event) => Err(IllegalTransition {
            state: state.name(),
            event: event.name(),
        }),
    }
}
