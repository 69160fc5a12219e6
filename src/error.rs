use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    /// Malformed or inconsistent event result. Aborts scoring for the event.
    #[error("event result failed integrity check: {0}")]
    DataIntegrity(String),

    #[error("no entrants to rank")]
    EmptyInput,

    /// `input` names what was handed in for the wrong event
    /// ("prediction" or "classification").
    #[error("{input} is for event {found} but result is for event {expected}")]
    Mismatch {
        input: &'static str,
        found: String,
        expected: String,
    },

    #[error("results for event {event_id} are not finalized yet")]
    NotReady { event_id: String },

    #[error("invalid scoring config: {0}")]
    InvalidConfig(String),
}

impl ScoringError {
    /// Only `NotReady` clears up on its own; everything else needs new input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScoringError::NotReady { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
