use thiserror::Error;

/// Rejected input: a malformed submission or query parameter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name is too long: {length} characters (max {max})")]
    NameTooLong { length: usize, max: usize },

    #[error("score must not be negative: {0}")]
    NegativeScore(String),

    #[error("score must be a whole number: {0}")]
    FractionalScore(String),

    #[error("score must be a finite number")]
    NonFiniteScore,

    #[error("score must be a number, got {0}")]
    NotANumber(String),

    #[error("score is out of range: {0}")]
    ScoreOutOfRange(String),

    #[error("limit must be a positive integer, got {0}")]
    InvalidLimit(usize),
}
