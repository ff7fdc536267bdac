//! Model-level validation errors shared by the core domain logic.

use thiserror::Error;

/// Errors raised while constructing or transitioning model entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("filename sanitizes to an empty string")]
    EmptyFilename,

    #[error("year {0} is out of the accepted 1900-2099 range")]
    YearOutOfRange(i32),
}
