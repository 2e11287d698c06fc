use thiserror::Error;

/// Failures raised by the record store when assembling inputs for the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("student not found: {key}")]
    StudentNotFound { key: String },
    #[error("no performance history recorded for {key}")]
    NoHistory { key: String },
}
