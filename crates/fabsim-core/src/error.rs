use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// Parameter errors are raised at construction, before the event loop
/// starts. Absence of metric samples is never an error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("unknown distribution: {0}")]
    UnknownDistribution(String),
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("precondition failed: {0}")]
    PreconditionFailure(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
