use thiserror::Error;

/// Errors surfaced to the caller. Fitness-callback failures are not listed
/// here: they are recovered per tree and never abort a run.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed a malformed option set. The run never begins.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An internal invariant no longer holds. This is a bug in the engine,
    /// not in the caller's inputs.
    #[error("engine invariant violated: {0}")]
    Unreachable(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
