#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Auto clock-out was requested for an attendance document that has
    /// no open clock-in.
    #[error("No prior clock-in on the attendance document")]
    NoPriorClockIn,

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
