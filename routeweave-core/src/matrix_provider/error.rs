use thiserror::Error;

/// Errors from [`crate::MatrixProvider`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// No points were provided.
    ///
    /// Callers should pre-filter input to avoid this condition.
    #[error("at least one point is required")]
    EmptyInput,
    /// The request was rejected because of the caller's input.
    #[error("invalid routing input: {message}")]
    InvalidInput {
        /// Description of the rejected input.
        message: String,
    },
    /// The backend failed for reasons outside the caller's control.
    #[error("routing service failure: {message}")]
    Service {
        /// Description of the failure.
        message: String,
    },
}

impl MatrixError {
    /// Whether the failure stems from the caller's input.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InvalidInput { .. })
    }
}
