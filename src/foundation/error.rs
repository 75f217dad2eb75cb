/// Convenience result type used across the crate.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors reported by pipeline consumers and configuration loading.
///
/// Programming errors in pipeline assembly (overflowing the stage capacity, pairing a stage
/// with the wrong context) are not represented here; they panic.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Invalid caller-provided data such as short buffers or out-of-range configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A pixel format, blend mode or color description no pipeline stage can express.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Configuration (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error (I/O at the application edge).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Build a [`PipelineError::Validation`] error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PipelineError::Unsupported`] error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`PipelineError::Serde`] error.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error reports an unsupported configuration.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
