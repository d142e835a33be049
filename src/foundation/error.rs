/// Convenience result type used across Playcast.
pub type PlaycastResult<T> = Result<T, PlaycastError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Errors never cross the worker boundary as panics; the event loop converts
/// them into explicit response payloads.
#[derive(thiserror::Error, Debug)]
pub enum PlaycastError {
    /// Invalid caller-provided configuration or parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// The rendering engine rejected a program source.
    #[error("compilation failed: {0}")]
    Compile(String),

    /// A frame could not be rendered.
    #[error("render failed: {0}")]
    Render(String),

    /// Encoder or muxer failure during video export.
    #[error("encode error: {0}")]
    Encode(String),

    /// Misuse of the worker or buffer-ownership protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlaycastError {
    /// Build a [`PlaycastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PlaycastError::Compile`] value.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    /// Build a [`PlaycastError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PlaycastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`PlaycastError::Protocol`] value.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
