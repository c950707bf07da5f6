/// Convenience result type used across reelbrand.
pub type BrandResult<T> = Result<T, BrandError>;

/// Error taxonomy for branding jobs.
///
/// Every error that reaches the caller of a job is terminal for that job.
#[derive(thiserror::Error, Debug)]
pub enum BrandError {
    /// Invalid configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// The source cannot be processed (no decodable video, degenerate dimensions).
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A platform resource could not be acquired (drawing surface, recorder, fonts).
    #[error("resource error: {0}")]
    Resource(String),

    /// The media source reported a playback or decode failure.
    #[error("media error: {message}")]
    Media {
        /// Platform error code, when the source reports one.
        code: Option<i32>,
        /// Human-readable failure description.
        message: String,
    },

    /// Encoding or muxing failed after the recorder was started.
    #[error("encode error: {0}")]
    Encode(String),

    /// Config (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrandError {
    /// Build a [`BrandError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BrandError::UnsupportedInput`].
    pub fn unsupported_input(msg: impl Into<String>) -> Self {
        Self::UnsupportedInput(msg.into())
    }

    /// Build a [`BrandError::Resource`].
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`BrandError::Media`], formatting the message as `Code {code}: {message}` when a
    /// code is present.
    pub fn media(code: Option<i32>, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let message = match code {
            Some(c) => format!("Code {c}: {msg}"),
            None => msg,
        };
        Self::Media { code, message }
    }

    /// Build a [`BrandError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`BrandError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
