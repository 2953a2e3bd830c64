//! Error types for infrared pulse-train encoding and decoding

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error types encountered while building or decoding pulse trains
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A time token or bit-group source could not be parsed
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Append attempted on a frame that has already been terminated
    #[error("Frame closed: {0}")]
    FrameClosed(String),

    /// A repeat frame was requested but the protocol defines no repeat headers
    #[error("No repeat configured: {0}")]
    NoRepeatConfigured(String),

    /// Classification found no qualifying protocol family
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// Decoding for this protocol family is not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl CodecError {
    /// Create a new MalformedInput error
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        CodecError::MalformedInput(msg.into())
    }

    /// Create a new FrameClosed error
    pub fn frame_closed(msg: impl Into<String>) -> Self {
        CodecError::FrameClosed(msg.into())
    }

    /// Create a new NoRepeatConfigured error
    pub fn no_repeat_configured(msg: impl Into<String>) -> Self {
        CodecError::NoRepeatConfigured(msg.into())
    }

    /// Create a new UnknownProtocol error
    pub fn unknown_protocol(msg: impl Into<String>) -> Self {
        CodecError::UnknownProtocol(msg.into())
    }

    /// Create a new NotImplemented error
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        CodecError::NotImplemented(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::malformed_input("bad token");
        assert!(err.to_string().contains("Malformed input"));

        let err = CodecError::frame_closed("already terminated");
        assert!(err.to_string().contains("Frame closed"));
    }
}
