//! Error types for trace context propagation.

use crate::jaeger::ParseSpanContextError;
use thiserror::Error;

/// A specialised Result type for propagation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while injecting or extracting trace context.
///
/// An absent span context or an event without records is never an error;
/// those paths return `Ok(())` or `Ok(None)`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// The Lambda invocation type does not deliver the client context to the callee.
    #[error("unsupported invocation type: {0}")]
    UnsupportedInvocationType(String),

    /// The span context is not a [`JaegerSpanContext`](crate::jaeger::JaegerSpanContext).
    #[error("span context implementation not supported")]
    UnsupportedSpanContext,

    /// The encoded client context exceeds the transport limit.
    #[error("span baggage data too large: {encoded_len} bytes exceeds limit of {limit}")]
    TooMuchBaggage {
        /// Length of the encoded client context.
        encoded_len: usize,
        /// Maximum permitted encoded length.
        limit: usize,
    },

    /// A serialised span context could not be parsed.
    #[error(transparent)]
    ParseSpanContext(#[from] ParseSpanContextError),

    /// Client context JSON could not be produced or read.
    #[error("invalid client context json")]
    Json(#[from] serde_json::Error),

    /// Client context blob is not valid base64.
    #[cfg(feature = "lambda")]
    #[error("invalid client context encoding")]
    Base64(#[from] base64::DecodeError),

    /// A transport SDK refused to build a message attribute.
    #[error("failed to build message attribute")]
    Attribute(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error.
    #[error("configuration error")]
    Config(#[source] Box<figment::Error>),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_much_baggage_message() {
        let err = Error::TooMuchBaggage {
            encoded_len: 4000,
            limit: 3583,
        };
        assert_eq!(
            err.to_string(),
            "span baggage data too large: 4000 bytes exceeds limit of 3583"
        );
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err = Error::from(ParseSpanContextError::Empty);
        assert_eq!(err.to_string(), ParseSpanContextError::Empty.to_string());
    }
}
