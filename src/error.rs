use thiserror::Error;

/// Coarse error taxonomy callers branch on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Storage unreachable, object missing, or data file unreadable.
    Io,
    /// Invalid argument or degenerate input.
    Value,
    /// Stored model artifact could not be decoded.
    Deserialization,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("object `{key}` not found")]
    NotFound { key: String },

    #[error("storage error on `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset `{location}`: {reason}")]
    MalformedData { location: String, reason: String },

    #[error("{0}")]
    Value(String),

    #[error("corrupt model artifact `{key}`: {reason}")]
    Deserialization { key: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::Io { .. } | Self::MalformedData { .. } => ErrorKind::Io,
            Self::Value(_) | Self::Config(_) => ErrorKind::Value,
            Self::Deserialization { .. } => ErrorKind::Deserialization,
        }
    }

    pub(crate) fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }

    pub(crate) fn malformed(location: &str, reason: impl Into<String>) -> Self {
        Self::MalformedData {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    /// Map an I/O failure on `key`, folding `NotFound` into its own variant.
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                key: key.to_string(),
            }
        } else {
            Self::Io {
                key: key.to_string(),
                source,
            }
        }
    }
}
