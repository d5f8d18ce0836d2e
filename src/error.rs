//! Error taxonomy for the traversal and overlap core

use thiserror::Error;

/// Result type used throughout the core
pub type EsaResult<T> = Result<T, EsaError>;

/// Errors raised by the index stream, the traversal and the SPM extractor
#[derive(Error, Debug)]
pub enum EsaError {
    /// The suffix/LCP stream violates a suffix-array invariant.
    /// Unrecoverable for the current run.
    #[error("Data integrity error: {message}")]
    DataIntegrity { message: String },

    /// Rejected before any processing begins
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A working set outgrew its configured capacity
    #[error("Resource limit exceeded: {message}")]
    ResourceLimit { message: String },

    /// Malformed input or index file
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EsaError {
    pub fn data_integrity<S: Into<String>>(message: S) -> Self {
        Self::DataIntegrity {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn resource_limit<S: Into<String>>(message: S) -> Self {
        Self::ResourceLimit {
            message: message.into(),
        }
    }

    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Whether this error means the input itself is corrupt
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::DataIntegrity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EsaError::data_integrity("suffix 3 repeated");
        assert_eq!(err.to_string(), "Data integrity error: suffix 3 repeated");
        assert!(err.is_data_integrity());

        let err = EsaError::config("minimum length must be positive");
        assert!(err.to_string().starts_with("Configuration error"));
        assert!(!err.is_data_integrity());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: EsaError = io.into();
        assert!(matches!(err, EsaError::Io(_)));
    }
}
