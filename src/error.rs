//! Error types and handling for mqperf

/// Result type alias for mqperf operations
pub type Result<T> = std::result::Result<T, MqError>;

/// Error types for the shared-memory queue and measurement harness
#[derive(Debug, thiserror::Error)]
pub enum MqError {
    /// I/O related errors (shm object operations, mmap, etc.)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Shared-memory allocation, resize, or mapping failure
    #[error("Resource error: {message}")]
    Resource { message: String },

    /// Supplied buffer length differs from the agreed element size
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Enqueue found the ring full
    #[error("Queue full: {capacity} elements")]
    QueueFull { capacity: usize },

    /// Non-blocking dequeue found the ring empty
    #[error("Queue empty")]
    QueueEmpty,

    /// Blocking dequeue's wait was satisfied but the cursors disagree
    #[error("Spurious empty: wait satisfied but no element available")]
    SpuriousEmpty,

    /// Named queue does not exist in the OS namespace
    #[error("Queue not found: {name}")]
    QueueNotFound { name: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Platform-specific errors (pthread and syscall failures)
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl MqError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a resource error
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
        }
    }

    /// Create a length mismatch error
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create a queue full error
    pub fn queue_full(capacity: usize) -> Self {
        Self::QueueFull { capacity }
    }

    /// Create a queue not found error
    pub fn queue_not_found(name: impl Into<String>) -> Self {
        Self::QueueNotFound { name: name.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for MqError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<nix::Error> for MqError {
    fn from(err: nix::Error) -> Self {
        Self::platform(format!("System call failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MqError::resource("Out of shared memory");
        assert!(matches!(err, MqError::Resource { .. }));

        let err = MqError::queue_not_found("test_queue");
        assert!(matches!(err, MqError::QueueNotFound { .. }));

        let err = MqError::length_mismatch(268, 12);
        assert!(matches!(
            err,
            MqError::LengthMismatch {
                expected: 268,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = MqError::length_mismatch(64, 32);
        let display = format!("{}", err);
        assert!(display.contains("expected 64"));
        assert!(display.contains("got 32"));

        let err = MqError::queue_full(100);
        assert!(format!("{}", err).contains("100"));
    }
}
