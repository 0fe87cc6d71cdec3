//! State persistence errors.

use thiserror::Error;

/// State store error types.
#[derive(Debug, Error)]
pub enum StateError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state is present but unusable.
    #[error("Invalid state data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StateError::Serialization("bad field".to_string());
        assert_eq!(err.to_string(), "Serialization error: bad field");

        let err = StateError::InvalidData("index out of range".to_string());
        assert_eq!(err.to_string(), "Invalid state data: index out of range");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StateError = io.into();
        assert!(err.to_string().starts_with("IO error:"));
    }
}
