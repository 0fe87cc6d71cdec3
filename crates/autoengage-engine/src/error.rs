//! Error types for the engine.

use thiserror::Error;

use autoengage_state::StateError;

/// Errors that can occur in the engine or its handle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// State persistence failed.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// The engine task is gone; no more events can be delivered.
    #[error("Engine channel closed")]
    ChannelClosed,

    /// A reply was requested but the engine dropped the request.
    #[error("Engine dropped the request")]
    ReplyDropped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(EngineError::ChannelClosed.to_string(), "Engine channel closed");
        assert_eq!(
            EngineError::ReplyDropped.to_string(),
            "Engine dropped the request"
        );
    }

    #[test]
    fn test_state_error_conversion() {
        let err: EngineError = StateError::Serialization("oops".to_string()).into();
        assert_eq!(err.to_string(), "State error: Serialization error: oops");
    }
}
