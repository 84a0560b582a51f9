//! Error types for the chat pipeline.

use omnibus_core::error::OmnibusError;
use omnibus_gateway::GatewayError;

use crate::state::ChatState;

/// Errors from a single chat turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("query reformulation failed: {0}")]
    Reformulation(#[source] GatewayError),
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] GatewayError),
    #[error("answer generation failed: {0}")]
    Generation(#[source] GatewayError),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidState { from: ChatState, to: ChatState },
}

impl ChatError {
    /// Whether the error came from the remote services rather than the input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ChatError::Reformulation(_) | ChatError::Retrieval(_) | ChatError::Generation(_)
        )
    }
}

impl From<ChatError> for OmnibusError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Reformulation(_) | ChatError::Generation(_) => {
                OmnibusError::Completion(err.to_string())
            }
            ChatError::Retrieval(_) => OmnibusError::Search(err.to_string()),
            other => OmnibusError::Chat(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );

        let err = ChatError::Retrieval(GatewayError::Http("connection refused".to_string()));
        assert_eq!(
            err.to_string(),
            "retrieval failed: request failed: connection refused"
        );

        let err = ChatError::InvalidState {
            from: ChatState::Processing,
            to: ChatState::Processing,
        };
        assert_eq!(
            err.to_string(),
            "invalid state transition: Processing -> Processing"
        );
    }

    #[test]
    fn test_chat_error_keeps_gateway_source() {
        let err = ChatError::Generation(GatewayError::Timeout);
        let source = err.source().expect("generation error has a source");
        assert_eq!(source.to_string(), "request timed out");
    }

    #[test]
    fn test_is_upstream() {
        assert!(ChatError::Reformulation(GatewayError::Timeout).is_upstream());
        assert!(ChatError::Retrieval(GatewayError::Timeout).is_upstream());
        assert!(ChatError::Generation(GatewayError::Timeout).is_upstream());
        assert!(!ChatError::EmptyMessage.is_upstream());
        assert!(!ChatError::MessageTooLong(1).is_upstream());
    }

    #[test]
    fn test_chat_error_into_omnibus_error() {
        let err: OmnibusError = ChatError::Retrieval(GatewayError::Timeout).into();
        assert!(matches!(err, OmnibusError::Search(_)));

        let err: OmnibusError = ChatError::Generation(GatewayError::Timeout).into();
        assert!(matches!(err, OmnibusError::Completion(_)));

        let err: OmnibusError = ChatError::EmptyMessage.into();
        assert!(matches!(err, OmnibusError::Chat(_)));
        assert!(err.to_string().contains("message cannot be empty"));
    }
}
