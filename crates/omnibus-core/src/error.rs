use thiserror::Error;

/// Top-level error type for the Omnibus chatbot.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for OmnibusError` so that the `?` operator works
/// across crate boundaries in the composition root.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OmnibusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for OmnibusError {
    fn from(err: toml::de::Error) -> Self {
        OmnibusError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OmnibusError {
    fn from(err: toml::ser::Error) -> Self {
        OmnibusError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OmnibusError {
    fn from(err: serde_json::Error) -> Self {
        OmnibusError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Omnibus operations.
pub type Result<T> = std::result::Result<T, OmnibusError>;
