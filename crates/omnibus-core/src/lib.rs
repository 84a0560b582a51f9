//! Shared configuration, error, and conversation types for the Omnibus
//! Rules chatbot.

pub mod config;
pub mod error;
pub mod types;

pub use config::OmnibusConfig;
pub use error::{OmnibusError, Result};
pub use types::*;
