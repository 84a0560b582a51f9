//! Omnibus API crate - axum HTTP server for the chat page and its JSON API.
//!
//! Serves the embedded chat page at `/`, the conversation endpoints under
//! `/api/messages`, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
