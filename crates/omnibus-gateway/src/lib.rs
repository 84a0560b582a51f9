//! Omnibus Gateway crate - the session to the hosted search and completion
//! services.
//!
//! Provides the `SearchService` and `CompletionService` traits, the
//! `SessionGateway` that implements both over HTTPS, an incremental
//! server-sent-events decoder, and in-memory mocks for tests.

pub mod complete;
pub mod error;
pub mod mock;
pub mod search;
pub mod session;
pub mod sse;

use async_trait::async_trait;

use omnibus_core::types::Passage;

pub use error::GatewayError;
pub use mock::{CompletionCall, MockCompletionService, MockSearchService, SearchCall};
pub use session::SessionGateway;
pub use sse::SseDecoder;

/// Semantic search over the rules corpus.
///
/// Relevance scoring belongs to the service; callers pass no weighting and
/// receive passages in the service's ranking order.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Return up to `limit` passages for `query`, with only `columns` populated.
    async fn search(
        &self,
        query: &str,
        columns: &[&str],
        limit: usize,
    ) -> Result<Vec<Passage>, GatewayError>;
}

/// Text generation from a prompt.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate the full response as one value.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, GatewayError>;

    /// Generate the response as a sequence of fragments, calling
    /// `on_fragment` once per fragment in arrival order.
    async fn complete_stream(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), GatewayError>;
}
