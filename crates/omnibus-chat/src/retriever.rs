//! Passage retrieval from the search service.

use std::sync::Arc;

use omnibus_core::types::Passage;
use omnibus_gateway::SearchService;

use crate::error::ChatError;

/// Columns requested for every search.
pub const PASSAGE_COLUMNS: [&str; 4] = ["CHUNK", "LANGUAGE", "RELATIVE_PATH", "FILE_URL"];

/// Maximum passages per search.
pub const RESULT_LIMIT: usize = 10;

pub struct Retriever {
    search: Arc<dyn SearchService>,
}

impl Retriever {
    pub fn new(search: Arc<dyn SearchService>) -> Self {
        Self { search }
    }

    /// Search for `query`. Results come back in service order, unmodified;
    /// an empty list is not an error.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, ChatError> {
        self.search
            .search(query, &PASSAGE_COLUMNS, RESULT_LIMIT)
            .await
            .map_err(ChatError::Retrieval)
    }
}
