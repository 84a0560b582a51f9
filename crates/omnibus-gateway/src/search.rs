//! Semantic search over the rules corpus.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use omnibus_core::types::Passage;

use crate::error::GatewayError;
use crate::session::SessionGateway;
use crate::SearchService;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Passage>,
}

impl SessionGateway {
    fn search_url(&self) -> String {
        let search = self.search_config();
        format!(
            "{}/api/v2/databases/{}/schemas/{}/cortex-search-services/{}:query",
            self.base_url(),
            search.database,
            search.schema,
            search.service
        )
    }
}

#[async_trait]
impl SearchService for SessionGateway {
    async fn search(
        &self,
        query: &str,
        columns: &[&str],
        limit: usize,
    ) -> Result<Vec<Passage>, GatewayError> {
        let credential = self.credential().await?;
        let body = json!({
            "query": query,
            "columns": columns,
            "limit": limit,
        });

        let response = self
            .request(&self.search_url(), &credential)
            .json(&body)
            .send()
            .await?;
        let response = self.checked(response).await?;
        let payload: SearchResponse = response.json().await?;

        tracing::debug!(
            service = %self.search_config().service,
            results = payload.results.len(),
            "Search completed"
        );
        Ok(payload.results)
    }
}
