//! Client for the entity search endpoint.
//!
//! The endpoint takes a free-text query plus four fixed parameters
//! (n-gram matching, extended records, result language, item kind) and
//! returns a JSON array of entity records ordered by descending relevance.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use kgsim_core::{ApiConfig, Entity, EntitySearcher, SimError, SimResult};

use crate::error::{ClientError, ClientResult};

/// HTTP client for the entity search endpoint.
pub struct SearchApiClient {
    http: Client,
    config: ApiConfig,
}

impl SearchApiClient {
    /// Create a client with the given endpoint configuration.
    pub fn new(config: ApiConfig) -> ClientResult<Self> {
        if config.search_endpoint.is_empty() {
            return Err(ClientError::Config(
                "search endpoint cannot be empty".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Query parameters for a search request.
    fn query_params(&self, query: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.to_string()),
            ("type", self.config.match_type.clone()),
            ("extra_info", self.config.extra_info.to_string()),
            ("language", self.config.language.clone()),
            ("item", self.config.item.clone()),
        ]
    }

    /// Search entities matching `query`.
    pub async fn search_entities(&self, query: &str) -> ClientResult<Vec<Entity>> {
        debug!(%query, "entity search request");
        let response = self
            .http
            .get(&self.config.search_endpoint)
            .query(&self.query_params(query))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Api(format!(
                "search endpoint returned {}",
                response.status()
            )));
        }

        let results: Vec<Entity> = response.json().await?;
        debug!(count = results.len(), "entity search response");
        Ok(results)
    }
}

#[async_trait]
impl EntitySearcher for SearchApiClient {
    async fn search(&self, query: &str) -> SimResult<Vec<Entity>> {
        self.search_entities(query)
            .await
            .map_err(|e| SimError::Search(e.to_string()))
    }
}
