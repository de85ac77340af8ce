//! Client for the pairwise similarity endpoint.
//!
//! One request scores one (q1, q2) pair under one embedding type. The
//! endpoint answers either `{"similarity": <number>, ...}` or
//! `{"error": <message>}`; a missing score and an explicit error are
//! treated identically as an unavailable cell, and the raw score's
//! absolute value is what gets stored.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use kgsim_core::{ApiConfig, SimError, SimResult, SimilarityScorer, SimilarityValue};

use crate::error::{ClientError, ClientResult};

/// Response body of the similarity endpoint.
#[derive(Debug, Deserialize)]
struct SimilarityResponse {
    similarity: Option<f64>,
    error: Option<String>,
    #[allow(dead_code)]
    q1: Option<String>,
    #[allow(dead_code)]
    q1_label: Option<String>,
    #[allow(dead_code)]
    q2: Option<String>,
    #[allow(dead_code)]
    q2_label: Option<String>,
}

impl SimilarityResponse {
    fn into_value(self) -> SimilarityValue {
        if let Some(error) = self.error {
            debug!(%error, "similarity endpoint reported an error");
            return SimilarityValue::Unavailable;
        }
        match self.similarity {
            Some(raw) => SimilarityValue::from_raw(raw),
            None => SimilarityValue::Unavailable,
        }
    }
}

/// HTTP client for the pairwise similarity endpoint.
pub struct SimilarityApiClient {
    http: Client,
    config: ApiConfig,
}

impl SimilarityApiClient {
    /// Create a client with the given endpoint configuration.
    pub fn new(config: ApiConfig) -> ClientResult<Self> {
        if config.similarity_endpoint.is_empty() {
            return Err(ClientError::Config(
                "similarity endpoint cannot be empty".to_string(),
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

    /// Score one (q1, q2) pair under one embedding type.
    pub async fn pairwise(
        &self,
        q1: &str,
        q2: &str,
        embedding_type: &str,
    ) -> ClientResult<SimilarityValue> {
        debug!(%q1, %q2, %embedding_type, "similarity request");
        let response = self
            .http
            .get(&self.config.similarity_endpoint)
            .query(&[("q1", q1), ("q2", q2), ("embedding_type", embedding_type)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Api(format!(
                "similarity endpoint returned {}",
                response.status()
            )));
        }

        let body: SimilarityResponse = response.json().await?;
        Ok(body.into_value())
    }
}

#[async_trait]
impl SimilarityScorer for SimilarityApiClient {
    async fn score(
        &self,
        q1: &str,
        q2: &str,
        embedding_type: &str,
    ) -> SimResult<SimilarityValue> {
        self.pairwise(q1, q2, embedding_type)
            .await
            .map_err(|e| SimError::Similarity(e.to_string()))
    }
}
