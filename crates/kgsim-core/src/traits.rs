//! Async trait seams between the comparison engine and the network layer.
//!
//! The `kgsim-client` crate provides the HTTP implementations; tests inject
//! deterministic stubs.

use async_trait::async_trait;

use crate::error::SimResult;
use crate::types::{Entity, SimilarityValue};

/// Free-text entity search.
#[async_trait]
pub trait EntitySearcher: Send + Sync {
    /// Search entities matching `query`, ordered by descending relevance.
    async fn search(&self, query: &str) -> SimResult<Vec<Entity>>;
}

/// Pairwise semantic-similarity scoring.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Score the pair (`q1`, `q2`) under one embedding type.
    ///
    /// Implementations return `Ok(SimilarityValue::Unavailable)` when the
    /// endpoint answers but has no score for the pair, and `Err` only for
    /// transport-level failures. Either way the caller records the cell as
    /// unavailable; the distinction exists for logging.
    async fn score(&self, q1: &str, q2: &str, embedding_type: &str)
        -> SimResult<SimilarityValue>;
}
