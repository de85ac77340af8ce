//! Session: the facade tying subject, search, and comparison together.
//!
//! The session owns both controllers and routes entities between them so
//! that a qnode lives in at most one of {search results, working set} at a
//! time: selecting a result moves it into the working set, removing a test
//! node puts its entity back at the head of the result list.

use std::sync::Arc;

use tokio::sync::watch;

use crate::comparison::{ComparisonManager, ComparisonSnapshot};
use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::export::{render_csv, suggested_filename, CsvExport};
use crate::search::{SearchController, SearchSnapshot};
use crate::traits::{EntitySearcher, SimilarityScorer};
use crate::types::{EmbeddingType, Entity};

/// A live exploration session.
pub struct Session {
    search: SearchController,
    comparison: ComparisonManager,
    embedding_types: Vec<EmbeddingType>,
}

impl Session {
    /// Start a session with the given backends.
    pub fn new(
        searcher: Arc<dyn EntitySearcher>,
        scorer: Arc<dyn SimilarityScorer>,
        config: &Config,
    ) -> Self {
        Self {
            search: SearchController::spawn(searcher, &config.comparison),
            comparison: ComparisonManager::spawn(
                scorer,
                config.embedding_types.clone(),
                &config.comparison,
            ),
            embedding_types: config.embedding_types.clone(),
        }
    }

    /// The configured embedding types, in display order.
    pub fn embedding_types(&self) -> &[EmbeddingType] {
        &self.embedding_types
    }

    // ------------------------------------------------------------------
    // Search stage
    // ------------------------------------------------------------------

    /// Record a query edit (debounced).
    pub async fn set_query(&self, text: &str) -> SimResult<()> {
        self.search.set_query(text).await
    }

    /// Dispatch the current query immediately.
    pub async fn submit_query(&self) -> SimResult<()> {
        self.search.submit().await
    }

    /// Current search state.
    pub fn search_snapshot(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    /// Watch search state publications.
    pub fn search_updates(&self) -> watch::Receiver<SearchSnapshot> {
        self.search.subscribe()
    }

    // ------------------------------------------------------------------
    // Subject stage
    // ------------------------------------------------------------------

    /// Select a search result as the new subject.
    ///
    /// The result list is cleared (the search stage restarts for test-node
    /// selection) and every existing score is invalidated and refetched
    /// against the new subject.
    pub async fn select_subject(&self, qnode: &str) -> SimResult<Entity> {
        let entity = self
            .search
            .take(qnode)
            .await?
            .ok_or_else(|| SimError::EntityNotFound {
                qnode: qnode.to_string(),
            })?;
        self.search.set_query("").await?;
        self.comparison.set_subject(Some(entity.clone())).await?;
        Ok(entity)
    }

    /// Set the subject directly from an already known entity.
    pub async fn set_subject(&self, entity: Entity) -> SimResult<()> {
        self.comparison.set_subject(Some(entity)).await
    }

    /// Drop the subject. Test-node membership is kept; scores are cleared.
    pub async fn clear_subject(&self) -> SimResult<()> {
        self.comparison.set_subject(None).await
    }

    // ------------------------------------------------------------------
    // Comparison stage
    // ------------------------------------------------------------------

    /// Move a search result into the comparison working set.
    pub async fn add_test_node(&self, qnode: &str) -> SimResult<()> {
        let entity = self
            .search
            .take(qnode)
            .await?
            .ok_or_else(|| SimError::EntityNotFound {
                qnode: qnode.to_string(),
            })?;
        self.comparison.add(entity).await
    }

    /// Add an already known entity to the working set directly.
    pub async fn add_entity(&self, entity: Entity) -> SimResult<()> {
        self.comparison.add(entity).await
    }

    /// Remove a test node, returning its entity to the head of the search
    /// results.
    pub async fn remove_test_node(&self, qnode: &str) -> SimResult<()> {
        let entity =
            self.comparison
                .remove(qnode)
                .await?
                .ok_or_else(|| SimError::EntityNotFound {
                    qnode: qnode.to_string(),
                })?;
        self.search.restore_front(entity).await
    }

    /// Change the embedding type ordering the working set.
    pub async fn set_sort_key(&self, sort_key: &str) -> SimResult<()> {
        if !self.embedding_types.iter().any(|t| t.value == sort_key) {
            return Err(SimError::Validation {
                field: "sort_key".to_string(),
                message: format!("unknown embedding type: {}", sort_key),
            });
        }
        self.comparison.set_sort_key(sort_key).await
    }

    /// Current comparison state.
    pub fn comparison_snapshot(&self) -> ComparisonSnapshot {
        self.comparison.snapshot()
    }

    /// Watch comparison state publications.
    pub fn comparison_updates(&self) -> watch::Receiver<ComparisonSnapshot> {
        self.comparison.subscribe()
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Render the current comparison as a CSV payload.
    pub fn export_csv(&self) -> SimResult<CsvExport> {
        let snapshot = self.comparison.snapshot();
        let subject = snapshot
            .subject
            .as_ref()
            .ok_or_else(|| SimError::Export("no subject selected".to_string()))?;
        Ok(CsvExport {
            filename: suggested_filename(subject),
            content: render_csv(subject, &snapshot.nodes, &self.embedding_types),
        })
    }

    /// Graceful shutdown of both controllers.
    pub async fn shutdown(&mut self) {
        self.search.shutdown().await;
        self.comparison.shutdown().await;
    }
}
