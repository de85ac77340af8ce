//! CLI command handlers
//!
//! # Modules
//!
//! - `search`: free-text entity search
//! - `compare`: subject-vs-candidates similarity comparison and CSV export

pub mod compare;
pub mod search;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use kgsim_client::{SearchApiClient, SimilarityApiClient};
use kgsim_core::{Config, Entity, SimError, SimResult, Session};

/// Load configuration from an explicit file, or the layered defaults
/// (`config/default.toml`, `config/{KGSIM_ENV}.toml`, `KGSIM__*` env vars).
pub(crate) fn load_config(path: Option<&Path>) -> SimResult<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
}

/// Build a session backed by the HTTP clients.
pub(crate) fn build_session(config: &Config) -> SimResult<Session> {
    let searcher =
        SearchApiClient::new(config.api.clone()).map_err(|e| SimError::Config(e.to_string()))?;
    let scorer = SimilarityApiClient::new(config.api.clone())
        .map_err(|e| SimError::Config(e.to_string()))?;
    Ok(Session::new(Arc::new(searcher), Arc::new(scorer), config))
}

/// Resolve a qnode to its full entity record via the search endpoint.
///
/// Falls back to a bare record when the lookup fails or the qnode is not
/// among the matches; the similarity endpoint only needs the identifier.
pub(crate) async fn resolve_entity(lookup: &SearchApiClient, qnode: &str) -> Entity {
    match lookup.search_entities(qnode).await {
        Ok(results) => results
            .into_iter()
            .find(|e| e.qnode == qnode)
            .unwrap_or_else(|| bare_entity(qnode)),
        Err(error) => {
            debug!(%qnode, %error, "entity lookup failed, continuing with bare record");
            bare_entity(qnode)
        }
    }
}

fn bare_entity(qnode: &str) -> Entity {
    Entity {
        qnode: qnode.to_string(),
        label: vec![],
        description: vec![],
        alias: vec![],
        pagerank: 0.0,
        statements: 0,
        score: 0.0,
    }
}
