//! Core domain types and comparison engine for the knowledge-graph
//! similarity explorer.
//!
//! The crate is organized around two cooperating controllers plus a facade:
//!
//! - [`search::SearchController`]: debounced free-text entity search. Rapid
//!   edits within the debounce window coalesce into a single request; an
//!   empty query clears the result list immediately.
//! - [`comparison::ComparisonManager`]: the comparison working set. Owns the
//!   ordered sequence of test nodes and their per-embedding-type similarity
//!   scores, fetches scores asynchronously, and keeps the sequence sorted by
//!   the active sort key as completions arrive out of order.
//! - [`session::Session`]: ties both together with the current subject and
//!   enforces that a qnode lives in at most one of the two collections.
//!
//! Network access is abstracted behind the [`traits::EntitySearcher`] and
//! [`traits::SimilarityScorer`] traits; the `kgsim-client` crate provides
//! the HTTP implementations, and tests run against deterministic stubs.

pub mod comparison;
pub mod config;
pub mod error;
pub mod export;
pub mod search;
pub mod session;
pub mod traits;
pub mod types;

pub use comparison::{ComparisonManager, ComparisonSnapshot};
pub use config::{ApiConfig, ComparisonConfig, Config, LoggingConfig};
pub use error::{SimError, SimResult};
pub use search::{SearchController, SearchSnapshot, SearchStatus};
pub use session::Session;
pub use traits::{EntitySearcher, SimilarityScorer};
pub use types::{default_embedding_types, EmbeddingType, Entity, SimilarityValue, TestNode};
