//! HTTP clients for the similarity explorer's two external services.
//!
//! Both endpoints are consumed as opaque JSON-over-HTTP collaborators:
//!
//! - [`SearchApiClient`]: free-text entity search with n-gram matching.
//! - [`SimilarityApiClient`]: pairwise semantic similarity for one
//!   embedding type at a time.
//!
//! The clients implement the `kgsim-core` trait seams so the engine never
//! sees `reqwest` directly.

mod error;
mod search;
mod similarity;

pub use error::{ClientError, ClientResult};
pub use search::SearchApiClient;
pub use similarity::SimilarityApiClient;
