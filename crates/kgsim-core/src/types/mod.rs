//! Domain types: entities, test nodes, similarity values, embedding types.
//!
//! [`Entity`] matches the JSON records produced by the entity search
//! endpoint. [`TestNode`] augments an entity with the per-embedding-type
//! similarity scores fetched for it. [`SimilarityValue`] is the state of a
//! single (node, embedding type) cell: a finite non-negative score, or an
//! explicit "unavailable" sentinel once a fetch attempt has failed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder rendered for a cell with no usable score.
pub const UNAVAILABLE_PLACEHOLDER: &str = "--";

/// A knowledge-graph entity as returned by the search endpoint.
///
/// Immutable once fetched; the mutable similarity state lives on
/// [`TestNode`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique knowledge-graph identifier (e.g. `Q42`).
    pub qnode: String,
    /// Labels, best first. May be empty.
    #[serde(default)]
    pub label: Vec<String>,
    /// Descriptions, best first. May be empty.
    #[serde(default)]
    pub description: Vec<String>,
    /// Alternative names.
    #[serde(default)]
    pub alias: Vec<String>,
    /// Graph pagerank of the entity.
    #[serde(default)]
    pub pagerank: f64,
    /// Number of statements attached to the entity.
    #[serde(default)]
    pub statements: u64,
    /// Search relevance score; the endpoint orders results by it descending.
    #[serde(default)]
    pub score: f64,
}

impl Entity {
    /// `"<label> (<qnode>)"`, falling back to the bare qnode when the
    /// entity has no label.
    pub fn primary_label(&self) -> String {
        match self.label.first() {
            Some(label) if !label.is_empty() => format!("{} ({})", label, self.qnode),
            _ => self.qnode.clone(),
        }
    }

    /// First description, or `"No Description"`.
    pub fn display_description(&self) -> &str {
        self.description
            .first()
            .filter(|d| !d.is_empty())
            .map(String::as_str)
            .unwrap_or("No Description")
    }

    /// Aliases joined with `", "`, or `None` when the entity has none.
    pub fn alias_line(&self) -> Option<String> {
        if self.alias.is_empty() {
            None
        } else {
            Some(self.alias.join(", "))
        }
    }

    /// Public browser page for this entity.
    pub fn browser_url(&self) -> String {
        format!("https://kgtk.isi.edu/browser/{}", self.qnode)
    }
}

/// State of a single similarity cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimilarityValue {
    /// A finite, non-negative similarity score.
    Score(f64),
    /// The endpoint reported an error or no score for this pair.
    Unavailable,
}

impl SimilarityValue {
    /// Build a cell value from the endpoint's raw (possibly signed) score.
    ///
    /// Stores the absolute value; a non-finite score maps to
    /// [`SimilarityValue::Unavailable`].
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_finite() {
            SimilarityValue::Score(raw.abs())
        } else {
            SimilarityValue::Unavailable
        }
    }

    /// Whether a usable score is present.
    pub fn is_available(&self) -> bool {
        matches!(self, SimilarityValue::Score(_))
    }

    /// Value used for descending ordering; unavailable sorts as minimal.
    pub fn sort_value(&self) -> f64 {
        match self {
            SimilarityValue::Score(s) => *s,
            SimilarityValue::Unavailable => f64::NEG_INFINITY,
        }
    }
}

impl fmt::Display for SimilarityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityValue::Score(s) => write!(f, "{}", s),
            SimilarityValue::Unavailable => f.write_str(UNAVAILABLE_PLACEHOLDER),
        }
    }
}

/// An entity selected into the comparison working set, together with its
/// similarity scores keyed by embedding-type value.
#[derive(Debug, Clone, PartialEq)]
pub struct TestNode {
    /// The underlying entity, unchanged from the search response.
    pub entity: Entity,
    /// Per-embedding-type similarity against the current subject.
    ///
    /// A key is absent until a fetch for that type has been attempted;
    /// after an attempt it is always set, either to a score or to
    /// [`SimilarityValue::Unavailable`].
    pub similarity: HashMap<String, SimilarityValue>,
}

impl TestNode {
    /// Wrap an entity with an empty similarity map.
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            similarity: HashMap::new(),
        }
    }

    /// The node's qnode.
    pub fn qnode(&self) -> &str {
        &self.entity.qnode
    }

    /// The cell for an embedding type, if a fetch has been attempted.
    pub fn cell(&self, embedding_type: &str) -> Option<&SimilarityValue> {
        self.similarity.get(embedding_type)
    }

    /// Ordering value for a sort key; a missing cell sorts as minimal.
    pub fn sort_value(&self, sort_key: &str) -> f64 {
        self.similarity
            .get(sort_key)
            .map(SimilarityValue::sort_value)
            .unwrap_or(f64::NEG_INFINITY)
    }
}

/// A named similarity-scoring method the similarity endpoint can compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingType {
    /// Human-readable name, used as the CSV column header (e.g. `ComplEx`).
    pub label: String,
    /// Wire value passed as `embedding_type` (e.g. `complex`).
    pub value: String,
}

impl EmbeddingType {
    /// Construct an embedding type from label and wire value.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The stock embedding-type table. The first entry is the default sort key.
pub fn default_embedding_types() -> Vec<EmbeddingType> {
    vec![
        EmbeddingType::new("ComplEx", "complex"),
        EmbeddingType::new("TransE", "transe"),
        EmbeddingType::new("Text", "text"),
    ]
}
