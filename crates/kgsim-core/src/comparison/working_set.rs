//! The ordered comparison working set.
//!
//! Pure data structure, no I/O: membership unique by qnode, display order
//! maintained descending by the active sort key. Score updates follow a
//! filter-out / append / re-sort discipline so that every published
//! sequence is freshly built and concurrent completions merge the same way
//! regardless of arrival order.

use std::cmp::Ordering;

use crate::types::{Entity, SimilarityValue, TestNode};

/// Ordered set of test nodes, unique by qnode.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    nodes: Vec<TestNode>,
    sort_key: String,
}

impl WorkingSet {
    /// Create an empty working set ordered by `sort_key`.
    pub fn new(sort_key: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            sort_key: sort_key.into(),
        }
    }

    /// Number of test nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a qnode is a member.
    pub fn contains(&self, qnode: &str) -> bool {
        self.nodes.iter().any(|n| n.qnode() == qnode)
    }

    /// Nodes in display order.
    pub fn nodes(&self) -> &[TestNode] {
        &self.nodes
    }

    /// The active sort key (an embedding-type value).
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    /// Add an entity as a fresh test node with no scores.
    ///
    /// Returns `false` without touching the set when the qnode is already
    /// a member, making repeated adds idempotent.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(&entity.qnode) {
            return false;
        }
        self.nodes.push(TestNode::new(entity));
        self.resort();
        true
    }

    /// Remove a node, returning its entity for re-insertion into the
    /// search-result list.
    pub fn remove(&mut self, qnode: &str) -> Option<Entity> {
        let position = self.nodes.iter().position(|n| n.qnode() == qnode)?;
        Some(self.nodes.remove(position).entity)
    }

    /// Record the outcome of one (node, embedding type) fetch.
    ///
    /// The node is filtered out of the sequence, updated, appended, and the
    /// sequence re-sorted. Returns `false` when the qnode is no longer a
    /// member (the completion is dropped).
    pub fn apply_score(
        &mut self,
        qnode: &str,
        embedding_type: &str,
        value: SimilarityValue,
    ) -> bool {
        let position = match self.nodes.iter().position(|n| n.qnode() == qnode) {
            Some(position) => position,
            None => return false,
        };
        let mut node = self.nodes.remove(position);
        node.similarity.insert(embedding_type.to_string(), value);
        self.nodes.push(node);
        self.resort();
        true
    }

    /// Drop every score while keeping membership, as when the subject
    /// changes and all cells await recomputation.
    pub fn clear_scores(&mut self) {
        for node in &mut self.nodes {
            node.similarity.clear();
        }
    }

    /// Change the active sort key and re-order immediately.
    pub fn set_sort_key(&mut self, sort_key: impl Into<String>) {
        self.sort_key = sort_key.into();
        self.resort();
    }

    /// A freshly allocated copy of the sequence, for publication.
    pub fn snapshot(&self) -> Vec<TestNode> {
        self.nodes.clone()
    }

    fn resort(&mut self) {
        // Stable sort: ties and score-less nodes keep their relative order.
        self.nodes.sort_by(|a, b| {
            b.sort_value(&self.sort_key)
                .partial_cmp(&a.sort_value(&self.sort_key))
                .unwrap_or(Ordering::Equal)
        });
    }
}
