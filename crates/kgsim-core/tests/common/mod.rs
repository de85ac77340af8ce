//! Deterministic stub backends shared by the integration tests.
//!
//! Both stubs record their invocations (with virtual-clock timestamps for
//! the scorer) so tests can assert on debounce and stagger timing under
//! `#[tokio::test(start_paused = true)]`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use kgsim_core::{Entity, EntitySearcher, SimError, SimResult, SimilarityScorer, SimilarityValue};

pub fn entity(qnode: &str) -> Entity {
    Entity {
        qnode: qnode.to_string(),
        label: vec![format!("{} label", qnode)],
        description: vec![format!("{} description", qnode)],
        alias: vec![],
        pagerank: 0.001,
        statements: 10,
        score: 5.0,
    }
}

// ============================================================================
// StubSearcher
// ============================================================================

#[derive(Default)]
pub struct StubSearcher {
    calls: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, Vec<Entity>>>,
    delay_ms: AtomicU64,
    fail: AtomicBool,
}

impl StubSearcher {
    pub fn set_results(&self, query: &str, results: Vec<Entity>) {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), results);
    }

    /// Make every subsequent request take this long (virtual time).
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::Relaxed);
    }

    /// Make every subsequent request fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitySearcher for StubSearcher {
    async fn search(&self, query: &str) -> SimResult<Vec<Entity>> {
        self.calls.lock().unwrap().push(query.to_string());
        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::Relaxed) {
            return Err(SimError::Search("stub searcher failure".to_string()));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// StubScorer
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScoreCall {
    pub q1: String,
    pub q2: String,
    pub embedding_type: String,
    /// Milliseconds since scorer creation, on the (paused) tokio clock.
    pub at_ms: u64,
}

pub struct StubScorer {
    calls: Mutex<Vec<ScoreCall>>,
    scores: Mutex<HashMap<(String, String, String), f64>>,
    fail_pairs: Mutex<HashSet<(String, String, String)>>,
    delay_ms: AtomicU64,
    started: tokio::time::Instant,
}

impl StubScorer {
    /// Create inside a tokio runtime (captures the virtual clock origin).
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scores: Mutex::new(HashMap::new()),
            fail_pairs: Mutex::new(HashSet::new()),
            delay_ms: AtomicU64::new(0),
            started: tokio::time::Instant::now(),
        }
    }

    /// Register the raw score the endpoint reports for a triple.
    pub fn set_score(&self, q1: &str, q2: &str, embedding_type: &str, raw: f64) {
        self.scores.lock().unwrap().insert(
            (
                q1.to_string(),
                q2.to_string(),
                embedding_type.to_string(),
            ),
            raw,
        );
    }

    /// Make requests for a triple fail at the transport level.
    pub fn set_fail(&self, q1: &str, q2: &str, embedding_type: &str) {
        self.fail_pairs.lock().unwrap().insert((
            q1.to_string(),
            q2.to_string(),
            embedding_type.to_string(),
        ));
    }

    /// Make every subsequent request take this long (virtual time).
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<ScoreCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityScorer for StubScorer {
    async fn score(
        &self,
        q1: &str,
        q2: &str,
        embedding_type: &str,
    ) -> SimResult<SimilarityValue> {
        self.calls.lock().unwrap().push(ScoreCall {
            q1: q1.to_string(),
            q2: q2.to_string(),
            embedding_type: embedding_type.to_string(),
            at_ms: self.started.elapsed().as_millis() as u64,
        });

        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let key = (
            q1.to_string(),
            q2.to_string(),
            embedding_type.to_string(),
        );
        if self.fail_pairs.lock().unwrap().contains(&key) {
            return Err(SimError::Similarity("stub scorer failure".to_string()));
        }
        Ok(match self.scores.lock().unwrap().get(&key) {
            Some(raw) => SimilarityValue::from_raw(*raw),
            None => SimilarityValue::Unavailable,
        })
    }
}

/// Let every runnable task (command handling, zero-delay fetches) settle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
