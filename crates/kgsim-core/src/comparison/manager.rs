//! ComparisonManager: actor that owns the comparison working set.
//!
//! All mutation flows through a command channel to a single worker task, so
//! concurrent fetch completions are serialized without locks. Each
//! (node, embedding type) fetch runs as its own spawned task and reports
//! back as a command; the worker applies it, re-sorts, and publishes a
//! fresh snapshot through a watch channel.
//!
//! # Staleness
//!
//! Every subject change bumps an epoch counter. In-flight fetches are never
//! aborted; instead a completion carrying a superseded epoch, or naming a
//! qnode that has since left the set, is dropped on arrival.
//!
//! # Lifecycle
//!
//! 1. Create with [`ComparisonManager::spawn`] - starts the worker task
//! 2. Mutate via `add` / `remove` / `set_subject` / `set_sort_key`
//! 3. Observe via [`ComparisonManager::subscribe`]
//! 4. Shutdown with [`ComparisonManager::shutdown`]; dropping aborts the worker

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ComparisonConfig;
use crate::error::{SimError, SimResult};
use crate::traits::SimilarityScorer;
use crate::types::{EmbeddingType, Entity, SimilarityValue, TestNode};

use super::working_set::WorkingSet;

/// Published view of the comparison state.
///
/// Every publication carries a freshly built node sequence; consumers never
/// observe in-place mutation.
#[derive(Debug, Clone, Default)]
pub struct ComparisonSnapshot {
    /// The entity all scores are relative to.
    pub subject: Option<Entity>,
    /// Test nodes in display order (descending by `sort_key`).
    pub nodes: Vec<TestNode>,
    /// The embedding-type value currently ordering the sequence.
    pub sort_key: String,
}

impl ComparisonSnapshot {
    /// Whether every node has a cell for every configured embedding type.
    pub fn is_complete(&self, embedding_types: &[EmbeddingType]) -> bool {
        self.nodes.iter().all(|node| {
            embedding_types
                .iter()
                .all(|t| node.similarity.contains_key(&t.value))
        })
    }
}

enum Command {
    Add(Entity),
    Remove {
        qnode: String,
        reply: oneshot::Sender<Option<Entity>>,
    },
    SetSubject(Option<Entity>),
    SetSortKey(String),
    Completion {
        epoch: u64,
        qnode: String,
        embedding_type: String,
        value: SimilarityValue,
    },
}

/// Handle to the comparison worker task.
pub struct ComparisonManager {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<ComparisonSnapshot>,
    worker_handle: Option<JoinHandle<()>>,
    shutdown_notify: Arc<Notify>,
}

impl ComparisonManager {
    /// Start the worker task and return its handle.
    ///
    /// The sort key defaults to the first configured embedding type.
    pub fn spawn(
        scorer: Arc<dyn SimilarityScorer>,
        embedding_types: Vec<EmbeddingType>,
        config: &ComparisonConfig,
    ) -> Self {
        let sort_key = embedding_types
            .first()
            .map(|t| t.value.clone())
            .unwrap_or_default();

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (snapshot_tx, snapshot_rx) = watch::channel(ComparisonSnapshot {
            subject: None,
            nodes: Vec::new(),
            sort_key: sort_key.clone(),
        });
        let shutdown_notify = Arc::new(Notify::new());

        let worker = Worker {
            scorer,
            embedding_types,
            stagger: Duration::from_millis(config.stagger_ms),
            subject: None,
            epoch: 0,
            set: WorkingSet::new(sort_key),
            completion_tx: command_tx.clone(),
            snapshot_tx,
        };

        let worker_shutdown = shutdown_notify.clone();
        let worker_handle = tokio::spawn(async move {
            worker.run(command_rx, worker_shutdown).await;
        });

        Self {
            command_tx,
            snapshot_rx,
            worker_handle: Some(worker_handle),
            shutdown_notify,
        }
    }

    /// Add an entity to the working set.
    ///
    /// No-op when the qnode is already a member. When a subject is set, one
    /// similarity fetch per configured embedding type is scheduled
    /// immediately for the new node.
    pub async fn add(&self, entity: Entity) -> SimResult<()> {
        self.send(Command::Add(entity)).await
    }

    /// Remove a node, returning its entity so the caller can put it back
    /// into the search-result list.
    pub async fn remove(&self, qnode: &str) -> SimResult<Option<Entity>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Remove {
            qnode: qnode.to_string(),
            reply,
        })
        .await?;
        response
            .await
            .map_err(|_| SimError::ChannelClosed("comparison manager".to_string()))
    }

    /// Replace the subject all scores are computed against.
    ///
    /// Existing scores are cleared immediately (membership kept); when the
    /// new subject is present, a refresh batch is scheduled per node with
    /// node k delayed by `k * stagger_ms`.
    pub async fn set_subject(&self, subject: Option<Entity>) -> SimResult<()> {
        self.send(Command::SetSubject(subject)).await
    }

    /// Change the embedding type used to order the sequence.
    pub async fn set_sort_key(&self, sort_key: &str) -> SimResult<()> {
        self.send(Command::SetSortKey(sort_key.to_string())).await
    }

    /// Subscribe to state publications.
    pub fn subscribe(&self) -> watch::Receiver<ComparisonSnapshot> {
        self.snapshot_rx.clone()
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> ComparisonSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Graceful shutdown: stop the worker and wait for it to finish.
    pub async fn shutdown(&mut self) {
        self.shutdown_notify.notify_one();
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.await;
        }
    }

    async fn send(&self, command: Command) -> SimResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SimError::ChannelClosed("comparison manager".to_string()))
    }
}

impl Drop for ComparisonManager {
    fn drop(&mut self) {
        // Cannot await in Drop; abort the worker to avoid leaking it.
        if let Some(handle) = self.worker_handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    scorer: Arc<dyn SimilarityScorer>,
    embedding_types: Vec<EmbeddingType>,
    stagger: Duration,
    subject: Option<Entity>,
    epoch: u64,
    set: WorkingSet,
    completion_tx: mpsc::Sender<Command>,
    snapshot_tx: watch::Sender<ComparisonSnapshot>,
}

impl Worker {
    async fn run(mut self, mut command_rx: mpsc::Receiver<Command>, shutdown: Arc<Notify>) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                command = command_rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Add(entity) => {
                let qnode = entity.qnode.clone();
                if !self.set.insert(entity) {
                    debug!(%qnode, "already selected, ignoring add");
                    return;
                }
                if self.subject.is_some() {
                    self.spawn_node_fetches(&qnode, Duration::ZERO);
                }
                self.publish();
            }
            Command::Remove { qnode, reply } => {
                let entity = self.set.remove(&qnode);
                if entity.is_some() {
                    self.publish();
                }
                let _ = reply.send(entity);
            }
            Command::SetSubject(subject) => {
                self.epoch += 1;
                self.subject = subject;
                self.set.clear_scores();
                self.publish();
                if self.subject.is_some() {
                    let qnodes: Vec<String> = self
                        .set
                        .nodes()
                        .iter()
                        .map(|n| n.qnode().to_string())
                        .collect();
                    for (k, qnode) in qnodes.iter().enumerate() {
                        self.spawn_node_fetches(qnode, self.stagger * k as u32);
                    }
                }
            }
            Command::SetSortKey(sort_key) => {
                self.set.set_sort_key(sort_key);
                self.publish();
            }
            Command::Completion {
                epoch,
                qnode,
                embedding_type,
                value,
            } => {
                if epoch != self.epoch {
                    debug!(%qnode, %embedding_type, "dropping completion for superseded subject");
                    return;
                }
                if self.set.apply_score(&qnode, &embedding_type, value) {
                    self.publish();
                } else {
                    debug!(%qnode, %embedding_type, "dropping completion for removed node");
                }
            }
        }
    }

    /// Schedule one fetch task per embedding type for `qnode`, each tagged
    /// with the current epoch and delayed by `delay`.
    fn spawn_node_fetches(&self, qnode: &str, delay: Duration) {
        let subject_qnode = match &self.subject {
            Some(subject) => subject.qnode.clone(),
            None => return,
        };

        for embedding_type in &self.embedding_types {
            let scorer = Arc::clone(&self.scorer);
            let completion_tx = self.completion_tx.clone();
            let epoch = self.epoch;
            let q1 = subject_qnode.clone();
            let q2 = qnode.to_string();
            let type_value = embedding_type.value.clone();

            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let value = match scorer.score(&q1, &q2, &type_value).await {
                    // Re-normalize so the stored value is always the
                    // absolute score, whatever the scorer returned.
                    Ok(SimilarityValue::Score(raw)) => SimilarityValue::from_raw(raw),
                    Ok(value) => value,
                    Err(error) => {
                        warn!(%q2, %type_value, %error, "similarity fetch failed");
                        SimilarityValue::Unavailable
                    }
                };
                // Worker gone means the session is shutting down.
                let _ = completion_tx
                    .send(Command::Completion {
                        epoch,
                        qnode: q2,
                        embedding_type: type_value,
                        value,
                    })
                    .await;
            });
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(ComparisonSnapshot {
            subject: self.subject.clone(),
            nodes: self.set.snapshot(),
            sort_key: self.set.sort_key().to_string(),
        });
    }
}
