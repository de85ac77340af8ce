//! SearchController: actor that owns the query text and the result list.
//!
//! Edits restart a single-shot debounce timer; only the latest query within
//! the quiet period is dispatched, and at most one request fires per quiet
//! period. An empty query clears the result list immediately with no timer
//! and no network call. Responses are tagged with a query epoch so a reply
//! that arrives after its query has been superseded is dropped instead of
//! clobbering newer results.
//!
//! A failed search is recoverable: the controller publishes
//! [`SearchStatus::Failed`] and keeps the previous result list.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ComparisonConfig;
use crate::error::{SimError, SimResult};
use crate::traits::EntitySearcher;
use crate::types::Entity;

/// Where the controller currently stands with respect to the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchStatus {
    /// No request outstanding.
    #[default]
    Idle,
    /// A request is in flight.
    Pending,
    /// The most recent request failed; the previous results are retained.
    Failed(String),
}

/// Published view of the search state.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    /// The current query text.
    pub query: String,
    /// Results of the most recent successful search, endpoint order.
    pub results: Vec<Entity>,
    /// Request state.
    pub status: SearchStatus,
    /// Number of responses applied so far, successful or failed.
    ///
    /// Watch channels collapse intermediate publications, so a consumer
    /// that needs "a response arrived after I asked" compares this counter
    /// rather than watching for a `Pending` -> `Idle` transition.
    pub completions: u64,
}

enum Command {
    SetQuery(String),
    Submit,
    Take {
        qnode: String,
        reply: oneshot::Sender<Option<Entity>>,
    },
    RestoreFront(Entity),
    Completion {
        epoch: u64,
        outcome: SimResult<Vec<Entity>>,
    },
}

/// Handle to the search worker task.
pub struct SearchController {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SearchSnapshot>,
    worker_handle: Option<JoinHandle<()>>,
    shutdown_notify: Arc<Notify>,
}

impl SearchController {
    /// Start the worker task and return its handle.
    pub fn spawn(searcher: Arc<dyn EntitySearcher>, config: &ComparisonConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (snapshot_tx, snapshot_rx) = watch::channel(SearchSnapshot::default());
        let shutdown_notify = Arc::new(Notify::new());

        let worker = Worker {
            searcher,
            debounce: Duration::from_millis(config.debounce_ms),
            epoch: 0,
            state: SearchSnapshot::default(),
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

    /// Record an edit to the query text.
    ///
    /// Non-empty text (re)starts the debounce timer; empty text clears the
    /// result list immediately.
    pub async fn set_query(&self, text: &str) -> SimResult<()> {
        self.send(Command::SetQuery(text.to_string())).await
    }

    /// Dispatch the current query immediately, bypassing the debounce
    /// window (the explicit form-submit path).
    pub async fn submit(&self) -> SimResult<()> {
        self.send(Command::Submit).await
    }

    /// Remove and return a result, moving it out of the list.
    pub async fn take(&self, qnode: &str) -> SimResult<Option<Entity>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Take {
            qnode: qnode.to_string(),
            reply,
        })
        .await?;
        response
            .await
            .map_err(|_| SimError::ChannelClosed("search controller".to_string()))
    }

    /// Re-insert a previously taken entity at the head of the result list.
    pub async fn restore_front(&self, entity: Entity) -> SimResult<()> {
        self.send(Command::RestoreFront(entity)).await
    }

    /// Subscribe to state publications.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshot_rx.clone()
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> SearchSnapshot {
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
            .map_err(|_| SimError::ChannelClosed("search controller".to_string()))
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(handle) = self.worker_handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    searcher: Arc<dyn EntitySearcher>,
    debounce: Duration,
    epoch: u64,
    state: SearchSnapshot,
    completion_tx: mpsc::Sender<Command>,
    snapshot_tx: watch::Sender<SearchSnapshot>,
}

impl Worker {
    async fn run(mut self, mut command_rx: mpsc::Receiver<Command>, shutdown: Arc<Notify>) {
        // Query text waiting out the debounce window, with its deadline.
        let mut pending: Option<(String, tokio::time::Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, at)| *at);
            tokio::select! {
                _ = shutdown.notified() => break,
                command = command_rx.recv() => match command {
                    Some(command) => self.handle(command, &mut pending),
                    None => break,
                },
                _ = async {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    if let Some((query, _)) = pending.take() {
                        self.dispatch(query);
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: Command, pending: &mut Option<(String, tokio::time::Instant)>) {
        match command {
            Command::SetQuery(text) => {
                self.state.query = text.clone();
                if text.is_empty() {
                    // Immediate, no debounce: cancel any armed timer, drop
                    // any in-flight reply, clear the list.
                    *pending = None;
                    self.epoch += 1;
                    self.state.results.clear();
                    self.state.status = SearchStatus::Idle;
                } else {
                    // Restart the single-shot timer; last write wins.
                    *pending = Some((text, tokio::time::Instant::now() + self.debounce));
                }
                self.publish();
            }
            Command::Submit => {
                *pending = None;
                if !self.state.query.is_empty() {
                    let query = self.state.query.clone();
                    self.dispatch(query);
                }
            }
            Command::Take { qnode, reply } => {
                let entity = match self.state.results.iter().position(|e| e.qnode == qnode) {
                    Some(position) => {
                        let entity = self.state.results.remove(position);
                        self.publish();
                        Some(entity)
                    }
                    None => None,
                };
                let _ = reply.send(entity);
            }
            Command::RestoreFront(entity) => {
                if !self.state.results.iter().any(|e| e.qnode == entity.qnode) {
                    self.state.results.insert(0, entity);
                    self.publish();
                }
            }
            Command::Completion { epoch, outcome } => {
                if epoch != self.epoch {
                    debug!("dropping search response for superseded query");
                    return;
                }
                self.state.completions += 1;
                match outcome {
                    Ok(results) => {
                        self.state.results = results;
                        self.state.status = SearchStatus::Idle;
                    }
                    Err(error) => {
                        warn!(%error, "entity search failed");
                        self.state.status = SearchStatus::Failed(error.to_string());
                    }
                }
                self.publish();
            }
        }
    }

    /// Issue a request for `query` tagged with a fresh epoch.
    fn dispatch(&mut self, query: String) {
        self.epoch += 1;
        self.state.status = SearchStatus::Pending;
        self.publish();

        let searcher = Arc::clone(&self.searcher);
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = searcher.search(&query).await;
            let _ = completion_tx.send(Command::Completion { epoch, outcome }).await;
        });
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
    }
}
