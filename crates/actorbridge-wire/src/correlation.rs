//! Correlation bus: pairs out-of-order replies with their requests.
//!
//! Each request gets a fresh 128-bit identifier and a one-shot slot in the
//! pending map. The slot is registered *before* the request is handed to the
//! transport, so a reply can never arrive ahead of its waiter. The first
//! reply for an identifier removes the slot and resolves the caller; any
//! later reply for it finds nothing and is dropped.

use crate::message::{Action, ReplyOutcome};
use actorbridge_types::error::{BridgeError, BridgeResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

type PendingMap = DashMap<String, oneshot::Sender<ReplyOutcome>>;

/// Registry of requests awaiting replies.
pub struct CorrelationBus {
    pending: Arc<PendingMap>,
    max_pending: usize,
    closed: AtomicBool,
}

impl CorrelationBus {
    /// Create a bus that refuses to hold more than `max_pending` requests.
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            max_pending,
            closed: AtomicBool::new(false),
        }
    }

    /// Reserve a slot for a new request and return its waiter.
    pub fn register(&self, action: Action) -> BridgeResult<PendingReply> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BridgeError::ShuttingDown);
        }
        if self.pending.len() >= self.max_pending {
            warn!(
                pending = self.pending.len(),
                max_pending = self.max_pending,
                "Too many pending requests; refusing new request"
            );
            return Err(BridgeError::TooManyPending(self.max_pending));
        }

        let message_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        match self.pending.entry(message_id.clone()) {
            Entry::Occupied(_) => {
                error!(message_id = %message_id, "Correlation identifier collision");
                return Err(BridgeError::Internal(format!(
                    "duplicate correlation identifier {message_id}"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }

        debug!(message_id = %message_id, action = %action, "Registered pending request");
        Ok(PendingReply {
            message_id,
            action,
            rx,
            pending: Arc::clone(&self.pending),
        })
    }

    /// Deliver a reply. Returns `false` when no request was waiting for it.
    pub fn resolve(&self, message_id: &str, outcome: ReplyOutcome) -> bool {
        match self.pending.remove(message_id) {
            Some((_, tx)) => {
                debug!(message_id = %message_id, "Resolved pending request");
                if tx.send(outcome).is_err() {
                    debug!(message_id = %message_id, "Caller stopped waiting before the reply");
                }
                true
            }
            None => {
                warn!(
                    message_id = %message_id,
                    "Reply for unknown or already resolved request dropped"
                );
                false
            }
        }
    }

    /// Number of requests awaiting replies.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Identifiers of requests awaiting replies, sorted.
    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Release every waiter with [`BridgeError::NoReply`] and refuse new
    /// registrations.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            debug!(dropped, "Released pending requests on shutdown");
        }
    }
}

/// A registered request's half of the slot.
///
/// Dropping it removes the slot, so an abandoned call leaves nothing behind.
pub struct PendingReply {
    message_id: String,
    action: Action,
    rx: oneshot::Receiver<ReplyOutcome>,
    pending: Arc<PendingMap>,
}

impl PendingReply {
    /// Identifier to put on the wire.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Action the slot was registered for.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Suspend until the reply arrives, or until `timeout` elapses.
    pub async fn wait(mut self, timeout: Option<Duration>) -> BridgeResult<ReplyOutcome> {
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.rx).await {
                Ok(received) => received,
                Err(_) => {
                    warn!(
                        message_id = %self.message_id,
                        action = %self.action,
                        "Timed out waiting for reply"
                    );
                    return Err(BridgeError::Timeout {
                        action: self.action.to_string(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => (&mut self.rx).await,
        };
        received.map_err(|_| BridgeError::NoReply)
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.pending.remove(&self.message_id);
    }
}
