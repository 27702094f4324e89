//! Readiness gate: holds outgoing traffic until the remote surface speaks.
//!
//! The gate starts pending and opens exactly once, on the first inbound
//! message from the surface. Every caller that arrived before that moment
//! is released together; callers after it pass straight through. Only
//! teardown moves it again, to closed.

use actorbridge_types::error::{BridgeError, BridgeResult};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Pending,
    Ready,
    Closed,
}

/// One-way latch shared by all requests of a bridge instance.
#[derive(Debug)]
pub struct ReadinessGate {
    state: watch::Sender<GateState>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Pending);
        Self { state }
    }

    /// Open the gate. Returns `true` only for the call that opened it.
    pub fn mark_ready(&self) -> bool {
        let opened = self.state.send_if_modified(|state| {
            if *state == GateState::Pending {
                *state = GateState::Ready;
                true
            } else {
                false
            }
        });
        if opened {
            info!("Remote surface is live; releasing queued requests");
        }
        opened
    }

    /// Whether the gate has opened (and not been torn down).
    pub fn is_ready(&self) -> bool {
        *self.state.borrow() == GateState::Ready
    }

    /// Wait until the gate opens. Fails once the gate is closed.
    pub async fn wait_ready(&self) -> BridgeResult<()> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| *state != GateState::Pending)
            .await
            .map(|state| *state)
            .unwrap_or(GateState::Closed);
        match state {
            GateState::Ready => Ok(()),
            _ => Err(BridgeError::ShuttingDown),
        }
    }

    /// Tear the gate down, failing current and future waiters.
    pub fn close(&self) {
        self.state.send_replace(GateState::Closed);
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
