//! Channel transport: the string-only link to the remote surface.
//!
//! [`ChannelTransport`] is the outbound primitive: it delivers one serialized
//! message to the remote context and must refuse any message addressed to an
//! origin other than the remote's own. Inbound traffic is modelled as a
//! stream of [`InboundEnvelope`]s that the bridge drains.
//!
//! [`memory_channel`] builds an in-process pair: the host-side
//! [`MemoryTransport`] and a [`RemoteEndpoint`] that plays the remote surface.

use crate::message::{decode_request, WireRequest};
use actorbridge_types::error::{BridgeError, BridgeResult};
use actorbridge_types::selection::ChosenActor;
use async_trait::async_trait;
use serde_json::json;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outbound delivery to the remote surface.
#[async_trait]
pub trait ChannelTransport: Send + Sync + 'static {
    /// Deliver `message` to the remote context, provided it lives at
    /// `target_origin`.
    async fn post(&self, message: String, target_origin: &str) -> BridgeResult<()>;
}

/// One message received from the remote side, tagged with its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEnvelope {
    /// Origin of the sending context.
    pub origin: String,
    /// Raw message text.
    pub data: String,
}

impl InboundEnvelope {
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Build a connected in-process channel.
///
/// Returns the host transport, the remote endpoint living at
/// `remote_origin`, and the receiver the bridge drains for inbound traffic.
pub fn memory_channel(
    remote_origin: impl Into<String>,
    capacity: usize,
) -> (MemoryTransport, RemoteEndpoint, mpsc::Receiver<InboundEnvelope>) {
    let remote_origin = remote_origin.into();
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);

    let transport = MemoryTransport {
        remote_origin: remote_origin.clone(),
        endpoint: RwLock::new(Some(request_tx)),
    };
    let remote = RemoteEndpoint {
        origin: remote_origin,
        requests: request_rx,
        host: inbound_tx,
    };
    (transport, remote, inbound_rx)
}

/// Host side of a [`memory_channel`].
pub struct MemoryTransport {
    remote_origin: String,
    endpoint: RwLock<Option<mpsc::Sender<String>>>,
}

impl MemoryTransport {
    /// A transport whose remote endpoint does not exist.
    pub fn unattached(remote_origin: impl Into<String>) -> Self {
        Self {
            remote_origin: remote_origin.into(),
            endpoint: RwLock::new(None),
        }
    }

    /// Drop the link to the remote endpoint, as when the surface is unloaded.
    pub fn detach(&self) {
        let mut endpoint = self.endpoint.write().unwrap_or_else(|e| e.into_inner());
        *endpoint = None;
    }

    /// Origin of the remote endpoint.
    pub fn remote_origin(&self) -> &str {
        &self.remote_origin
    }
}

#[async_trait]
impl ChannelTransport for MemoryTransport {
    async fn post(&self, message: String, target_origin: &str) -> BridgeResult<()> {
        if target_origin != self.remote_origin {
            warn!(
                target_origin,
                remote_origin = %self.remote_origin,
                "Refusing to post to a mismatched origin"
            );
            return Err(BridgeError::OriginRejected {
                requested: target_origin.to_string(),
                endpoint: self.remote_origin.clone(),
            });
        }

        let endpoint = {
            let guard = self.endpoint.read().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        let endpoint = endpoint.ok_or_else(|| {
            BridgeError::ChannelNotReady("remote endpoint is not attached".to_string())
        })?;

        endpoint
            .send(message)
            .await
            .map_err(|_| BridgeError::ChannelNotReady("remote endpoint closed".to_string()))
    }
}

/// Remote side of a [`memory_channel`]: receives requests and posts replies
/// and notifications back to the host, stamped with its own origin.
pub struct RemoteEndpoint {
    origin: String,
    requests: mpsc::Receiver<String>,
    host: mpsc::Sender<InboundEnvelope>,
}

impl RemoteEndpoint {
    /// This endpoint's origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Wait for the next well-formed request. `None` once the host is gone.
    pub async fn next_request(&mut self) -> Option<WireRequest> {
        loop {
            let raw = self.requests.recv().await?;
            match decode_request(&raw) {
                Ok(request) => return Some(request),
                Err(e) => debug!(error = %e, "Remote endpoint skipped undecodable request"),
            }
        }
    }

    /// Take a request if one is already queued.
    pub fn try_next_request(&mut self) -> Option<WireRequest> {
        while let Ok(raw) = self.requests.try_recv() {
            if let Ok(request) = decode_request(&raw) {
                return Some(request);
            }
        }
        None
    }

    /// Post arbitrary text to the host.
    pub async fn post_raw(&self, data: impl Into<String>) -> BridgeResult<()> {
        self.host
            .send(InboundEnvelope::new(self.origin.clone(), data))
            .await
            .map_err(|_| BridgeError::ChannelNotReady("host stopped listening".to_string()))
    }

    /// Announce that the surface has loaded.
    pub async fn announce(&self) -> BridgeResult<()> {
        self.post_raw(json!({ "ready": true }).to_string()).await
    }

    /// Answer a request successfully.
    pub async fn reply(&self, message_id: &str, reply: &str) -> BridgeResult<()> {
        self.post_raw(json!({ "messageID": message_id, "reply": reply }).to_string())
            .await
    }

    /// Answer a request with an error.
    pub async fn fail(&self, message_id: &str, error: &str) -> BridgeResult<()> {
        self.post_raw(json!({ "messageID": message_id, "error": error }).to_string())
            .await
    }

    /// Report a choice made in the picker; `None` reports no actor.
    pub async fn choose(&self, actor: Option<&ChosenActor>) -> BridgeResult<()> {
        let chosen = match actor {
            Some(actor) => json!({
                "uri": actor.uri.as_str(),
                "nickname": actor.nickname.as_deref().unwrap_or_default(),
            }),
            None => serde_json::Value::Null,
        };
        self.post_raw(json!({ "chosen": chosen }).to_string()).await
    }

    /// Report that the user dismissed the picker.
    pub async fn cancel(&self) -> BridgeResult<()> {
        self.post_raw(json!({ "canceled": true }).to_string()).await
    }
}
