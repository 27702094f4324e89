//! Actor bridge: connects the host application to the remote identity surface.
//!
//! An [`ActorBridge`] owns one instance of every piece of protocol state:
//! the readiness gate, the correlation bus and the picker controller. No
//! state is global; two bridges never share anything.
//!
//! Outbound: every request waits for the gate, registers its reply slot,
//! then goes through the [`ChannelTransport`]. Inbound: every envelope is
//! origin-checked, opens the gate, and is dispatched as a reply or a
//! picker notification. Unrecognized messages are dropped.

use crate::selection::{SelectionController, SelectionObserverFn, SurfacePresenter};
use actorbridge_types::config::BridgeConfig;
use actorbridge_types::error::{BridgeError, BridgeResult};
use actorbridge_types::selection::{
    ChosenActor, ChosenActorState, SelectionOutcome, SelectionState,
};
use actorbridge_types::{codec, ActorReference};
use actorbridge_wire::{
    decode_inbound, encode_request, Action, ChannelTransport, CorrelationBus, InboundEnvelope,
    InboundMessage, ReadinessGate, WireRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Host-side bridge to the remote identity surface.
pub struct ActorBridge {
    config: BridgeConfig,
    target_origin: String,
    transport: Arc<dyn ChannelTransport>,
    gate: ReadinessGate,
    bus: CorrelationBus,
    selection: SelectionController,
}

impl ActorBridge {
    /// Build a bridge. The configuration is fixed from here on.
    pub fn new(
        config: BridgeConfig,
        transport: Arc<dyn ChannelTransport>,
        presenter: Arc<dyn SurfacePresenter>,
    ) -> BridgeResult<Self> {
        config.validate()?;
        let target_origin = config.target_origin()?;
        info!(
            url = %config.actor_manager_url,
            origin = %target_origin,
            "Actor bridge created"
        );

        Ok(Self {
            bus: CorrelationBus::new(config.max_pending_requests),
            gate: ReadinessGate::new(),
            selection: SelectionController::new(presenter),
            config,
            target_origin,
            transport,
        })
    }

    /// The configuration this bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Origin every outbound message is restricted to.
    pub fn target_origin(&self) -> &str {
        &self.target_origin
    }

    /// Whether the remote surface has announced itself.
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Number of requests awaiting replies.
    pub fn pending_requests(&self) -> usize {
        self.bus.pending_count()
    }

    /// Send one request and wait for its reply text.
    pub(crate) async fn send_and_receive(
        &self,
        action: Action,
        data: String,
        nonce: Option<&[u8]>,
    ) -> BridgeResult<String> {
        self.gate.wait_ready().await?;

        let pending = self.bus.register(action)?;
        let request = WireRequest {
            message_id: pending.message_id().to_string(),
            action,
            data,
            nonce: nonce.map(codec::encode),
        };
        let payload = encode_request(&request)?;

        debug!(message_id = %request.message_id, action = %action, "Posting request");
        self.transport.post(payload, &self.target_origin).await?;

        pending
            .wait(self.request_timeout())
            .await?
            .into_result()
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.config.request_timeout()
    }

    /// Process one message from the remote side.
    pub fn handle_inbound(&self, envelope: InboundEnvelope) {
        if self.config.verify_inbound_origin && envelope.origin != self.target_origin {
            warn!(
                origin = %envelope.origin,
                expected = %self.target_origin,
                "Dropping inbound message from unexpected origin"
            );
            return;
        }

        self.gate.mark_ready();

        match decode_inbound(&envelope.data) {
            Some(InboundMessage::Reply {
                message_id,
                outcome,
            }) => {
                self.bus.resolve(&message_id, outcome);
            }
            Some(InboundMessage::Chosen(notice)) => self.selection.handle_choice(notice),
            Some(InboundMessage::Canceled) => self.selection.handle_canceled(),
            None => {
                debug!(len = envelope.data.len(), "Dropping unrecognized inbound message");
            }
        }
    }

    /// Drain `inbound` into [`handle_inbound`](Self::handle_inbound) until
    /// the sender side closes.
    pub fn listen(
        self: &Arc<Self>,
        mut inbound: mpsc::Receiver<InboundEnvelope>,
    ) -> tokio::task::JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(envelope) = inbound.recv().await {
                bridge.handle_inbound(envelope);
            }
            debug!("Inbound channel closed");
        })
    }

    /// Present the picker and wait for the user's decision.
    ///
    /// A cancellation of any kind is [`BridgeError::SelectionCanceled`].
    pub async fn select_actor(&self) -> BridgeResult<ChosenActor> {
        let outcome = self.selection.open().await.map_err(|_| BridgeError::NoReply)?;
        match outcome {
            SelectionOutcome::Chosen(actor) => Ok(actor),
            SelectionOutcome::Canceled { reason } => Err(BridgeError::SelectionCanceled(reason)),
        }
    }

    /// Feed a click on the modal backdrop. Returns `true` when it canceled
    /// the selection.
    pub fn handle_click(&self, x: f64, y: f64) -> bool {
        self.selection.handle_click(x, y)
    }

    /// Close the picker from the host side.
    pub fn close_selection(&self) -> bool {
        self.selection.close()
    }

    /// Current picker lifecycle state.
    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    /// Register the callback invoked on every terminal picker outcome.
    pub fn on_selection(&self, observer: SelectionObserverFn) {
        self.selection.set_observer(observer);
    }

    /// Subscribe to terminal picker outcomes.
    pub fn subscribe_selection(&self) -> broadcast::Receiver<SelectionOutcome> {
        self.selection.subscribe()
    }

    /// What is known about the chosen actor.
    pub fn chosen_actor(&self) -> ChosenActorState {
        self.selection.chosen_actor()
    }

    /// Reference of the currently chosen actor, if any.
    pub fn chosen_actor_reference(&self) -> Option<ActorReference> {
        self.selection.chosen_actor().actor().map(|a| a.uri.clone())
    }

    /// Public key of the currently chosen actor, if any.
    pub fn chosen_actor_public_key(&self) -> Option<[u8; 32]> {
        self.chosen_actor_reference().map(|r| *r.public_key())
    }

    /// Tear the bridge down: close the picker, fail in-flight requests with
    /// [`BridgeError::NoReply`] and refuse anything new.
    pub fn shutdown(&self) {
        info!(
            pending = self.bus.pending_count(),
            "Shutting down actor bridge"
        );
        self.selection.close();
        self.gate.close();
        self.bus.shutdown();
    }
}
