//! Host-side actor bridge.
//!
//! Lets a host application delegate identity operations (actor selection,
//! signing, key exchange, encryption) to an isolated remote surface that
//! holds the private keys. The host only ever sees public keys, signatures
//! and ciphertexts.
//!
//! ```text
//! caller ─▶ ActorBridge::sign ─▶ codec ─▶ readiness gate ─▶ correlation bus
//!                                                              │
//!        ◀── decode ◀── resolve slot ◀── handle_inbound ◀── ChannelTransport
//! ```

pub mod actor_ops;
pub mod bridge;
pub mod config;
pub mod logging;
pub mod selection;

pub use bridge::ActorBridge;
pub use selection::{SelectionController, SelectionObserverFn, SurfacePresenter};
