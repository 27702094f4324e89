//! Core types for the actor bridge.
//!
//! This crate defines the data shared by the wire layer and the host-facing
//! client: the binary-to-text codec, actor references, the error taxonomy,
//! selection types and the configuration schema. It contains no async logic.

pub mod actor;
pub mod codec;
pub mod config;
pub mod error;
pub mod selection;

pub use actor::{verify_signature, ActorKey, ActorReference, ACTOR_SCHEME};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
