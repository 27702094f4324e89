//! Bridge configuration schema.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default location of the remote identity surface.
pub const DEFAULT_ACTOR_MANAGER_URL: &str = "https://actor.graffiti.garden";

/// Settings fixed at bridge construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Where the remote identity surface is loaded from.
    pub actor_manager_url: String,
    /// Seconds to wait for a reply before giving up. `0` waits forever.
    pub request_timeout_secs: u64,
    /// Drop inbound messages that do not come from the surface's origin.
    pub verify_inbound_origin: bool,
    /// Maximum number of requests awaiting replies at once.
    pub max_pending_requests: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            actor_manager_url: DEFAULT_ACTOR_MANAGER_URL.to_string(),
            request_timeout_secs: 300,
            verify_inbound_origin: true,
            max_pending_requests: 256,
        }
    }
}

impl BridgeConfig {
    /// Config pointing at a specific surface URL, other fields defaulted.
    pub fn with_url(actor_manager_url: impl Into<String>) -> Self {
        Self {
            actor_manager_url: actor_manager_url.into(),
            ..Self::default()
        }
    }

    /// The origin (scheme, host and port) messages are addressed to.
    pub fn target_origin(&self) -> BridgeResult<String> {
        let url = Url::parse(&self.actor_manager_url).map_err(|e| {
            BridgeError::Config(format!(
                "invalid actor_manager_url '{}': {e}",
                self.actor_manager_url
            ))
        })?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(BridgeError::Config(format!(
                "actor_manager_url '{}' has no addressable origin",
                self.actor_manager_url
            )));
        }
        Ok(origin.ascii_serialization())
    }

    /// The reply bound, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Check that the config can drive a bridge.
    pub fn validate(&self) -> BridgeResult<()> {
        self.target_origin()?;
        if self.max_pending_requests == 0 {
            return Err(BridgeError::Config(
                "max_pending_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
