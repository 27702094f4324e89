//! Actor references and local Ed25519 signature verification.
//!
//! An actor is named by its Ed25519 public key. The textual handle is the
//! fixed `actor:` scheme followed by the codec encoding of the 32 key bytes:
//!
//! ```text
//! actor:<base64url(public key)>
//! ```
//!
//! Signing never happens on this side of the channel; verification does,
//! because it only needs the public key.

use crate::codec;
use crate::error::{BridgeError, BridgeResult};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Scheme prefix of every actor reference.
pub const ACTOR_SCHEME: &str = "actor:";

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// A validated `actor:` reference.
///
/// Keeps the text exactly as it was given; references compare and hash by
/// the key they name, so padded and unpadded spellings are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorReference {
    uri: String,
    public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl ActorReference {
    /// Build the reference naming `public_key`.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self {
            uri: format!("{ACTOR_SCHEME}{}", codec::encode(public_key)),
            public_key: *public_key,
        }
    }

    /// Parse a textual reference. The `actor:` prefix is mandatory.
    pub fn parse(uri: &str) -> BridgeResult<Self> {
        let suffix = uri.strip_prefix(ACTOR_SCHEME).ok_or_else(|| {
            BridgeError::MalformedActorReference(format!(
                "'{uri}' does not start with '{ACTOR_SCHEME}'"
            ))
        })?;
        let public_key = key_from_encoded(suffix)?;
        Ok(Self {
            uri: uri.to_string(),
            public_key,
        })
    }

    /// The textual form, as received or as built.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// The decoded public key.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }
}

impl PartialEq for ActorReference {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for ActorReference {}

impl Hash for ActorReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.public_key.hash(state);
    }
}

impl fmt::Display for ActorReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl FromStr for ActorReference {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ActorReference {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ActorReference> for String {
    fn from(value: ActorReference) -> Self {
        value.uri
    }
}

/// Anything that identifies a counterparty's public key.
///
/// Operations taking a counterparty accept a full reference, a bare encoded
/// key, or raw key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorKey {
    /// An `actor:` reference.
    Reference(ActorReference),
    /// Raw public key bytes.
    PublicKey([u8; PUBLIC_KEY_LENGTH]),
}

impl ActorKey {
    /// Parse either `actor:<key>` or a bare encoded key.
    pub fn parse(text: &str) -> BridgeResult<Self> {
        if text.starts_with(ACTOR_SCHEME) {
            ActorReference::parse(text).map(ActorKey::Reference)
        } else {
            key_from_encoded(text).map(ActorKey::PublicKey)
        }
    }

    /// Wrap raw key bytes, checking the length.
    pub fn from_slice(bytes: &[u8]) -> BridgeResult<Self> {
        key_from_bytes(bytes).map(ActorKey::PublicKey)
    }

    /// The public key bytes, whichever form this key was given in.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        match self {
            ActorKey::Reference(reference) => reference.public_key(),
            ActorKey::PublicKey(bytes) => bytes,
        }
    }

    /// The `actor:` reference for this key.
    pub fn to_reference(&self) -> ActorReference {
        match self {
            ActorKey::Reference(reference) => reference.clone(),
            ActorKey::PublicKey(bytes) => ActorReference::from_public_key(bytes),
        }
    }
}

impl From<ActorReference> for ActorKey {
    fn from(value: ActorReference) -> Self {
        ActorKey::Reference(value)
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for ActorKey {
    fn from(value: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        ActorKey::PublicKey(value)
    }
}

impl From<&VerifyingKey> for ActorKey {
    fn from(value: &VerifyingKey) -> Self {
        ActorKey::PublicKey(value.to_bytes())
    }
}

fn key_from_encoded(text: &str) -> BridgeResult<[u8; PUBLIC_KEY_LENGTH]> {
    let bytes = codec::decode(text)
        .map_err(|e| BridgeError::MalformedActorReference(e.to_string()))?;
    key_from_bytes(&bytes)
}

fn key_from_bytes(bytes: &[u8]) -> BridgeResult<[u8; PUBLIC_KEY_LENGTH]> {
    bytes.try_into().map_err(|_| {
        BridgeError::MalformedActorReference(format!(
            "invalid public key length {} (expected {PUBLIC_KEY_LENGTH} bytes)",
            bytes.len()
        ))
    })
}

/// Check an Ed25519 signature over `message` against `key`.
///
/// A signature of the wrong length, or one that does not verify, yields
/// `Ok(false)`. Only a key that is not a valid curve point is an error.
pub fn verify_signature(signature: &[u8], message: &[u8], key: &ActorKey) -> BridgeResult<bool> {
    let verifying_key = VerifyingKey::from_bytes(key.public_key())
        .map_err(|e| BridgeError::MalformedActorReference(format!("invalid public key: {e}")))?;

    let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.try_into() {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    let signature = Signature::from_bytes(&sig_bytes);

    Ok(verifying_key.verify(message, &signature).is_ok())
}
