//! Typed actor operations on top of the correlation protocol.
//!
//! Binary arguments are codec-encoded into the request's `data` field and
//! reply text is decoded back to bytes. Operations that name a counterparty
//! append its encoded public key to `data`, separated by a comma:
//!
//! ```text
//! data = encode(input)                       // no counterparty
//! data = encode(input) + "," + encode(key)   // with counterparty
//! ```
//!
//! `derive_shared_secret` sends the counterparty's `actor:` reference as the
//! whole of `data`.
//!
//! `verify` is the exception: it runs locally and never touches the channel.

use crate::bridge::ActorBridge;
use actorbridge_types::error::BridgeResult;
use actorbridge_types::{codec, verify_signature, ActorKey};
use actorbridge_wire::Action;

impl ActorBridge {
    /// Sign `message` with the chosen actor's key.
    pub async fn sign(&self, message: &[u8], nonce: Option<&[u8]>) -> BridgeResult<Vec<u8>> {
        self.remote_bytes(Action::Sign, codec::encode(message), nonce)
            .await
    }

    /// Check `signature` over `message` against `signer`, locally.
    pub fn verify(&self, signature: &[u8], message: &[u8], signer: &ActorKey) -> BridgeResult<bool> {
        verify_signature(signature, message, signer)
    }

    /// Fetch the chosen actor's public key, or a one-time key derived from
    /// `nonce`.
    pub async fn get_public_key(&self, nonce: Option<&[u8]>) -> BridgeResult<Vec<u8>> {
        self.remote_bytes(Action::PublicKey, String::new(), nonce)
            .await
    }

    /// Encrypt `plaintext`, optionally for a specific counterparty.
    pub async fn encrypt(
        &self,
        plaintext: &[u8],
        counterparty: Option<&ActorKey>,
        nonce: Option<&[u8]>,
    ) -> BridgeResult<Vec<u8>> {
        self.private_message_action(Action::Encrypt, plaintext, counterparty, nonce)
            .await
    }

    /// Decrypt `ciphertext`, optionally from a specific counterparty.
    pub async fn decrypt(
        &self,
        ciphertext: &[u8],
        counterparty: Option<&ActorKey>,
        nonce: Option<&[u8]>,
    ) -> BridgeResult<Vec<u8>> {
        self.private_message_action(Action::Decrypt, ciphertext, counterparty, nonce)
            .await
    }

    /// Derive the secret shared between the chosen actor and `counterparty`.
    pub async fn derive_shared_secret(&self, counterparty: &ActorKey) -> BridgeResult<Vec<u8>> {
        let reference = counterparty.to_reference();
        self.remote_bytes(Action::SharedSecret, reference.as_str().to_string(), None)
            .await
    }

    /// Derive a secret bound to `nonce`.
    pub async fn nonced_secret(&self, nonce: &[u8]) -> BridgeResult<Vec<u8>> {
        self.remote_bytes(Action::NoncedSecret, codec::encode(nonce), None)
            .await
    }

    async fn private_message_action(
        &self,
        action: Action,
        input: &[u8],
        counterparty: Option<&ActorKey>,
        nonce: Option<&[u8]>,
    ) -> BridgeResult<Vec<u8>> {
        let mut data = codec::encode(input);
        if let Some(key) = counterparty {
            data.push(',');
            data.push_str(&codec::encode(key.public_key()));
        }
        self.remote_bytes(action, data, nonce).await
    }

    async fn remote_bytes(
        &self,
        action: Action,
        data: String,
        nonce: Option<&[u8]>,
    ) -> BridgeResult<Vec<u8>> {
        let reply = self.send_and_receive(action, data, nonce).await?;
        codec::decode(&reply)
    }
}
