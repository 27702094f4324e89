//! Wire protocol message types.
//!
//! Every message crossing the channel is one JSON object serialized to a
//! string. Host-to-remote messages are requests:
//!
//! ```text
//! { "messageID": "<id>", "action": "<tag>", "data": "<text>", "nonce": "<text>"? }
//! ```
//!
//! Remote-to-host messages come in four shapes that carry no explicit tag:
//! a success reply (`messageID` + `reply`), an error reply (`messageID` +
//! `error`), a selection notification (`chosen`) and a cancel notification
//! (`canceled: true`). [`decode_inbound`] discriminates them in one place
//! and hands the rest of the bridge a typed [`InboundMessage`].

use actorbridge_types::error::{BridgeError, BridgeResult};
use actorbridge_types::selection::ChosenActor;
use actorbridge_types::ActorReference;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Remote operations the surface understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Sign a message with the chosen actor's key.
    Sign,
    /// Return the chosen actor's (optionally nonce-derived) public key.
    PublicKey,
    /// Encrypt for a counterparty.
    Encrypt,
    /// Decrypt from a counterparty.
    Decrypt,
    /// Derive a shared secret with a counterparty.
    #[serde(rename = "sharedSecret")]
    SharedSecret,
    /// Derive a secret bound to a nonce.
    #[serde(rename = "noncedSecret")]
    NoncedSecret,
}

impl Action {
    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Sign => "sign",
            Action::PublicKey => "public-key",
            Action::Encrypt => "encrypt",
            Action::Decrypt => "decrypt",
            Action::SharedSecret => "sharedSecret",
            Action::NoncedSecret => "noncedSecret",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request from host to remote surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequest {
    /// Correlation identifier echoed by the reply.
    #[serde(rename = "messageID")]
    pub message_id: String,
    /// Operation to perform.
    pub action: Action,
    /// Codec-encoded arguments.
    pub data: String,
    /// Codec-encoded nonce, when the operation takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// How a reply resolved its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// `reply` text.
    Success(String),
    /// `error` text, verbatim.
    Failure(String),
    /// The reply carried neither field.
    Missing,
}

impl ReplyOutcome {
    /// Map the outcome onto the caller's result.
    pub fn into_result(self) -> BridgeResult<String> {
        match self {
            ReplyOutcome::Success(text) => Ok(text),
            ReplyOutcome::Failure(reason) => Err(BridgeError::RemoteOperationFailed(reason)),
            ReplyOutcome::Missing => Err(BridgeError::NoReply),
        }
    }
}

/// Content of a `chosen` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceNotice {
    /// A valid actor was chosen.
    Actor(ChosenActor),
    /// `chosen` was null, or its `uri` was null or empty.
    Empty,
    /// The reference did not parse; carries the offending text.
    Invalid(String),
}

/// A classified remote-to-host message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Reply to an earlier request.
    Reply {
        message_id: String,
        outcome: ReplyOutcome,
    },
    /// The user made (or cleared) a choice in the picker.
    Chosen(ChoiceNotice),
    /// The user dismissed the picker inside the remote surface.
    Canceled,
}

/// Serialize a request for the channel.
pub fn encode_request(request: &WireRequest) -> BridgeResult<String> {
    Ok(serde_json::to_string(request)?)
}

/// Parse a request (used by whatever plays the remote surface).
pub fn decode_request(raw: &str) -> BridgeResult<WireRequest> {
    Ok(serde_json::from_str(raw)?)
}

/// Classify an inbound string. Returns `None` for anything that is not one
/// of the four recognized shapes.
///
/// A `chosen` key wins over everything else, then `canceled: true`, then
/// `messageID`.
pub fn decode_inbound(raw: &str) -> Option<InboundMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;

    if let Some(chosen) = obj.get("chosen") {
        return Some(InboundMessage::Chosen(classify_choice(chosen)));
    }

    if obj.get("canceled").and_then(Value::as_bool) == Some(true) {
        return Some(InboundMessage::Canceled);
    }

    let message_id = obj.get("messageID").and_then(Value::as_str)?;
    if message_id.is_empty() {
        return None;
    }
    Some(InboundMessage::Reply {
        message_id: message_id.to_string(),
        outcome: classify_reply(obj),
    })
}

fn classify_reply(obj: &Map<String, Value>) -> ReplyOutcome {
    match obj.get("error") {
        None | Some(Value::Null) => {}
        Some(Value::String(reason)) if reason.is_empty() => {}
        Some(Value::String(reason)) => return ReplyOutcome::Failure(reason.clone()),
        // Non-string error payloads are passed on as their JSON text.
        Some(other) => return ReplyOutcome::Failure(other.to_string()),
    }

    match obj.get("reply").and_then(Value::as_str) {
        Some(text) => ReplyOutcome::Success(text.to_string()),
        None => ReplyOutcome::Missing,
    }
}

fn classify_choice(chosen: &Value) -> ChoiceNotice {
    let (uri, nickname) = match chosen {
        Value::Null => return ChoiceNotice::Empty,
        // Older surfaces send the bare reference string.
        Value::String(uri) => (Some(uri.as_str()), None),
        Value::Object(obj) => (
            obj.get("uri").and_then(Value::as_str),
            obj.get("nickname").and_then(Value::as_str),
        ),
        other => return ChoiceNotice::Invalid(other.to_string()),
    };

    let uri = match uri {
        Some(uri) if !uri.is_empty() => uri,
        _ => return ChoiceNotice::Empty,
    };

    match ActorReference::parse(uri) {
        Ok(reference) => ChoiceNotice::Actor(ChosenActor {
            uri: reference,
            nickname: nickname.map(str::to_string),
        }),
        Err(_) => ChoiceNotice::Invalid(uri.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor_uri() -> String {
        ActorReference::from_public_key(&[5u8; 32]).to_string()
    }

    #[test]
    fn test_request_wire_shape() {
        let request = WireRequest {
            message_id: "m-1".to_string(),
            action: Action::PublicKey,
            data: String::new(),
            nonce: None,
        };
        let json = encode_request(&request).unwrap();
        assert_eq!(
            json,
            r#"{"messageID":"m-1","action":"public-key","data":""}"#
        );
    }

    #[test]
    fn test_request_with_nonce() {
        let request = WireRequest {
            message_id: "m-2".to_string(),
            action: Action::Sign,
            data: "aGk".to_string(),
            nonce: Some("AQI".to_string()),
        };
        let json = encode_request(&request).unwrap();
        assert!(json.contains(r#""nonce":"AQI""#));
        assert_eq!(decode_request(&json).unwrap(), request);
    }

    #[test]
    fn test_action_tags_match_serde() {
        for action in [
            Action::Sign,
            Action::PublicKey,
            Action::Encrypt,
            Action::Decrypt,
            Action::SharedSecret,
            Action::NoncedSecret,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }

    #[test]
    fn test_secret_action_tags() {
        assert_eq!(Action::SharedSecret.as_str(), "sharedSecret");
        assert_eq!(Action::NoncedSecret.as_str(), "noncedSecret");
        let raw = r#"{"messageID":"m-3","action":"sharedSecret","data":"actor:AAAA"}"#;
        assert_eq!(decode_request(raw).unwrap().action, Action::SharedSecret);
    }

    #[test]
    fn test_success_reply() {
        let msg = decode_inbound(r#"{"messageID":"abc","reply":"AAAA"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Reply {
                message_id: "abc".to_string(),
                outcome: ReplyOutcome::Success("AAAA".to_string()),
            }
        );
    }

    #[test]
    fn test_error_reply_wins_over_reply() {
        let msg = decode_inbound(r#"{"messageID":"abc","reply":"x","error":"denied"}"#).unwrap();
        match msg {
            InboundMessage::Reply { outcome, .. } => {
                assert_eq!(outcome, ReplyOutcome::Failure("denied".to_string()));
            }
            other => panic!("Expected Reply, got {other:?}"),
        }
    }

    #[test]
    fn test_reply_without_outcome() {
        let msg = decode_inbound(r#"{"messageID":"abc"}"#).unwrap();
        match msg {
            InboundMessage::Reply { outcome, .. } => {
                assert_eq!(outcome, ReplyOutcome::Missing);
                assert_eq!(outcome.into_result(), Err(BridgeError::NoReply));
            }
            other => panic!("Expected Reply, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_reply_is_success() {
        let msg = decode_inbound(r#"{"messageID":"abc","reply":""}"#).unwrap();
        match msg {
            InboundMessage::Reply { outcome, .. } => {
                assert_eq!(outcome.into_result(), Ok(String::new()));
            }
            other => panic!("Expected Reply, got {other:?}"),
        }
    }

    #[test]
    fn test_chosen_object() {
        let raw = format!(r#"{{"chosen":{{"uri":"{}","nickname":"alice"}}}}"#, actor_uri());
        match decode_inbound(&raw).unwrap() {
            InboundMessage::Chosen(ChoiceNotice::Actor(actor)) => {
                assert_eq!(actor.uri.to_string(), actor_uri());
                assert_eq!(actor.nickname.as_deref(), Some("alice"));
            }
            other => panic!("Expected chosen actor, got {other:?}"),
        }
    }

    #[test]
    fn test_chosen_padded_reference_kept_verbatim() {
        let padded = format!("{}=", actor_uri());
        let raw = format!(r#"{{"chosen":{{"uri":"{padded}"}}}}"#);
        match decode_inbound(&raw).unwrap() {
            InboundMessage::Chosen(ChoiceNotice::Actor(actor)) => {
                assert_eq!(actor.uri.as_str(), padded);
                assert_eq!(actor.uri.public_key(), &[5u8; 32]);
            }
            other => panic!("Expected chosen actor, got {other:?}"),
        }
    }

    #[test]
    fn test_chosen_bare_string() {
        let raw = format!(r#"{{"chosen":"{}"}}"#, actor_uri());
        match decode_inbound(&raw).unwrap() {
            InboundMessage::Chosen(ChoiceNotice::Actor(actor)) => {
                assert!(actor.nickname.is_none());
            }
            other => panic!("Expected chosen actor, got {other:?}"),
        }
    }

    #[test]
    fn test_chosen_null_variants_are_empty() {
        for raw in [
            r#"{"chosen":null}"#,
            r#"{"chosen":{"uri":null}}"#,
            r#"{"chosen":{"uri":""}}"#,
        ] {
            assert_eq!(
                decode_inbound(raw),
                Some(InboundMessage::Chosen(ChoiceNotice::Empty)),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_chosen_malformed_reference() {
        let msg = decode_inbound(r#"{"chosen":{"uri":"actor:short"}}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Chosen(ChoiceNotice::Invalid("actor:short".to_string()))
        );
    }

    #[test]
    fn test_canceled() {
        assert_eq!(
            decode_inbound(r#"{"canceled":true}"#),
            Some(InboundMessage::Canceled)
        );
        assert_eq!(decode_inbound(r#"{"canceled":false}"#), None);
    }

    #[test]
    fn test_unrecognized_shapes_dropped() {
        for raw in [
            "",
            "not json",
            "42",
            "[]",
            "{}",
            r#"{"ready":true}"#,
            r#"{"messageID":7,"reply":"x"}"#,
            r#"{"messageID":"","reply":"x"}"#,
        ] {
            assert_eq!(decode_inbound(raw), None, "{raw}");
        }
    }
}
