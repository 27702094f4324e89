//! Binary-to-text codec for the string-only channel.
//!
//! Bytes travel as URL-safe base64 (`-` and `_` instead of `+` and `/`).
//! Encoding never emits `=` padding. Decoding accepts padded and unpadded
//! text alike, but rejects anything outside the URL-safe alphabet, and a
//! final symbol whose unused low bits are not zero.

use crate::error::{BridgeError, BridgeResult};
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

const DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded URL-safe base64.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64, with or without trailing padding.
pub fn decode(text: &str) -> BridgeResult<Vec<u8>> {
    DECODER
        .decode(text)
        .map_err(|e| BridgeError::MalformedEncoding(format!("{e} in {text:?}")))
}
