//! Secret decoding.
//!
//! Shared secrets and identity secrets arrive either as raw bytes or as
//! text. Text is hex when it is exactly 40 hex digits (a SHA-1 sized key),
//! and base64 otherwise. The same rule is applied to device identifiers.
//!
//! A base64 secret that happens to be 40 hex-safe characters is read as hex.
//! Existing secrets were issued under that rule, so it stays.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::steam_guard::types::*;

/// Length of a hex-encoded SHA-1 sized secret.
const HEX_SECRET_LEN: usize = 40;

/// Standard alphabet, padding optional, non-zero trailing bits tolerated.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// How a text secret is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEncoding {
    Hex,
    Base64,
}

/// Decide how a text secret is encoded.
///
/// An exact 40-character hex string (any case) wins; everything else is
/// treated as base64.
pub fn sniff_encoding(s: &str) -> SecretEncoding {
    if s.len() == HEX_SECRET_LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        SecretEncoding::Hex
    } else {
        SecretEncoding::Base64
    }
}

/// Turn a caller-supplied secret into key bytes.
pub fn decode_secret<'a>(secret: impl Into<Secret<'a>>) -> Result<Vec<u8>, GuardError> {
    match secret.into() {
        Secret::Bytes(b) => Ok(b.to_vec()),
        Secret::Encoded(s) => match sniff_encoding(s) {
            SecretEncoding::Hex => hex::decode(s).map_err(|e| {
                GuardError::decode("Invalid hex secret").with_detail(e.to_string())
            }),
            SecretEncoding::Base64 => decode_base64(s),
        },
    }
}

fn decode_base64(s: &str) -> Result<Vec<u8>, GuardError> {
    let unpadded = s.trim_end_matches('=');
    // A lone trailing symbol carries fewer than 8 bits; drop it.
    let usable = if unpadded.len() % 4 == 1 && unpadded.as_bytes()[unpadded.len() - 1].is_ascii() {
        &unpadded[..unpadded.len() - 1]
    } else {
        unpadded
    };
    LENIENT_BASE64
        .decode(usable)
        .map_err(|e| GuardError::decode("Invalid base64 secret").with_detail(e.to_string()))
}
