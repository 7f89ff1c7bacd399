//! Confirmation codes for the mobile confirmation protocol.
//!
//! The code is base64(HMAC-SHA1(identity_secret, time_be64 || tag)). The
//! whole digest is used; there is no truncation.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::steam_guard::mac;
use crate::steam_guard::secret::decode_secret;
use crate::steam_guard::types::*;

/// Tags the confirmation endpoints sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationTag {
    /// Listing pending confirmations.
    Conf,
    /// Fetching details for one confirmation.
    Details,
    /// Accepting a confirmation.
    Allow,
    /// Declining a confirmation.
    Cancel,
}

impl ConfirmationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conf => "conf",
            Self::Details => "details",
            Self::Allow => "allow",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for ConfirmationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ConfirmationTag {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Build the signed payload: 8-byte big-endian time followed by the tag bytes.
fn confirmation_payload(time: u64, tag: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8 + tag.len());
    payload.extend_from_slice(&time.to_be_bytes());
    payload.extend_from_slice(tag.as_bytes());
    payload
}

/// Generate a confirmation code for `time` and `tag`. An empty tag signs the
/// timestamp alone.
pub fn generate_confirmation_code<'a>(
    identity_secret: impl Into<Secret<'a>>,
    time: u64,
    tag: impl AsRef<str>,
) -> Result<String, GuardError> {
    let key = decode_secret(identity_secret)?;
    let payload = confirmation_payload(time, tag.as_ref());
    let digest = mac::hmac_sha1(&key, &payload).map_err(GuardError::generation)?;
    Ok(STANDARD.encode(digest))
}
