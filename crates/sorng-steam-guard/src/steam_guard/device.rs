//! Device identifiers.
//!
//! `android:` followed by the SHA-1 of the decoded account identifier,
//! rendered as lowercase hex in 8-4-4-4-12 groups. It looks like a UUID but
//! is a deterministic hash.

use sha1::{Digest, Sha1};

use crate::steam_guard::secret::decode_secret;
use crate::steam_guard::types::*;

/// Hex group lengths of the hyphenated form.
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Derive the device ID for an account identifier.
///
/// The identifier is run through the same hex/base64 sniffing as secrets,
/// so a plain numeric ID is base64-decoded before hashing.
pub fn get_device_id<'a>(identifier: impl Into<Secret<'a>>) -> Result<String, GuardError> {
    let bytes = decode_secret(identifier)?;
    let digest = hex::encode(Sha1::digest(&bytes));

    let mut out = String::with_capacity(DEVICE_ID_PREFIX.len() + 36);
    out.push_str(DEVICE_ID_PREFIX);
    let mut pos = 0;
    for (i, len) in GROUPS.iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        out.push_str(&digest[pos..pos + len]);
        pos += len;
    }
    Ok(out)
}
