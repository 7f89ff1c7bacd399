//! HMAC engine.
//!
//! Keyed-hash digests over arbitrary byte messages with SHA-1, SHA-256 or
//! SHA-512. Everything here is pure: no clock, no I/O.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::steam_guard::types::*;

/// Incremental keyed-hash context.
///
/// `new` imports the key, `update` absorbs message bytes, `finalize`
/// produces the digest.
#[derive(Clone)]
pub enum KeyedHasher {
    Sha1(Hmac<Sha1>),
    Sha256(Hmac<Sha256>),
    Sha512(Hmac<Sha512>),
}

impl KeyedHasher {
    pub fn new(algo: Algorithm, key: &[u8]) -> Result<Self, GuardError> {
        let hasher = match algo {
            Algorithm::Sha1 => Self::Sha1(Hmac::<Sha1>::new_from_slice(key).map_err(key_error)?),
            Algorithm::Sha256 => {
                Self::Sha256(Hmac::<Sha256>::new_from_slice(key).map_err(key_error)?)
            }
            Algorithm::Sha512 => {
                Self::Sha512(Hmac::<Sha512>::new_from_slice(key).map_err(key_error)?)
            }
        };
        Ok(hasher)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Sha1(_) => Algorithm::Sha1,
            Self::Sha256(_) => Algorithm::Sha256,
            Self::Sha512(_) => Algorithm::Sha512,
        }
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        match self {
            Self::Sha1(mac) => mac.update(data),
            Self::Sha256(mac) => mac.update(data),
            Self::Sha512(mac) => mac.update(data),
        }
        self
    }

    pub fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha1(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha256(mac) => mac.finalize().into_bytes().to_vec(),
            Self::Sha512(mac) => mac.finalize().into_bytes().to_vec(),
        }
    }
}

fn key_error(e: hmac::digest::InvalidLength) -> GuardError {
    GuardError::new(GuardErrorKind::KeyMaterialError, "HMAC rejected the key")
        .with_detail(e.to_string())
}

/// Compute HMAC(key, message) for an algorithm given by name.
pub fn hmac_digest(key: &[u8], message: &[u8], algorithm: &str) -> Result<Vec<u8>, GuardError> {
    let algo = Algorithm::from_str_loose(algorithm)
        .ok_or_else(|| GuardError::unsupported_algorithm(algorithm))?;
    hmac_with(key, message, algo)
}

/// Compute HMAC(key, message) with a typed algorithm.
pub fn hmac_with(key: &[u8], message: &[u8], algo: Algorithm) -> Result<Vec<u8>, GuardError> {
    let mut hasher = KeyedHasher::new(algo, key)?;
    hasher.update(message);
    Ok(hasher.finalize())
}

/// HMAC-SHA1 into a fixed-size buffer.
pub fn hmac_sha1(key: &[u8], message: &[u8]) -> Result<[u8; SHA1_DIGEST_LEN], GuardError> {
    let digest = hmac_with(key, message, Algorithm::Sha1)?;
    let mut out = [0u8; SHA1_DIGEST_LEN];
    out.copy_from_slice(&digest);
    Ok(out)
}
