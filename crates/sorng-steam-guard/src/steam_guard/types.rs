//! Core types for the Steam Guard code generator.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Symbols used for auth codes. Excludes characters that are easy to misread.
pub const AUTH_CODE_ALPHABET: &[u8; 26] = b"23456789BCDFGHJKMNPQRTVWXY";

/// Number of symbols in an auth code.
pub const AUTH_CODE_LENGTH: usize = 5;

/// Time-step length in seconds.
pub const TIME_STEP_SECS: u64 = 30;

/// Length of a SHA-1 digest in bytes.
pub const SHA1_DIGEST_LEN: usize = 20;

/// Prefix every device ID carries.
pub const DEVICE_ID_PREFIX: &str = "android:";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm backing the keyed MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl Algorithm {
    /// Parse from a case-insensitive name (`sha1`, `SHA-1`, `HmacSHA1`, ...).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => SHA1_DIGEST_LEN,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret input
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Key material as handed in by the caller.
///
/// Raw bytes are used as-is. Strings go through
/// [`sniff_encoding`](crate::steam_guard::secret::sniff_encoding) and are
/// decoded as hex or base64.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Secret<'a> {
    Bytes(&'a [u8]),
    Encoded(&'a str),
}

// Never print key material.
impl fmt::Debug for Secret<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_struct("Secret::Bytes").field("len", &b.len()).finish(),
            Self::Encoded(s) => f.debug_struct("Secret::Encoded").field("len", &s.len()).finish(),
        }
    }
}

impl<'a> From<&'a [u8]> for Secret<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Secret<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Self::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for Secret<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl<'a> From<&'a str> for Secret<'a> {
    fn from(s: &'a str) -> Self {
        Self::Encoded(s)
    }
}

impl<'a> From<&'a String> for Secret<'a> {
    fn from(s: &'a String) -> Self {
        Self::Encoded(s)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time offset
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Body of the `QueryTime` response. Only `server_time` is consumed; the
/// remaining fields (skew tolerance, probe frequency and retry hints) are
/// kept as opaque pass-through data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTimeResponse {
    /// Server Unix time in seconds, as reported.
    pub server_time: u64,
    /// Every other field of the `response` object.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub hints: serde_json::Map<String, serde_json::Value>,
}

impl QueryTimeResponse {
    /// Look up a pass-through hint as an integer. The server reports some
    /// of these as strings.
    pub fn hint_u64(&self, name: &str) -> Option<u64> {
        match self.hints.get(name)? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Clock skew against the server, measured from one round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffset {
    /// `server_time - local_time`, in seconds.
    pub offset: i64,
    /// Round-trip duration in milliseconds.
    pub latency: u64,
    /// The full server response.
    pub server: QueryTimeResponse,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of checking an auth code against a secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    /// How many time-steps off the match was (0 = exact).
    pub drift: i64,
    /// The counter value that matched (if any).
    pub matched_counter: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardErrorKind {
    /// Algorithm name not recognised by the HMAC engine.
    UnsupportedAlgorithm,
    /// The MAC primitive rejected the key.
    KeyMaterialError,
    /// Secret was not valid hex / base64.
    DecodeError,
    /// Code generation failed in the MAC layer.
    GenerationFailed,
    /// Request could not be sent, timed out, or got a non-success status.
    TransportError,
    /// Response was JSON but not the expected shape.
    ResponseFormat,
    /// Response body was not JSON at all.
    MalformedJson,
    InvalidConfig,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardError {
    pub kind: GuardErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub status_code: Option<u16>,
    /// Kind of the underlying failure, for wrapped errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<GuardErrorKind>,
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for GuardError {}

impl GuardError {
    pub fn new(kind: GuardErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
            status_code: None,
            source_kind: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn unsupported_algorithm(name: &str) -> Self {
        Self::new(
            GuardErrorKind::UnsupportedAlgorithm,
            format!("Unsupported HMAC algorithm '{}'", name),
        )
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(GuardErrorKind::DecodeError, msg)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(GuardErrorKind::TransportError, msg)
    }

    pub fn response_format(msg: impl Into<String>) -> Self {
        Self::new(GuardErrorKind::ResponseFormat, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(GuardErrorKind::InvalidConfig, msg)
    }

    /// Wrap a MAC-layer failure raised while generating a code.
    pub fn generation(cause: GuardError) -> Self {
        let mut err = Self::new(
            GuardErrorKind::GenerationFailed,
            format!("Failed to generate code: {:?}", cause.kind),
        )
        .with_detail(cause.to_string());
        err.source_kind = Some(cause.kind);
        err
    }

    /// True for any error caused by the shape or syntax of a server response.
    pub fn is_response_format(&self) -> bool {
        matches!(
            self.kind,
            GuardErrorKind::ResponseFormat | GuardErrorKind::MalformedJson
        )
    }

    pub fn is_transport(&self) -> bool {
        self.kind == GuardErrorKind::TransportError
    }
}

impl From<GuardError> for String {
    fn from(e: GuardError) -> String {
        e.to_string()
    }
}

impl From<reqwest::Error> for GuardError {
    fn from(e: reqwest::Error) -> Self {
        let err = if e.is_timeout() {
            Self::transport(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            Self::transport(format!("Connection failed: {}", e))
        } else {
            Self::transport(format!("HTTP error: {}", e))
        };
        match e.status() {
            Some(status) => err.with_status(status.as_u16()),
            None => err,
        }
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(GuardErrorKind::MalformedJson, "Response is not valid JSON")
            .with_detail(e.to_string())
    }
}
