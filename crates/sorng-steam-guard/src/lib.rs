//! # SortOfRemote NG – Steam Guard
//!
//! Steam Guard compatible one-time codes, computed locally:
//!
//! - **Auth codes** – 5-symbol TOTP codes (HMAC-SHA1, 30 s step, custom alphabet)
//! - **Confirmation codes** – base64 HMAC over time + tag for mobile confirmations
//! - **Device IDs** – deterministic `android:` identifiers derived from an account ID
//! - **Time sync** – clock offset probe against the `QueryTime` service
//! - **HMAC engine** – SHA-1 / SHA-256 / SHA-512 keyed digests, one-shot or incremental

pub mod steam_guard;
