//! Steam Guard crate: sub-modules.

pub mod types;
pub mod mac;
pub mod secret;
pub mod core;
pub mod confirmation;
pub mod device;
pub mod time_sync;

// Re-export top-level items for convenience.
pub use types::*;
pub use mac::{hmac_digest, hmac_with, KeyedHasher};
pub use secret::{decode_secret, sniff_encoding, SecretEncoding};
pub use self::core::{
    current_time, generate_auth_code, generate_auth_code_at, seconds_remaining,
    verify_auth_code, verify_auth_code_at,
};
pub use confirmation::{generate_confirmation_code, ConfirmationTag};
pub use device::get_device_id;
pub use time_sync::{
    get_time_offset, ReqwestTransport, TimeSyncClient, TimeSyncConfig, TimeTransport,
    DEFAULT_TIME_ENDPOINT,
};
