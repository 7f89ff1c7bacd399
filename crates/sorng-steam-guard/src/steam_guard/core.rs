//! Auth code generation.
//!
//! TOTP over HMAC-SHA1 with a 30-second step, RFC 4226 dynamic truncation,
//! and a five-symbol base-26 rendering instead of decimal digits.

use crate::steam_guard::mac;
use crate::steam_guard::secret::decode_secret;
use crate::steam_guard::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw code from key + counter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the auth code for raw key bytes and a time-step counter.
pub fn auth_code_for_counter(key: &[u8], counter: u64) -> Result<String, GuardError> {
    let digest = mac::hmac_sha1(key, &counter.to_be_bytes()).map_err(GuardError::generation)?;
    Ok(encode_code(truncate(&digest)))
}

/// Dynamic truncation per RFC 4226 §5.3, sign bit cleared.
fn truncate(digest: &[u8; SHA1_DIGEST_LEN]) -> u32 {
    let offset = (digest[SHA1_DIGEST_LEN - 1] & 0x0f) as usize;
    let window = [
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ];
    u32::from_be_bytes(window) & 0x7fff_ffff
}

/// Render the truncated value as five alphabet symbols, low digit first.
fn encode_code(mut full_code: u32) -> String {
    let radix = AUTH_CODE_ALPHABET.len() as u32;
    let mut code = String::with_capacity(AUTH_CODE_LENGTH);
    for _ in 0..AUTH_CODE_LENGTH {
        code.push(AUTH_CODE_ALPHABET[(full_code % radix) as usize] as char);
        full_code /= radix;
    }
    code
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Current unix time in seconds, shifted by `offset` (from a time probe).
pub fn current_time(offset: i64) -> u64 {
    apply_offset(current_unix_time(), offset)
}

/// Shift a timestamp, clamping at the ends of the `u64` range.
pub fn apply_offset(unix_seconds: u64, offset: i64) -> u64 {
    if offset >= 0 {
        unix_seconds.saturating_add(offset as u64)
    } else {
        unix_seconds.saturating_sub(offset.unsigned_abs())
    }
}

/// Time-step counter for a unix timestamp.
pub fn time_step_at(unix_seconds: u64) -> u64 {
    unix_seconds / TIME_STEP_SECS
}

/// Seconds until the code for this timestamp rolls over.
pub fn seconds_remaining_at(unix_seconds: u64) -> u32 {
    (TIME_STEP_SECS - (unix_seconds % TIME_STEP_SECS)) as u32
}

/// Seconds until the current code rolls over.
pub fn seconds_remaining(offset: i64) -> u32 {
    seconds_remaining_at(current_time(offset))
}

/// Current unix timestamp in seconds.
pub(crate) fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Auth codes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate the auth code for now, corrected by `time_offset` seconds.
pub fn generate_auth_code<'a>(
    secret: impl Into<Secret<'a>>,
    time_offset: i64,
) -> Result<String, GuardError> {
    generate_auth_code_at(secret, current_time(time_offset))
}

/// Generate the auth code valid at an explicit unix timestamp.
pub fn generate_auth_code_at<'a>(
    secret: impl Into<Secret<'a>>,
    unix_seconds: u64,
) -> Result<String, GuardError> {
    let key = decode_secret(secret)?;
    let counter = time_step_at(unix_seconds);
    log::debug!("generating auth code for time step {}", counter);
    auth_code_for_counter(&key, counter)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Check an auth code, allowing `drift_window` steps either side of now.
pub fn verify_auth_code<'a>(
    secret: impl Into<Secret<'a>>,
    code: &str,
    drift_window: u32,
    time_offset: i64,
) -> Result<VerifyResult, GuardError> {
    verify_auth_code_at(secret, code, drift_window, current_time(time_offset))
}

/// Verify at a specific timestamp.
pub fn verify_auth_code_at<'a>(
    secret: impl Into<Secret<'a>>,
    code: &str,
    drift_window: u32,
    unix_seconds: u64,
) -> Result<VerifyResult, GuardError> {
    let key = decode_secret(secret)?;
    let base_counter = time_step_at(unix_seconds);

    let code = code.trim().to_ascii_uppercase();
    if code.len() != AUTH_CODE_LENGTH || !code.bytes().all(|b| AUTH_CODE_ALPHABET.contains(&b)) {
        return Ok(VerifyResult {
            valid: false,
            drift: 0,
            matched_counter: None,
        });
    }

    let start = base_counter.saturating_sub(drift_window as u64);
    let end = base_counter.saturating_add(drift_window as u64);

    for c in start..=end {
        let generated = auth_code_for_counter(&key, c)?;
        if constant_time_eq(generated.as_bytes(), code.as_bytes()) {
            return Ok(VerifyResult {
                valid: true,
                drift: c as i64 - base_counter as i64,
                matched_counter: Some(c),
            });
        }
    }

    Ok(VerifyResult {
        valid: false,
        drift: 0,
        matched_counter: None,
    })
}

/// Constant-time comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // Secret: "12345678901234567890" (ASCII), the RFC 4226 test key.
    const KEY: &[u8] = b"12345678901234567890";
    const KEY_B64: &str = "MTIzNDU2Nzg5MDEyMzQ1Njc4OTA=";
    const KEY_HEX: &str = "3132333435363738393031323334353637383930";

    // ── Known vectors ────────────────────────────────────────────

    #[test]
    fn known_auth_codes() {
        let cases = [
            (0u64, "GG5F5"),
            (59, "PV9M4"),
            (1_111_111_109, "PY4YB"),
            (1_700_000_000, "R87JJ"),
            (20_000_000_000, "R5DMB"),
        ];
        for (t, exp) in cases {
            let code = generate_auth_code_at(KEY_B64, t).unwrap();
            assert_eq!(code, exp, "auth code mismatch at t={}", t);
        }
    }

    #[test]
    fn raw_counter_vector() {
        // Base32 "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP", counter 57856320.
        let key = decode_secret("SGVsbG8h3q2+70hlbGxvId6tvu8=").unwrap();
        assert_eq!(auth_code_for_counter(&key, 57_856_320).unwrap(), "R6Q5N");
    }

    #[test]
    fn all_secret_forms_agree() {
        let from_bytes = generate_auth_code_at(KEY, 1_700_000_000).unwrap();
        let from_hex = generate_auth_code_at(KEY_HEX, 1_700_000_000).unwrap();
        let from_b64 = generate_auth_code_at(KEY_B64, 1_700_000_000).unwrap();
        assert_eq!(from_bytes, from_hex);
        assert_eq!(from_hex, from_b64);
    }

    // ── Shape ────────────────────────────────────────────────────

    #[test]
    fn codes_use_only_the_alphabet() {
        for t in (0..3000u64).step_by(30) {
            let code = generate_auth_code_at(KEY, t * 7919).unwrap();
            assert_eq!(code.len(), AUTH_CODE_LENGTH);
            assert!(code.bytes().all(|b| AUTH_CODE_ALPHABET.contains(&b)), "{}", code);
        }
    }

    #[test]
    fn encode_code_low_digit_first() {
        assert_eq!(encode_code(0), "22222");
        assert_eq!(encode_code(1), "32222");
        assert_eq!(encode_code(26), "23222");
        assert_eq!(encode_code(25), "Y2222");
    }

    #[test]
    fn truncate_clears_sign_bit() {
        let mut digest = [0xffu8; SHA1_DIGEST_LEN];
        digest[SHA1_DIGEST_LEN - 1] = 0xff;
        assert_eq!(truncate(&digest), 0x7fff_ffff);
        let mut digest = [0u8; SHA1_DIGEST_LEN];
        digest[SHA1_DIGEST_LEN - 1] = 0x00;
        digest[0..4].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(truncate(&digest), 0x1234_5678);
    }

    #[test]
    fn empty_key_still_generates() {
        let code = generate_auth_code_at(&[] as &[u8], 59).unwrap();
        assert_eq!(code.len(), AUTH_CODE_LENGTH);
    }

    // ── Windows ──────────────────────────────────────────────────

    #[test]
    fn same_window_same_code() {
        // 1_700_000_010 ..= 1_700_000_039 is counter 56666667.
        let a = generate_auth_code_at(KEY, 1_700_000_010).unwrap();
        let b = generate_auth_code_at(KEY, 1_700_000_039).unwrap();
        assert_eq!(a, b);
        assert_eq!(time_step_at(1_700_000_039), time_step_at(1_700_000_010));
        let c = generate_auth_code_at(KEY, 1_700_000_040).unwrap();
        assert_eq!(time_step_at(1_700_000_040), time_step_at(1_700_000_010) + 1);
        assert_ne!(a, c);
    }

    #[test]
    fn offset_shifts_the_window() {
        let now = current_unix_time();
        let ahead = generate_auth_code(KEY, 3600).unwrap();
        let expected = generate_auth_code_at(KEY, now + 3600).unwrap();
        // A window boundary can fall between the two clock reads.
        let next = generate_auth_code_at(KEY, now + 3600 + TIME_STEP_SECS).unwrap();
        assert!(ahead == expected || ahead == next);
    }

    #[test]
    fn apply_offset_saturates() {
        assert_eq!(apply_offset(100, -30), 70);
        assert_eq!(apply_offset(10, -30), 0);
        assert_eq!(apply_offset(u64::MAX - 1, 30), u64::MAX);
        assert_eq!(apply_offset(5, i64::MIN), 0);
    }

    #[test]
    fn far_future_counter() {
        let code = generate_auth_code_at(KEY, u64::MAX).unwrap();
        assert_eq!(code.len(), AUTH_CODE_LENGTH);
    }

    #[test]
    fn time_step_calculation() {
        assert_eq!(time_step_at(0), 0);
        assert_eq!(time_step_at(29), 0);
        assert_eq!(time_step_at(30), 1);
        assert_eq!(time_step_at(59), 1);
        assert_eq!(time_step_at(60), 2);
    }

    #[test]
    fn seconds_remaining_calculation() {
        assert_eq!(seconds_remaining_at(0), 30);
        assert_eq!(seconds_remaining_at(1), 29);
        assert_eq!(seconds_remaining_at(29), 1);
        assert_eq!(seconds_remaining_at(30), 30);
        let r = seconds_remaining(0);
        assert!((1..=30).contains(&r));
    }

    #[test]
    fn concurrent_generation_is_deterministic() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| generate_auth_code_at(KEY, 1_700_000_000).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "R87JJ");
        }
    }

    // ── Errors ───────────────────────────────────────────────────

    #[test]
    fn malformed_secret_is_decode_error() {
        let err = generate_auth_code("%%%%", 0).unwrap_err();
        assert_eq!(err.kind, GuardErrorKind::DecodeError);
    }

    // ── Verification ─────────────────────────────────────────────

    #[test]
    fn verify_exact() {
        let vr = verify_auth_code_at(KEY, "PV9M4", 0, 59).unwrap();
        assert!(vr.valid);
        assert_eq!(vr.drift, 0);
        assert_eq!(vr.matched_counter, Some(1));
    }

    #[test]
    fn verify_with_drift() {
        // Step 0 code checked at step 1.
        let vr = verify_auth_code_at(KEY, "GG5F5", 1, 59).unwrap();
        assert!(vr.valid);
        assert_eq!(vr.drift, -1);
    }

    #[test]
    fn verify_is_case_insensitive() {
        let vr = verify_auth_code_at(KEY, " pv9m4 ", 0, 59).unwrap();
        assert!(vr.valid);
    }

    #[test]
    fn verify_rejects_wrong_code() {
        assert!(!verify_auth_code_at(KEY, "22222", 0, 59).unwrap().valid);
        assert!(!verify_auth_code_at(KEY, "GG5F5", 0, 59).unwrap().valid);
    }

    #[test]
    fn verify_rejects_bad_shape() {
        assert!(!verify_auth_code_at(KEY, "PV9M", 0, 59).unwrap().valid);
        assert!(!verify_auth_code_at(KEY, "PV9M0", 0, 59).unwrap().valid);
    }

    #[test]
    fn verify_current_code() {
        let code = generate_auth_code(KEY, 0).unwrap();
        assert!(verify_auth_code(KEY, &code, 1, 0).unwrap().valid);
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
