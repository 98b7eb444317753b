use crate::error::{Error, Result};

/// Validates a key ID or fingerprint before passing it to gpg.
///
/// Accepted formats:
/// - 8 hex characters (short key ID, discouraged due to collisions)
/// - 16 hex characters (long key ID)
/// - 32 hex characters (v3 fingerprint)
/// - 40 hex characters (v4 fingerprint, recommended)
/// - 64 hex characters (v5 fingerprint)
/// - Any of the above with "0x" prefix
///
/// Returns the normalized keyid (uppercase, no prefix) on success.
pub fn validate_keyid(keyid: &str) -> Result<String> {
    if keyid.is_empty() {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID cannot be empty".to_string(),
        });
    }

    let normalized = keyid
        .strip_prefix("0x")
        .or_else(|| keyid.strip_prefix("0X"))
        .unwrap_or(keyid)
        .to_uppercase();

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID must contain only hexadecimal characters".to_string(),
        });
    }

    match normalized.len() {
        8 | 16 | 32 | 40 | 64 => Ok(normalized),
        len => Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: format!("key ID must be 8, 16, 32, 40 or 64 hex characters (got {})", len),
        }),
    }
}

/// Validates a full fingerprint (32, 40 or 64 hex characters).
///
/// Returns the normalized fingerprint (uppercase, no prefix) on success.
pub fn validate_fingerprint(fpr: &str) -> Result<String> {
    let normalized = validate_keyid(fpr)?;
    match normalized.len() {
        32 | 40 | 64 => Ok(normalized),
        len => Err(Error::InvalidKeyId {
            keyid: fpr.to_string(),
            reason: format!("expected a full fingerprint, got a {len}-character key ID"),
        }),
    }
}

/// Splits a space-separated list of key IDs and validates each one.
pub fn split_key_ids(keyids: &str) -> Result<Vec<String>> {
    let validated: Vec<String> = keyids
        .split_whitespace()
        .map(validate_keyid)
        .collect::<Result<_>>()?;

    if validated.is_empty() {
        return Err(Error::InvalidKeyId {
            keyid: keyids.to_string(),
            reason: "no key ID given".to_string(),
        });
    }

    Ok(validated)
}
