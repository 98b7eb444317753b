use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::decode::TextDecoder;
use crate::error::{Error, Result};
use crate::locale::{Locale, Message};
use crate::types::{IdentityEntry, IdentityKind, SignatureRecord, SignatureReport, UNKNOWN_SIGNER};

// Field positions in `--with-colons` records.
const RECORD_TYPE: usize = 0;
const KEY_ID: usize = 4;
const CREATED: usize = 5;
const UID_HASH: usize = 7;
const USER_ID: usize = 9;
const SIG_CLASS: usize = 10;

/// Builds a [`SignatureReport`] from `gpg --with-colons --fixed-list-mode
/// --with-fingerprint --list-sigs` output.
///
/// Only the first public key is reported: parsing stops at a second `pub`
/// record. Signatures are attached to the user ID or attribute listed
/// before them; revoked ones (class `1f...`) are dropped, and so are
/// signatures by unknown signers when `ignore_unknown_signers` is set.
///
/// A `sig` record that survives those filters but comes before any
/// `uid`/`uat` record yields [`Error::MalformedReport`].
pub fn parse_signature_report(
    output: &str,
    ignore_unknown_signers: bool,
    decoder: &dyn TextDecoder,
    locale: &dyn Locale,
) -> Result<SignatureReport> {
    let mut report = SignatureReport::new();
    let mut have_pub = false;
    let mut current_uid: Option<String> = None;
    let mut keyid = String::new();
    let mut fingerprint = String::new();

    for (idx, line) in output.lines().enumerate() {
        let fields: Vec<&str> = line.split(':').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("");

        match field(RECORD_TYPE) {
            "pub" => {
                if have_pub {
                    debug!(line = idx + 1, "second public key in report, stopping");
                    return Ok(report);
                }
                have_pub = true;
                keyid = field(KEY_ID).to_string();
            }
            "fpr" => {
                if fingerprint.is_empty() {
                    fingerprint = field(USER_ID).to_string();
                }
            }
            record @ ("uid" | "uat") => {
                let raw_uid = field(USER_ID).to_string();
                let (kind, uid) = if record == "uat" {
                    (IdentityKind::Attribute, locale.message(Message::PhotoLabel))
                } else {
                    (IdentityKind::UserId, decoder.decode(&raw_uid))
                };

                current_uid = Some(raw_uid.clone());
                let replaced = report.insert(IdentityEntry {
                    kind,
                    uid,
                    raw_uid,
                    uid_hash: field(UID_HASH).to_string(),
                    keyid: keyid.clone(),
                    fingerprint: fingerprint.clone(),
                    created: parse_timestamp(field(CREATED)),
                    signatures: Vec::new(),
                });
                if replaced.is_some() {
                    debug!(line = idx + 1, "duplicate user ID replaces earlier entry");
                }
            }
            "sig" => {
                // Direct-key signatures (class 1f) sit between pub and the
                // first uid; they are dropped before routing.
                let sig_class = field(SIG_CLASS);
                if SignatureRecord::is_revocation_class(sig_class) {
                    continue;
                }

                let raw_signer = field(USER_ID);
                let signer_known = raw_signer != UNKNOWN_SIGNER;
                if ignore_unknown_signers && !signer_known {
                    continue;
                }

                let Some(uid) = current_uid.as_deref() else {
                    return Err(Error::MalformedReport {
                        line: idx + 1,
                        reason: "signature record before any user ID".to_string(),
                    });
                };

                let signature = SignatureRecord {
                    signer_uid: decoder.decode(raw_signer),
                    created: parse_timestamp(field(CREATED)),
                    signer_keyid: field(KEY_ID).to_string(),
                    sig_class: sig_class.to_string(),
                    signer_known,
                };

                if let Some(entry) = report.get_mut(uid) {
                    entry.signatures.push(signature);
                }
            }
            "" => {}
            other => {
                debug!(record_type = other, "skipping unhandled GPG record type");
            }
        }
    }

    Ok(report)
}

/// Parses a gpg timestamp: seconds since the epoch, or the ISO 8601 basic
/// form (`20240101T120000`) used by some gpg versions.
///
/// The date is taken in UTC, independent of the local time zone.
pub fn parse_timestamp(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if s.contains('T') {
        return NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.date());
    }
    s.parse::<i64>()
        .ok()
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.date_naive())
}
