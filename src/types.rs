use std::collections::HashMap;

use chrono::NaiveDate;

/// Signer name gpg prints when the issuing key is not in the keyring.
pub const UNKNOWN_SIGNER: &str = "[User ID not found]";

/// A certification signature on a user ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    /// Signer's user ID, decoded. May be [`UNKNOWN_SIGNER`].
    pub signer_uid: String,
    /// Creation date in UTC.
    pub created: Option<NaiveDate>,
    pub signer_keyid: String,
    /// Signature class as printed by gpg, e.g. `13x` or `10l`.
    pub sig_class: String,
    pub signer_known: bool,
}

impl SignatureRecord {
    /// Signatures whose class starts with `1f` (any case) are treated as
    /// revoked and left out of reports.
    pub fn is_revocation_class(sig_class: &str) -> bool {
        sig_class
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("1f"))
    }
}

/// Whether an identity is a textual user ID or a user attribute (photo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    UserId,
    Attribute,
}

/// A user ID or user attribute attached to a public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEntry {
    pub kind: IdentityKind,
    /// Decoded user ID, or the localized photo label for attributes.
    pub uid: String,
    /// The user ID field exactly as gpg printed it.
    pub raw_uid: String,
    /// Hash gpg uses to identify the user ID (field 8).
    pub uid_hash: String,
    /// Key ID of the owning primary key.
    pub keyid: String,
    /// Fingerprint of the owning primary key.
    pub fingerprint: String,
    /// Self-signature creation date in UTC.
    pub created: Option<NaiveDate>,
    pub signatures: Vec<SignatureRecord>,
}

/// Identities of a single key, in the order gpg listed them.
///
/// Entries are keyed by their raw user ID. Inserting an identity whose raw
/// user ID is already present replaces the earlier entry in place, dropping
/// the signatures collected for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureReport {
    entries: Vec<IdentityEntry>,
    index: HashMap<String, usize>,
}

impl SignatureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, raw_uid: &str) -> Option<&IdentityEntry> {
        self.index.get(raw_uid).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, raw_uid: &str) -> Option<&mut IdentityEntry> {
        self.index.get(raw_uid).map(|&i| &mut self.entries[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IdentityEntry> {
        self.entries.iter()
    }

    /// Inserts `entry`, replacing any identity with the same raw user ID.
    /// Returns the replaced entry.
    pub fn insert(&mut self, entry: IdentityEntry) -> Option<IdentityEntry> {
        match self.index.get(&entry.raw_uid) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], entry)),
            None => {
                self.index.insert(entry.raw_uid.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }
}

impl<'a> IntoIterator for &'a SignatureReport {
    type Item = &'a IdentityEntry;
    type IntoIter = std::slice::Iter<'a, IdentityEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for SignatureReport {
    type Item = IdentityEntry;
    type IntoIter = std::vec::IntoIter<IdentityEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Outcome of a minimal key export.
///
/// These are soft failures: the caller may show the message and retry the
/// export later. [`ExportStatus::NoUsableSubkey`] is deterministic for a
/// given key and should not be retried in a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ExportStatus {
    Success,
    /// Stripping the exported key left no usable encryption subkey.
    NoUsableSubkey,
    /// gpg did not confirm the export.
    ExportVerificationFailed,
}

impl ExportStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NoUsableSubkey => 1,
            Self::ExportVerificationFailed => 2,
        }
    }
}

/// Result of [`MinimalKeyExporter::get_minimal_public_key`].
///
/// [`MinimalKeyExporter::get_minimal_public_key`]: crate::MinimalKeyExporter::get_minimal_public_key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimalKeyExport {
    /// 0 on success, see [`ExportStatus::exit_code`].
    pub exit_code: i32,
    /// Localized message, empty on success.
    pub error_message: String,
    /// Base64 of the minimized binary key.
    pub key_data: Option<String>,
}

impl MinimalKeyExport {
    pub(crate) fn success(key_data: String) -> Self {
        Self {
            exit_code: 0,
            error_message: String::new(),
            key_data: Some(key_data),
        }
    }

    pub(crate) fn failure(status: ExportStatus, error_message: String) -> Self {
        Self {
            exit_code: status.exit_code(),
            error_message,
            key_data: None,
        }
    }

    pub fn status(&self) -> ExportStatus {
        match self.exit_code {
            0 => ExportStatus::Success,
            1 => ExportStatus::NoUsableSubkey,
            _ => ExportStatus::ExportVerificationFailed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Options for the minimal key export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Timeout for the whole export, in seconds.
    /// If None, no timeout is applied.
    pub timeout_secs: Option<u64>,
}
