//! Async bindings to GnuPG for inspecting key certifications and exporting
//! minimal public keys.
//!
//! gpg is run as a subprocess; its `--with-colons` listings are parsed into
//! Rust types. No cryptography happens in this crate.
//!
//! # Example
//!
//! ```no_run
//! use gnupg_keys::{EngineConfig, Keyring};
//!
//! #[tokio::main]
//! async fn main() -> gnupg_keys::Result<()> {
//!     let keyring = Keyring::new(EngineConfig::detect("gpg").await?);
//!
//!     let report = keyring.get_key_signatures("786C63F330D7CB92", false).await?;
//!     for identity in &report {
//!         println!("{}", identity.uid);
//!         for sig in &identity.signatures {
//!             println!("    {} {}", sig.signer_keyid, sig.signer_uid);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - A `gpg` binary (GnuPG 2.x recommended; 2.1.10 or later lets minimal
//!   exports be verified through status lines)
//! - A [`KeyStripper`] implementation for minimal key exports

mod config;
mod decode;
mod error;
mod execution;
mod export;
mod keyring;
mod locale;
mod parse;
mod types;
mod validation;

pub use config::{EngineConfig, EngineVersion, Feature};
pub use decode::{GpgTextDecoder, TextDecoder};
pub use error::{Error, Result};
pub use execution::{CommandRunner, EngineOutput, StatusFlags, TokioCommandRunner};
pub use export::{KeyStripper, MinimalKeyExporter};
pub use keyring::Keyring;
pub use locale::{EnglishLocale, Locale, Message};
pub use parse::{parse_signature_report, parse_timestamp};
pub use types::{
    ExportOptions, ExportStatus, IdentityEntry, IdentityKind, MinimalKeyExport, SignatureRecord,
    SignatureReport, UNKNOWN_SIGNER,
};
pub use validation::{split_key_ids, validate_fingerprint, validate_keyid};
