use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::config::{EngineConfig, Feature};
use crate::error::{Error, Result};
use crate::execution::CommandRunner;
use crate::locale::{Locale, Message};
use crate::types::{ExportOptions, ExportStatus, MinimalKeyExport};
use crate::validation::validate_fingerprint;

/// Exports shorter than this are treated as failed on gpg versions that
/// do not report `EXPORTED` status lines.
const MIN_ARMORED_LEN: usize = 50;

/// Reduces an armored public key to its primary user ID and newest
/// encryption subkey.
#[async_trait]
pub trait KeyStripper: Send + Sync {
    /// Returns the minimized key in binary form, or `None` if the key has
    /// no usable encryption subkey.
    async fn strip_key(&self, armored: &str) -> Option<Vec<u8>>;
}

enum ExportFailure {
    Soft(MinimalKeyExport),
    Engine(Error),
}

impl From<Error> for ExportFailure {
    fn from(err: Error) -> Self {
        Self::Engine(err)
    }
}

/// Exports minimal public keys and remembers the result per fingerprint.
///
/// Concurrent calls for the same fingerprint share one gpg run. Only
/// successful exports are cached; a failed export is retried by the next
/// call.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # async fn example(stripper: Arc<dyn gnupg_keys::KeyStripper>) -> gnupg_keys::Result<()> {
/// use gnupg_keys::{EngineConfig, Keyring};
///
/// let keyring = Keyring::new(EngineConfig::detect("gpg").await?);
/// let exporter = keyring.minimal_key_exporter(stripper);
///
/// let export = exporter
///     .get_minimal_public_key("ABAF11C65A2970B130ABE3C479BE3E4300411886")
///     .await?;
/// if export.is_success() {
///     println!("{}", export.key_data.unwrap_or_default());
/// } else {
///     eprintln!("{}", export.error_message);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MinimalKeyExporter {
    config: EngineConfig,
    runner: Arc<dyn CommandRunner>,
    stripper: Arc<dyn KeyStripper>,
    locale: Arc<dyn Locale>,
    cache: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl MinimalKeyExporter {
    pub fn new(
        config: EngineConfig,
        runner: Arc<dyn CommandRunner>,
        stripper: Arc<dyn KeyStripper>,
        locale: Arc<dyn Locale>,
    ) -> Self {
        Self {
            config,
            runner,
            stripper,
            locale,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Exports the public key `fingerprint` without attributes or
    /// third-party signatures and strips it down to its primary user ID
    /// and newest encryption subkey.
    ///
    /// Soft failures are reported through [`MinimalKeyExport::exit_code`];
    /// `Err` is returned only if gpg could not be run or the fingerprint
    /// is invalid.
    pub async fn get_minimal_public_key(&self, fingerprint: &str) -> Result<MinimalKeyExport> {
        let fpr = validate_fingerprint(fingerprint)?;

        let cell = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(fpr.clone()).or_default())
        };

        if let Some(key_data) = cell.get() {
            debug!(fingerprint = %fpr, "minimal key served from cache");
            return Ok(MinimalKeyExport::success(key_data.clone()));
        }

        match cell.get_or_try_init(|| self.export_and_strip(&fpr)).await {
            Ok(key_data) => Ok(MinimalKeyExport::success(key_data.clone())),
            Err(failure) => {
                // The map and this call hold the cell.
                self.evict_unset(&fpr, 2).await;
                match failure {
                    ExportFailure::Soft(export) => Ok(export),
                    ExportFailure::Engine(err) => Err(err),
                }
            }
        }
    }

    /// Like [`get_minimal_public_key`](Self::get_minimal_public_key), with
    /// a deadline. On timeout gpg is killed and nothing is cached.
    pub async fn get_minimal_public_key_with(
        &self,
        fingerprint: &str,
        options: ExportOptions,
    ) -> Result<MinimalKeyExport> {
        let export = self.get_minimal_public_key(fingerprint);

        match options.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), export).await {
                Ok(result) => result,
                Err(_) => {
                    if let Ok(fpr) = validate_fingerprint(fingerprint) {
                        self.evict_unset(&fpr, 1).await;
                    }
                    Err(Error::Timeout(secs))
                }
            },
            None => export.await,
        }
    }

    /// Drops the cache entry for `fpr` if it holds no key and nobody but
    /// `holders` references it, so failed fingerprints do not accumulate.
    async fn evict_unset(&self, fpr: &str, holders: usize) {
        let mut cache = self.cache.lock().await;
        let unused = cache
            .get(fpr)
            .is_some_and(|cell| !cell.initialized() && Arc::strong_count(cell) <= holders);
        if unused {
            cache.remove(fpr);
            debug!(fingerprint = %fpr, "evicted failed export from cache");
        }
    }

    async fn export_and_strip(&self, fpr: &str) -> std::result::Result<String, ExportFailure> {
        debug!(fingerprint = %fpr, "exporting minimal public key");

        let mut args = self.config.standard_args(true);
        args.extend(
            [
                "--export-options",
                "export-minimal,no-export-attributes",
                "-a",
                "--export",
                fpr,
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        // gpg's exit code is not used; the output decides.
        let output = self
            .runner
            .run(self.config.agent_path(), &args, b"")
            .await?;

        let verified = if self.config.has_feature(Feature::ExportResult) {
            output.has_status_line("EXPORTED", fpr)
        } else {
            output.stdout.len() >= MIN_ARMORED_LEN
        };

        if !verified {
            warn!(fingerprint = %fpr, exit_code = ?output.exit_code, "gpg did not confirm key export");
            return Err(self.soft_failure(ExportStatus::ExportVerificationFailed));
        }

        match self.stripper.strip_key(&output.stdout).await {
            Some(bytes) if !bytes.is_empty() => Ok(STANDARD.encode(bytes)),
            _ => {
                warn!(fingerprint = %fpr, "stripped key has no usable subkey");
                Err(self.soft_failure(ExportStatus::NoUsableSubkey))
            }
        }
    }

    fn soft_failure(&self, status: ExportStatus) -> ExportFailure {
        let msg = match status {
            ExportStatus::NoUsableSubkey => Message::NoUsableSubkey,
            _ => Message::KeyExtractionFailed,
        };
        ExportFailure::Soft(MinimalKeyExport::failure(status, self.locale.message(msg)))
    }
}
