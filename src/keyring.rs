use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::decode::{GpgTextDecoder, TextDecoder};
use crate::error::{Error, Result};
use crate::execution::{CommandRunner, TokioCommandRunner};
use crate::export::{KeyStripper, MinimalKeyExporter};
use crate::locale::{EnglishLocale, Locale};
use crate::parse::parse_signature_report;
use crate::types::SignatureReport;
use crate::validation::split_key_ids;

/// Interface for querying a GnuPG keyring.
///
/// # Example
///
/// ```no_run
/// use gnupg_keys::{EngineConfig, Keyring};
///
/// # async fn example() -> gnupg_keys::Result<()> {
/// let keyring = Keyring::new(EngineConfig::detect("gpg").await?);
/// let report = keyring
///     .get_key_signatures("ABAF11C65A2970B130ABE3C479BE3E4300411886", true)
///     .await?;
/// for identity in &report {
///     println!("{}: {} certifications", identity.uid, identity.signatures.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Keyring {
    config: EngineConfig,
    runner: Arc<dyn CommandRunner>,
    decoder: Arc<dyn TextDecoder>,
    locale: Arc<dyn Locale>,
}

impl Default for Keyring {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Keyring {
    /// Creates a keyring that spawns the configured gpg binary.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioCommandRunner))
    }

    /// Creates a keyring that runs gpg through `runner`.
    #[must_use]
    pub fn with_runner(config: EngineConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            decoder: Arc::new(GpgTextDecoder),
            locale: Arc::new(EnglishLocale),
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn TextDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Arc<dyn Locale>) -> Self {
        self.locale = locale;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Lists the certifications on the user IDs of a key.
    ///
    /// `keyids` is a space-separated list of key IDs or fingerprints; only
    /// the first key gpg lists is reported. With `ignore_unknown_signers`,
    /// signatures whose issuer is not in the keyring are left out.
    ///
    /// gpg's exit code is only honored when it reports a bad signature;
    /// otherwise non-zero exits (e.g. for missing signer keys) are ignored.
    pub async fn get_key_signatures(
        &self,
        keyids: &str,
        ignore_unknown_signers: bool,
    ) -> Result<SignatureReport> {
        let validated = split_key_ids(keyids)?;
        debug!(keyids = ?validated, "listing key signatures");

        let mut args = self.config.standard_args(true);
        args.extend(
            [
                "--with-fingerprint",
                "--fixed-list-mode",
                "--with-colons",
                "--list-sig",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.extend(validated);

        let output = self
            .runner
            .run(self.config.agent_path(), &args, b"")
            .await?;

        if output.status_flags().bad_signature && !output.success() {
            return Err(Error::Engine {
                status: output.exit_code.unwrap_or(-1),
                stderr: output.stderr,
            });
        }

        if output.stdout.is_empty() {
            return Ok(SignatureReport::new());
        }

        parse_signature_report(
            &output.stdout,
            ignore_unknown_signers,
            self.decoder.as_ref(),
            self.locale.as_ref(),
        )
    }

    /// Creates an exporter for minimal public keys sharing this keyring's
    /// gpg configuration and runner.
    pub fn minimal_key_exporter(&self, stripper: Arc<dyn KeyStripper>) -> MinimalKeyExporter {
        MinimalKeyExporter::new(
            self.config.clone(),
            Arc::clone(&self.runner),
            stripper,
            Arc::clone(&self.locale),
        )
    }
}
