use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};
use crate::execution::{CommandRunner, TokioCommandRunner};

const DEFAULT_AGENT_PATH: &str = "gpg";

/// A GnuPG version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `2.2.27`, `2.4` or `2.1.10-beta42`. Missing components are 0.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.').map(|p| {
            let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        });

        let major = parts.next()??;
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }

    /// Extracts the version from the first line of `gpg --version`,
    /// e.g. `gpg (GnuPG) 2.2.27`.
    pub fn from_version_output(output: &str) -> Option<Self> {
        let first = output.lines().next()?;
        first.split_whitespace().rev().find_map(Self::parse)
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Optional engine capabilities that depend on the GnuPG version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Feature {
    /// `--export` reports `[GNUPG:] EXPORTED <fpr>` status lines.
    ExportResult,
}

impl Feature {
    fn min_version(self) -> EngineVersion {
        match self {
            Feature::ExportResult => EngineVersion::new(2, 1, 10),
        }
    }
}

/// How to reach the gpg binary and what it supports.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    agent_path: PathBuf,
    homedir: Option<PathBuf>,
    version: EngineVersion,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_PATH)
    }
}

impl EngineConfig {
    /// Creates a configuration for the given gpg binary.
    ///
    /// The version defaults to `0.0.0`, so no optional features are
    /// assumed until [`with_version`](Self::with_version) or
    /// [`detect`](Self::detect) provides one.
    #[must_use]
    pub fn new(agent_path: impl Into<PathBuf>) -> Self {
        Self {
            agent_path: agent_path.into(),
            homedir: None,
            version: EngineVersion::default(),
        }
    }

    #[must_use]
    pub fn with_homedir(mut self, homedir: impl Into<PathBuf>) -> Self {
        self.homedir = Some(homedir.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: EngineVersion) -> Self {
        self.version = version;
        self
    }

    /// Runs `<agent> --version` and records the reported version.
    pub async fn detect(agent_path: impl Into<PathBuf>) -> Result<Self> {
        Self::detect_with(&TokioCommandRunner, agent_path).await
    }

    /// Like [`detect`](Self::detect), running gpg through `runner`.
    pub async fn detect_with(
        runner: &dyn CommandRunner,
        agent_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let config = Self::new(agent_path);
        let output = runner
            .run(&config.agent_path, &["--version".to_string()], b"")
            .await?;

        let version = EngineVersion::from_version_output(&output.stdout).ok_or_else(|| {
            Error::Engine {
                status: output.exit_code.unwrap_or(-1),
                stderr: format!(
                    "unrecognized version output: {}",
                    output.stdout.lines().next().unwrap_or_default()
                ),
            }
        })?;

        debug!(agent = %config.agent_path.display(), %version, "detected gpg version");
        Ok(config.with_version(version))
    }

    pub fn agent_path(&self) -> &PathBuf {
        &self.agent_path
    }

    pub fn homedir(&self) -> Option<&PathBuf> {
        self.homedir.as_ref()
    }

    pub fn version(&self) -> EngineVersion {
        self.version
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.version >= feature.min_version()
    }

    /// Baseline arguments for every gpg invocation.
    ///
    /// With `with_batch_opts`, gpg runs non-interactively and writes
    /// `[GNUPG:]` status lines to stderr.
    pub fn standard_args(&self, with_batch_opts: bool) -> Vec<String> {
        let mut args: Vec<String> = [
            "--charset",
            "utf-8",
            "--display-charset",
            "utf-8",
            "--no-auto-check-trustdb",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(homedir) = &self.homedir {
            args.push(format!("--homedir={}", homedir.display()));
        }

        if with_batch_opts {
            args.extend(
                ["--batch", "--no-tty", "--no-verbose", "--status-fd", "2"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }

        args
    }
}
