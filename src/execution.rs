use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::Result;

const STATUS_PREFIX: &str = "[GNUPG:] ";

/// Captured result of one gpg run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// Process exit code, `None` if gpg was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    /// Diagnostics interleaved with `[GNUPG:]` status lines.
    pub stderr: String,
}

/// Conditions reported through gpg's status protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub bad_signature: bool,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_flags(&self) -> StatusFlags {
        let mut flags = StatusFlags::default();
        for line in self.status_lines() {
            if line.split_whitespace().next() == Some("BADSIG") {
                flags.bad_signature = true;
            }
        }
        flags
    }

    /// Returns true if a status line `[GNUPG:] <keyword> <arg>...` exists
    /// whose argument starts with `arg_prefix`.
    pub fn has_status_line(&self, keyword: &str, arg_prefix: &str) -> bool {
        self.status_lines().any(|line| {
            line.strip_prefix(keyword)
                .and_then(|rest| rest.strip_prefix(' '))
                .is_some_and(|arg| arg.starts_with(arg_prefix))
        })
    }

    fn status_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr
            .lines()
            .filter_map(|line| line.strip_prefix(STATUS_PREFIX))
    }
}

/// Runs the gpg binary.
///
/// [`TokioCommandRunner`] is the production implementation; tests swap in
/// scripted runners.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, feeding `stdin` to it.
    ///
    /// A non-zero exit code is not an error here; callers decide from the
    /// output whether the run succeeded.
    async fn run(&self, program: &Path, args: &[String], stdin: &[u8]) -> Result<EngineOutput>;
}

/// Spawns gpg as a tokio child process.
///
/// The child is killed if the returned future is dropped, so timeouts
/// around a call do not leave gpg running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &Path, args: &[String], stdin: &[u8]) -> Result<EngineOutput> {
        debug!(program = %program.display(), ?args, "running gpg");

        let mut child = Command::new(program)
            .env("LC_ALL", "C")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Take the handle so it is closed before waiting; gpg reads to EOF.
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin).await?;
            pipe.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        debug!(status = ?output.status.code(), "gpg finished");

        Ok(EngineOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_stderr(stderr: &str) -> EngineOutput {
        EngineOutput {
            exit_code: Some(2),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_bad_signature_flag() {
        let output = with_stderr(
            "gpg: Signature made Mon 01 Jan 2024\n[GNUPG:] BADSIG 786C63F330D7CB92 Levente Polyak\n",
        );
        assert!(output.status_flags().bad_signature);
    }

    #[test]
    fn test_no_flags_on_plain_stderr() {
        let output = with_stderr("gpg: BADSIG mentioned outside status line\n[GNUPG:] KEY_CONSIDERED ABC 0\n");
        assert_eq!(output.status_flags(), StatusFlags::default());
    }

    #[test]
    fn test_exported_status_line_anchored() {
        let fpr = "ABAF11C65A2970B130ABE3C479BE3E4300411886";
        let output = with_stderr(&format!(
            "gpg: writing\n[GNUPG:] EXPORTED {fpr}\n[GNUPG:] EXPORT_RES 1 0 0 0 1 0 0 0 0 0 0 0 0 0 0\n"
        ));
        assert!(output.has_status_line("EXPORTED", fpr));
        assert!(!output.has_status_line("EXPORTED", "6645B0A8C7005E78DB1D7864F99FFE0FEAE999BD"));
    }

    #[test]
    fn test_exported_mid_line_not_matched() {
        let fpr = "ABAF11C65A2970B130ABE3C479BE3E4300411886";
        let output = with_stderr(&format!("gpg: note [GNUPG:] EXPORTED {fpr}\n"));
        assert!(!output.has_status_line("EXPORTED", fpr));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_command_error() {
        let result = TokioCommandRunner
            .run(Path::new("/nonexistent/gpg-binary"), &[], b"")
            .await;
        assert!(matches!(result, Err(crate::Error::Command(_))));
    }
}
