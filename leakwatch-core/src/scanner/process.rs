//! Subprocess wrapper around the trufflehog binary.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, ScanError};

/// Marker trufflehog embeds in its output when the scan itself (not an
/// individual detector) went wrong. Part of the wire contract with the tool;
/// a run containing it must not advance any watermark.
pub const SCAN_ERROR_MARKER: &str = "encountered errors during scan";

/// Captured output of one scanner invocation.
#[derive(Debug, Clone)]
pub struct ScanRun {
    /// Stdout lines; finding lines are JSON objects among tool log lines.
    pub lines: Vec<String>,
    /// Drained stderr, kept for failure diagnosis.
    pub log: String,
    /// Whether the process exited zero.
    pub exit_ok: bool,
}

impl ScanRun {
    /// Scan-level failure: non-zero exit or the in-stream error marker in
    /// either stream. Distinct from per-line parse failures, which the
    /// ingester absorbs.
    pub fn failed(&self) -> bool {
        !self.exit_ok
            || self.log.contains(SCAN_ERROR_MARKER)
            || self.lines.iter().any(|l| l.contains(SCAN_ERROR_MARKER))
    }
}

/// Port over the external secret-scanning tool, so the coordinator never
/// touches the binary directly.
#[async_trait]
pub trait SecretScanner: Send + Sync {
    /// Scan a repository's git history. An empty `since_commit` means a full
    /// history scan; otherwise only commits after the given SHA are
    /// examined. `concurrency` bounds the tool's internal worker count, not
    /// ours.
    async fn run(
        &self,
        clone_url: &str,
        since_commit: &str,
        concurrency: u32,
        only_verified: bool,
    ) -> Result<ScanRun>;
}

/// Invokes the real trufflehog binary.
#[derive(Debug, Clone)]
pub struct TrufflehogScanner {
    binary: String,
    user_agent_suffix: String,
}

impl TrufflehogScanner {
    pub fn new(binary: impl Into<String>, user_agent_suffix: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            user_agent_suffix: user_agent_suffix.into(),
        }
    }

    /// Argument vector for one invocation. Split out so the shape is
    /// testable without spawning anything.
    fn build_args(
        &self,
        clone_url: &str,
        since_commit: &str,
        concurrency: u32,
        only_verified: bool,
    ) -> Vec<String> {
        let mut args = vec![
            "git".to_string(),
            clone_url.to_string(),
            format!("--concurrency={concurrency}"),
            "--json".to_string(),
            "--no-update".to_string(),
            format!("--user-agent-suffix={}", self.user_agent_suffix),
        ];

        if !since_commit.is_empty() {
            args.push(format!("--since-commit={since_commit}"));
        }
        if only_verified {
            args.push("--only-verified".to_string());
        }

        args
    }
}

#[async_trait]
impl SecretScanner for TrufflehogScanner {
    async fn run(
        &self,
        clone_url: &str,
        since_commit: &str,
        concurrency: u32,
        only_verified: bool,
    ) -> Result<ScanRun> {
        let args = self.build_args(clone_url, since_commit, concurrency, only_verified);
        debug!(binary = %self.binary, ?args, "spawning scanner");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScanError::Scanner(format!("failed to spawn {}: {e}", self.binary)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScanError::Scanner("scanner stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScanError::Scanner("scanner stderr not captured".to_string()))?;

        // Drain stderr concurrently so a chatty tool can't fill the pipe and
        // deadlock against our stdout reads.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = Vec::new();
        let mut reader = BufReader::new(stdout).lines();
        while let Some(line) = reader
            .next_line()
            .await
            .map_err(|e| ScanError::Scanner(format!("failed reading scanner output: {e}")))?
        {
            lines.push(line);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ScanError::Scanner(format!("failed waiting for scanner: {e}")))?;

        let log = stderr_task.await.unwrap_or_default();

        info!(
            exit = ?status.code(),
            output_lines = lines.len(),
            "scanner finished"
        );

        Ok(ScanRun {
            lines,
            log,
            exit_ok: status.success(),
        })
    }
}
