//! Child-process execution seam.
//!
//! All probes, installs, and chat turns run through [`CommandRunner`],
//! so tests can substitute a scripted runner and assert on the exact
//! sequence of invocations.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of one child process run.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Exit code (-1 when the process was killed or the code is unknown).
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// One child-process invocation: program, argument vector, optional
/// stdin payload, optional working directory.
///
/// Arguments are passed to the process API as a vector. There is no
/// shell in between and therefore no quoting or escaping layer.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<ExecOutput>;
}

/// Real runner backed by `tokio::process`.
pub struct SystemRunner;

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<ExecOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).await?;
                drop(pipe);
            }
        }

        let output = tokio::time::timeout(timeout, child.wait_with_output()).await;
        match output {
            Ok(Ok(output)) => Ok(ExecOutput {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracing::warn!(program, ?timeout, "child process timed out");
                Ok(ExecOutput {
                    code: -1,
                    stdout: String::new(),
                    stderr: format!("timed out after {}s", timeout.as_secs()),
                })
            }
        }
    }
}

/// Timeout for cheap probes (`--version`, `which`, listings).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for package-manager installs.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
/// Timeout for a full chat turn against the model.
pub const TURN_TIMEOUT: Duration = Duration::from_secs(120);

/// Convenience: run `<program> --version` and report success.
pub async fn version_check(
    runner: &dyn CommandRunner,
    program: &str,
) -> Result<ExecOutput> {
    runner
        .run(program, &["--version".to_string()], None, None, PROBE_TIMEOUT)
        .await
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
