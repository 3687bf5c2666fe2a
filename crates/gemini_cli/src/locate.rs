//! CLI discovery: an ordered fallback chain of probe strategies.
//!
//! Strategies run strictly in sequence, cheapest first, and the chain
//! short-circuits on the first success. Every individual failure
//! (spawn error, non-zero exit) is caught locally and means "try the
//! next strategy", never a hard error.

use crate::process::{expand_home, version_check, CommandRunner, PROBE_TIMEOUT};
use crate::os::DetectedOs;
use crate::CliContext;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persisted custom CLI path, saved when a probe succeeds through a
/// non-default path and cleared when re-validation fails.
pub trait PathCache: Send + Sync {
    fn saved_path(&self) -> Option<String>;
    fn save_path(&self, path: &str);
    fn clear_path(&self);
}

/// File-existence seam for the known-paths strategy, so tests can
/// model installed binaries without touching the real filesystem.
pub trait FileCheck: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;
}

/// Real filesystem lookups.
pub struct SystemFiles;

impl FileCheck for SystemFiles {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// The ordered probe chain. Order matters: earlier strategies are
/// cheaper and more authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// Re-validate a previously saved custom path.
    SavedPath,
    /// `gemini --version` on the PATH we inherited.
    DirectInvocation,
    /// `which` / `where` through the user's shell, then verify.
    ShellLookup,
    /// Well-known package-manager and per-user install directories.
    KnownPaths,
    /// `npm ls -g` listing; best effort, does not prove the binary runs.
    PackageListing,
    /// `npx` no-install execution; usable without anything persisted.
    EphemeralRun,
}

pub const PROBE_ORDER: &[ProbeStrategy] = &[
    ProbeStrategy::SavedPath,
    ProbeStrategy::DirectInvocation,
    ProbeStrategy::ShellLookup,
    ProbeStrategy::KnownPaths,
    ProbeStrategy::PackageListing,
    ProbeStrategy::EphemeralRun,
];

impl ProbeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeStrategy::SavedPath => "saved-path",
            ProbeStrategy::DirectInvocation => "direct-invocation",
            ProbeStrategy::ShellLookup => "shell-lookup",
            ProbeStrategy::KnownPaths => "known-paths",
            ProbeStrategy::PackageListing => "package-listing",
            ProbeStrategy::EphemeralRun => "ephemeral-run",
        }
    }
}

/// npm package name of the Gemini CLI.
pub const CLI_PACKAGE: &str = "@google/gemini-cli";

pub fn npm_program(os: DetectedOs) -> &'static str {
    if os.is_windows() {
        "npm.cmd"
    } else {
        "npm"
    }
}

pub fn npx_program(os: DetectedOs) -> &'static str {
    if os.is_windows() {
        "npx.cmd"
    } else {
        "npx"
    }
}

/// Candidate install locations checked by the known-paths strategy.
pub fn known_install_paths(os: DetectedOs) -> Vec<PathBuf> {
    match os {
        DetectedOs::Mac => vec![
            PathBuf::from("/opt/homebrew/bin/gemini"),
            PathBuf::from("/usr/local/bin/gemini"),
            expand_home("~/.npm-global/bin/gemini"),
            expand_home("~/.local/bin/gemini"),
        ],
        DetectedOs::Linux => vec![
            PathBuf::from("/usr/local/bin/gemini"),
            PathBuf::from("/usr/bin/gemini"),
            expand_home("~/.npm-global/bin/gemini"),
            expand_home("~/.local/bin/gemini"),
        ],
        DetectedOs::Windows => {
            let mut paths = Vec::new();
            if let Ok(appdata) = std::env::var("APPDATA") {
                paths.push(PathBuf::from(appdata).join("npm").join("gemini.cmd"));
            }
            paths.push(PathBuf::from("C:\\Program Files\\nodejs\\gemini.cmd"));
            paths
        }
    }
}

/// Probes the ordered strategy chain until one reports the CLI usable.
pub struct CliLocator<'a> {
    ctx: &'a CliContext,
}

impl<'a> CliLocator<'a> {
    pub fn new(ctx: &'a CliContext) -> Self {
        Self { ctx }
    }

    /// Is the Gemini CLI usable on this machine?
    ///
    /// Returns as soon as one strategy succeeds; logs each attempt for
    /// support diagnostics.
    pub async fn locate(&self) -> bool {
        for strategy in PROBE_ORDER {
            debug!(strategy = strategy.name(), "probing for gemini CLI");
            let found = match strategy {
                ProbeStrategy::SavedPath => self.probe_saved_path().await,
                ProbeStrategy::DirectInvocation => self.probe_direct().await,
                ProbeStrategy::ShellLookup => self.probe_shell_lookup().await,
                ProbeStrategy::KnownPaths => self.probe_known_paths().await,
                ProbeStrategy::PackageListing => self.probe_package_listing().await,
                ProbeStrategy::EphemeralRun => self.probe_ephemeral().await,
            };
            if found {
                info!(strategy = strategy.name(), "gemini CLI located");
                return true;
            }
        }
        warn!("gemini CLI not found by any probe strategy");
        false
    }

    /// The path real invocations should use: the saved custom path if
    /// one exists, otherwise the canonical command name.
    pub fn cli_program(&self) -> String {
        self.ctx
            .paths
            .saved_path()
            .unwrap_or_else(|| self.ctx.os.program_name().to_string())
    }

    async fn probe_saved_path(&self) -> bool {
        let Some(saved) = self.ctx.paths.saved_path() else {
            return false;
        };
        if self.verify_program(&saved).await {
            return true;
        }
        // Stale path: a reinstall or uninstall moved the binary.
        info!(path = %saved, "saved CLI path no longer valid, clearing");
        self.ctx.paths.clear_path();
        false
    }

    async fn probe_direct(&self) -> bool {
        self.verify_program(self.ctx.os.program_name()).await
    }

    async fn probe_shell_lookup(&self) -> bool {
        let result = if self.ctx.os.is_windows() {
            self.ctx
                .runner
                .run("where", &["gemini".to_string()], None, None, PROBE_TIMEOUT)
                .await
        } else {
            // Login shell so the lookup sees the user's full PATH, not
            // the stripped environment a GUI app inherits.
            self.ctx
                .runner
                .run(
                    "sh",
                    &["-lc".to_string(), "which gemini".to_string()],
                    None,
                    None,
                    PROBE_TIMEOUT,
                )
                .await
        };
        let output = match result {
            Ok(o) if o.success() => o,
            Ok(_) | Err(_) => return false,
        };
        let Some(path) = output.stdout.lines().next().map(str::trim).filter(|l| !l.is_empty())
        else {
            return false;
        };
        if self.verify_program(path).await {
            self.remember_path(path);
            return true;
        }
        false
    }

    async fn probe_known_paths(&self) -> bool {
        for candidate in known_install_paths(self.ctx.os) {
            // Existence first; spawning every candidate would be slow.
            if !self.ctx.files.is_file(&candidate) {
                continue;
            }
            let path = candidate.to_string_lossy().to_string();
            debug!(path = %path, "candidate install path exists, verifying");
            if self.verify_program(&path).await {
                self.remember_path(&path);
                return true;
            }
        }
        false
    }

    async fn probe_package_listing(&self) -> bool {
        let result = self
            .ctx
            .runner
            .run(
                npm_program(self.ctx.os),
                &["ls".to_string(), "-g".to_string(), "--depth=0".to_string()],
                None,
                None,
                PROBE_TIMEOUT,
            )
            .await;
        match result {
            Ok(o) if o.success() && o.stdout.contains(CLI_PACKAGE) => {
                debug!("gemini CLI present in npm global listing");
                true
            }
            _ => false,
        }
    }

    async fn probe_ephemeral(&self) -> bool {
        let result = self
            .ctx
            .runner
            .run(
                npx_program(self.ctx.os),
                &[
                    "-y".to_string(),
                    CLI_PACKAGE.to_string(),
                    "--version".to_string(),
                ],
                None,
                None,
                PROBE_TIMEOUT,
            )
            .await;
        matches!(result, Ok(o) if o.success())
    }

    async fn verify_program(&self, program: &str) -> bool {
        match version_check(self.ctx.runner.as_ref(), program).await {
            Ok(o) if o.success() => true,
            Ok(o) => {
                debug!(program, code = o.code, "version check failed");
                false
            }
            Err(e) => {
                debug!(program, error = %e, "version check could not run");
                false
            }
        }
    }

    fn remember_path(&self, path: &str) {
        if path != self.ctx.os.program_name() {
            self.ctx.paths.save_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with, FakeFiles, FakeRunner, MemoryPathCache};
    use std::sync::Arc;

    #[tokio::test]
    async fn direct_invocation_short_circuits() {
        let runner = Arc::new(FakeRunner::new());
        runner.ok("gemini --version", "0.4.1");
        let ctx = ctx_with(DetectedOs::Mac, runner.clone(), Arc::new(MemoryPathCache::default()));

        assert!(CliLocator::new(&ctx).locate().await);
        // Nothing after the direct check may run.
        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.calls_matching("sh"), 0);
        assert_eq!(runner.calls_matching("npm"), 0);
        assert_eq!(runner.calls_matching("npx"), 0);
    }

    #[tokio::test]
    async fn saved_path_checked_first_and_cleared_when_stale() {
        let runner = Arc::new(FakeRunner::new());
        // The stale saved path fails, the canonical name works.
        runner.fail("/old/prefix/gemini --version");
        runner.ok("gemini --version", "0.4.1");
        let cache = Arc::new(MemoryPathCache::default());
        cache.save_path("/old/prefix/gemini");
        let ctx = ctx_with(DetectedOs::Mac, runner.clone(), cache.clone());

        assert!(CliLocator::new(&ctx).locate().await);
        assert!(cache.saved_path().is_none(), "stale path must be invalidated");
        assert_eq!(runner.calls()[0], "/old/prefix/gemini --version");
    }

    #[tokio::test]
    async fn shell_lookup_result_is_verified_and_persisted() {
        let runner = Arc::new(FakeRunner::new());
        runner.ok("sh -lc which gemini", "/opt/homebrew/bin/gemini\n");
        runner.ok("/opt/homebrew/bin/gemini --version", "0.4.1");
        let cache = Arc::new(MemoryPathCache::default());
        let ctx = ctx_with(DetectedOs::Mac, runner.clone(), cache.clone());

        assert!(CliLocator::new(&ctx).locate().await);
        assert_eq!(cache.saved_path().as_deref(), Some("/opt/homebrew/bin/gemini"));
    }

    #[tokio::test]
    async fn known_install_path_is_found_verified_and_persisted() {
        let runner = Arc::new(FakeRunner::new());
        // Earlier strategies all fail; the Homebrew location exists
        // and its binary answers the version check.
        runner.ok("/opt/homebrew/bin/gemini --version", "0.4.1");
        let files = Arc::new(FakeFiles::default());
        files.add("/opt/homebrew/bin/gemini");
        let cache = Arc::new(MemoryPathCache::default());
        let ctx = ctx_with(DetectedOs::Mac, runner.clone(), cache.clone()).with_files(files);

        assert!(CliLocator::new(&ctx).locate().await);
        assert_eq!(
            cache.saved_path().as_deref(),
            Some("/opt/homebrew/bin/gemini")
        );
        // Candidates that do not exist were never spawned.
        assert_eq!(runner.calls_matching("/usr/local/bin/gemini"), 0);
    }

    #[tokio::test]
    async fn package_listing_counts_as_installed() {
        let runner = Arc::new(FakeRunner::new());
        runner.ok(
            "npm ls -g --depth=0",
            "/usr/local/lib\n└── @google/gemini-cli@0.4.1\n",
        );
        let ctx = ctx_with(DetectedOs::Linux, runner.clone(), Arc::new(MemoryPathCache::default()));

        assert!(CliLocator::new(&ctx).locate().await);
    }

    #[tokio::test]
    async fn all_strategies_failing_returns_false() {
        let runner = Arc::new(FakeRunner::new());
        let ctx = ctx_with(DetectedOs::Linux, runner.clone(), Arc::new(MemoryPathCache::default()));

        assert!(!CliLocator::new(&ctx).locate().await);
        // Every runnable strategy was attempted.
        assert!(runner.calls_matching("npx") >= 1);
    }

    #[tokio::test]
    async fn windows_uses_where_and_cmd_shims() {
        let runner = Arc::new(FakeRunner::new());
        runner.ok("where gemini", "C:\\Users\\u\\AppData\\Roaming\\npm\\gemini.cmd\r\n");
        runner.ok(
            "C:\\Users\\u\\AppData\\Roaming\\npm\\gemini.cmd --version",
            "0.4.1",
        );
        let ctx = ctx_with(
            DetectedOs::Windows,
            runner.clone(),
            Arc::new(MemoryPathCache::default()),
        );

        assert!(CliLocator::new(&ctx).locate().await);
        assert_eq!(runner.calls_matching("sh"), 0);
    }

    #[test]
    fn probe_order_starts_cheap_and_ends_ephemeral() {
        assert_eq!(PROBE_ORDER.first(), Some(&ProbeStrategy::SavedPath));
        assert_eq!(PROBE_ORDER.last(), Some(&ProbeStrategy::EphemeralRun));
    }
}
