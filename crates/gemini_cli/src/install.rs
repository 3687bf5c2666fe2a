//! CLI installation: an ordered chain of install strategies, each
//! gated by an OS predicate and confirmed by re-running the locator.

use crate::locate::{npm_program, npx_program, CliLocator, CLI_PACKAGE};
use crate::process::{CommandRunner, INSTALL_TIMEOUT, PROBE_TIMEOUT};
use crate::os::DetectedOs;
use crate::CliContext;
use tracing::{info, warn};

/// The ordered install chain. A strategy only runs when it applies to
/// the detected OS; after any reported success the locator must
/// confirm before the install counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    /// `npm install -g @google/gemini-cli`.
    NpmGlobal,
    /// Same, with `--force` for machines with a broken npm prefix.
    NpmGlobalForce,
    /// `brew install gemini-cli`; Homebrew never exists on Windows.
    Homebrew,
    /// `npx -y` run-without-install; leaves nothing persisted but
    /// makes the tool usable.
    EphemeralRun,
}

pub const INSTALL_ORDER: &[InstallStrategy] = &[
    InstallStrategy::NpmGlobal,
    InstallStrategy::NpmGlobalForce,
    InstallStrategy::Homebrew,
    InstallStrategy::EphemeralRun,
];

impl InstallStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            InstallStrategy::NpmGlobal => "npm-global",
            InstallStrategy::NpmGlobalForce => "npm-global-force",
            InstallStrategy::Homebrew => "homebrew",
            InstallStrategy::EphemeralRun => "ephemeral-run",
        }
    }

    pub fn applies(&self, os: DetectedOs) -> bool {
        match self {
            InstallStrategy::Homebrew => !os.is_windows(),
            _ => true,
        }
    }
}

pub struct CliInstaller<'a> {
    ctx: &'a CliContext,
}

impl<'a> CliInstaller<'a> {
    pub fn new(ctx: &'a CliContext) -> Self {
        Self { ctx }
    }

    /// Try each applicable strategy in order until one produces a
    /// locator-confirmed installation. Returns false when the chain is
    /// exhausted or the platform lacks every prerequisite.
    pub async fn install(&self) -> bool {
        if !self.prerequisites_present().await {
            warn!("no package manager available, cannot install gemini CLI");
            return false;
        }

        for strategy in INSTALL_ORDER {
            if !strategy.applies(self.ctx.os) {
                continue;
            }
            info!(strategy = strategy.name(), "attempting CLI install");
            let reported_ok = match strategy {
                InstallStrategy::NpmGlobal => self.npm_install(&[]).await,
                InstallStrategy::NpmGlobalForce => self.npm_install(&["--force"]).await,
                InstallStrategy::Homebrew => self.brew_install().await,
                InstallStrategy::EphemeralRun => self.ephemeral_run().await,
            };
            if !reported_ok {
                continue;
            }
            // Installers lie; trust only a fresh probe.
            if CliLocator::new(self.ctx).locate().await {
                info!(strategy = strategy.name(), "install confirmed by locator");
                return true;
            }
            warn!(
                strategy = strategy.name(),
                "installer reported success but locator cannot find the CLI"
            );
        }
        false
    }

    /// Fail fast when the platform has neither npm nor (off Windows)
    /// Homebrew to install with.
    async fn prerequisites_present(&self) -> bool {
        if self.tool_present(npm_program(self.ctx.os)).await {
            return true;
        }
        !self.ctx.os.is_windows() && self.tool_present("brew").await
    }

    async fn tool_present(&self, program: &str) -> bool {
        matches!(
            self.ctx
                .runner
                .run(program, &["--version".to_string()], None, None, PROBE_TIMEOUT)
                .await,
            Ok(o) if o.success()
        )
    }

    async fn npm_install(&self, extra: &[&str]) -> bool {
        let mut args = vec!["install".to_string(), "-g".to_string(), CLI_PACKAGE.to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        self.run_quiet(npm_program(self.ctx.os), &args).await
    }

    async fn brew_install(&self) -> bool {
        self.run_quiet(
            "brew",
            &["install".to_string(), "gemini-cli".to_string()],
        )
        .await
    }

    async fn ephemeral_run(&self) -> bool {
        self.run_quiet(
            npx_program(self.ctx.os),
            &[
                "-y".to_string(),
                CLI_PACKAGE.to_string(),
                "--version".to_string(),
            ],
        )
        .await
    }

    async fn run_quiet(&self, program: &str, args: &[String]) -> bool {
        match self
            .ctx
            .runner
            .run(program, args, None, None, INSTALL_TIMEOUT)
            .await
        {
            Ok(o) if o.success() => true,
            Ok(o) => {
                info!(program, code = o.code, stderr = %o.stderr.trim(), "install step failed");
                false
            }
            Err(e) => {
                info!(program, error = %e, "install step could not run");
                false
            }
        }
    }
}
