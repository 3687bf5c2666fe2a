//! Discovery, installation, and invocation of the external Gemini CLI.
//!
//! Everything that touches a child process goes through the
//! [`process::CommandRunner`] seam so the fallback chains can be tested
//! against a scripted runner instead of the real system.

pub mod command;
pub mod health;
pub mod install;
pub mod locate;
pub mod os;
pub mod process;
pub mod runner;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{build_invocation, Attachment, Invocation};
pub use health::{HealthCheck, HealthState};
pub use install::CliInstaller;
pub use locate::{CliLocator, FileCheck, PathCache, SystemFiles};
pub use os::DetectedOs;
pub use process::{CommandRunner, ExecOutput, SystemRunner};
pub use runner::{sanitize_output, Outcome, TurnRunner};

use std::path::PathBuf;
use std::sync::Arc;

/// Capabilities handed to the locator, installer, and turn runner.
///
/// Injected explicitly instead of read from globals so tests can swap
/// in a fake runner and an in-memory path cache.
#[derive(Clone)]
pub struct CliContext {
    pub os: DetectedOs,
    pub runner: Arc<dyn CommandRunner>,
    pub paths: Arc<dyn PathCache>,
    pub files: Arc<dyn FileCheck>,
    /// Working directory for real CLI turns. The CLI auto-loads
    /// `.gemini/.env` from here, which is how the API key reaches it.
    pub workdir: Option<PathBuf>,
}

impl CliContext {
    pub fn new(
        os: DetectedOs,
        runner: Arc<dyn CommandRunner>,
        paths: Arc<dyn PathCache>,
        workdir: Option<PathBuf>,
    ) -> Self {
        Self {
            os,
            runner,
            paths,
            files: Arc::new(SystemFiles),
            workdir,
        }
    }

    pub fn with_files(mut self, files: Arc<dyn FileCheck>) -> Self {
        self.files = files;
        self
    }
}
