//! Scripted runner and in-memory path cache for exercising the
//! fallback chains without touching the real system.

use crate::locate::{FileCheck, PathCache};
use crate::process::{CommandRunner, ExecOutput};
use crate::{CliContext, DetectedOs};
use anyhow::Result;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Replays canned outputs keyed by "program arg0 arg1 ..." prefixes and
/// records every invocation in order.
pub struct FakeRunner {
    responses: Mutex<Vec<(String, ExecOutput)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, prefix: &str, output: ExecOutput) {
        self.responses.lock().push((prefix.to_string(), output));
    }

    pub fn ok(&self, prefix: &str, stdout: &str) {
        self.respond(
            prefix,
            ExecOutput {
                code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    pub fn fail(&self, prefix: &str) {
        self.fail_with(prefix, 1, "");
    }

    pub fn fail_with(&self, prefix: &str, code: i32, stderr: &str) {
        self.respond(
            prefix,
            ExecOutput {
                code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _stdin: Option<&str>,
        _cwd: Option<&Path>,
        _timeout: Duration,
    ) -> Result<ExecOutput> {
        let full = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        self.calls.lock().push(full.clone());
        let responses = self.responses.lock();
        for (prefix, output) in responses.iter() {
            if full.starts_with(prefix.as_str()) {
                return Ok(output.clone());
            }
        }
        // Anything unscripted behaves like a missing command.
        Ok(ExecOutput {
            code: 127,
            stdout: String::new(),
            stderr: format!("{}: command not found", program),
        })
    }
}

#[derive(Default)]
pub struct MemoryPathCache {
    path: Mutex<Option<String>>,
}

impl PathCache for MemoryPathCache {
    fn saved_path(&self) -> Option<String> {
        self.path.lock().clone()
    }

    fn save_path(&self, path: &str) {
        *self.path.lock() = Some(path.to_string());
    }

    fn clear_path(&self) {
        *self.path.lock() = None;
    }
}

/// In-memory filesystem view: only the added paths exist.
#[derive(Default)]
pub struct FakeFiles {
    present: Mutex<Vec<PathBuf>>,
}

impl FakeFiles {
    pub fn add(&self, path: &str) {
        self.present.lock().push(PathBuf::from(path));
    }
}

impl FileCheck for FakeFiles {
    fn is_file(&self, path: &Path) -> bool {
        self.present.lock().iter().any(|p| p == path)
    }
}

pub fn ctx_with(
    os: DetectedOs,
    runner: Arc<FakeRunner>,
    paths: Arc<MemoryPathCache>,
) -> CliContext {
    // Empty fake filesystem by default; tests that need well-known
    // paths swap in their own view.
    CliContext::new(os, runner, paths, None).with_files(Arc::new(FakeFiles::default()))
}
