//! Host platform detection.

use serde::{Deserialize, Serialize};

/// The platforms we pick probe and install strategies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectedOs {
    Mac,
    Windows,
    Linux,
}

impl DetectedOs {
    /// Detect the host platform. Never fails; anything that is not
    /// Windows or Linux is treated as macOS.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            DetectedOs::Windows
        } else if cfg!(target_os = "linux") {
            DetectedOs::Linux
        } else {
            DetectedOs::Mac
        }
    }

    /// Canonical command name of the Gemini CLI on this platform.
    pub fn program_name(&self) -> &'static str {
        match self {
            DetectedOs::Windows => "gemini.cmd",
            _ => "gemini",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetectedOs::Mac => "macOS",
            DetectedOs::Windows => "Windows",
            DetectedOs::Linux => "Linux",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, DetectedOs::Windows)
    }
}
