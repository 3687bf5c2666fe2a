//! Setup health: locate the CLI, prove the API key works, and expose
//! which screen the UI should show.

use crate::command::build_invocation;
use crate::install::CliInstaller;
use crate::locate::CliLocator;
use crate::runner::{Outcome, TurnRunner};
use crate::CliContext;
use shared::chat::ConversationMode;
use shared::settings::GeminiSettings;
use tracing::info;

/// Which setup screen the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Checking,
    NeedsCli,
    NeedsKey,
    Ready,
    Error,
}

/// Drives the checking → {needs_cli, needs_key, ready, error} flow.
///
/// Terminal states only ever re-enter through `Checking`; there is no
/// direct edge between `NeedsCli` and `NeedsKey`. One check or install
/// runs at a time: `busy` guards re-entry and the UI disables its
/// triggers while it is set.
pub struct HealthCheck {
    pub state: HealthState,
    pub detail: String,
    pub busy: bool,
}

impl HealthCheck {
    pub fn new() -> Self {
        Self {
            state: HealthState::Checking,
            detail: String::new(),
            busy: false,
        }
    }

    /// Full check: locator, then a real one-shot auth probe. Both
    /// always execute; there is no "assume installed" shortcut.
    pub async fn recheck(&mut self, ctx: &CliContext, settings: &GeminiSettings) {
        if self.busy {
            return;
        }
        self.busy = true;
        self.state = HealthState::Checking;
        self.detail.clear();

        let located = CliLocator::new(ctx).locate().await;
        let probe = if located {
            Some(auth_probe(ctx, settings).await)
        } else {
            None
        };
        let (state, detail) = classify_probe(located, probe.as_ref());
        info!(?state, "health check finished");
        self.state = state;
        self.detail = detail;
        self.busy = false;
    }

    /// User-triggered install. Regardless of the install outcome the
    /// full check re-runs, so the state always passes back through
    /// `Checking`.
    pub async fn install_cli(&mut self, ctx: &CliContext, settings: &GeminiSettings) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.state = HealthState::Checking;
        let installed = CliInstaller::new(ctx).install().await;
        self.busy = false;
        self.recheck(ctx, settings).await;
        installed
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure transition function from probe results to the next state.
pub fn classify_probe(located: bool, probe: Option<&Outcome>) -> (HealthState, String) {
    if !located {
        return (
            HealthState::NeedsCli,
            "The Gemini CLI could not be found on this machine.".to_string(),
        );
    }
    match probe {
        Some(Outcome::Success(_)) => (HealthState::Ready, "All checks passed.".to_string()),
        Some(Outcome::AuthError(detail)) => {
            let detail = if detail.is_empty() {
                "An API key is required.".to_string()
            } else {
                detail.clone()
            };
            (HealthState::NeedsKey, detail)
        }
        Some(Outcome::NotFound) => (
            HealthState::NeedsCli,
            "The Gemini CLI is no longer reachable.".to_string(),
        ),
        Some(Outcome::RateLimited) => (
            HealthState::Error,
            "The API quota is exhausted; try again later.".to_string(),
        ),
        Some(Outcome::GenericError(detail)) => (HealthState::Error, detail.clone()),
        // Located but never probed does not happen in practice.
        None => (HealthState::Error, "Probe did not run.".to_string()),
    }
}

/// One-shot round trip through the real CLI to prove the key works.
async fn auth_probe(ctx: &CliContext, settings: &GeminiSettings) -> Outcome {
    let program = CliLocator::new(ctx).cli_program();
    let invocation = build_invocation(
        &program,
        "Reply with the single word: pong",
        settings,
        &ConversationMode::default(),
        &[],
    );
    TurnRunner::new(ctx).run(&invocation).await
}
