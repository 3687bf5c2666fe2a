//! Runs one built invocation and classifies what came back.

use crate::command::Invocation;
use crate::process::TURN_TIMEOUT;
use crate::CliContext;
use tracing::{debug, warn};

/// Classified result of one CLI turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    /// Quota exhausted; the caller should push the usage counter to
    /// its limit so the UI reflects exhaustion immediately.
    RateLimited,
    /// The tool or a requested resource is missing.
    NotFound,
    /// The API key is missing or invalid.
    AuthError(String),
    GenericError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Strip known non-content noise from CLI output.
///
/// Removes the cached-credentials banner, `[DEBUG]`-tagged lines, and
/// embedded `{"config": {...}}` dump blocks, then collapses repeated
/// blank lines. Idempotent: sanitizing sanitized text changes nothing.
pub fn sanitize_output(raw: &str) -> String {
    let credentials = regex::Regex::new(r"(?m)^Loaded cached credentials\.\s*").unwrap();
    let debug_lines = regex::Regex::new(r"(?m)^.*\[DEBUG\].*$").unwrap();
    let config_dump = regex::Regex::new(r#"(?s)\{\s*"config":\s*\{.*?\}\s*\}\s*"#).unwrap();
    let blank_runs = regex::Regex::new(r"\n\s*\n").unwrap();

    let text = credentials.replace_all(raw.trim(), "");
    let text = debug_lines.replace_all(&text, "");
    let text = config_dump.replace_all(&text, "");
    let mut text = text.into_owned();
    // Collapsing can create new adjacent blank pairs; repeat to a fixed point.
    loop {
        let collapsed = blank_runs.replace_all(&text, "\n").into_owned();
        if collapsed == text {
            break;
        }
        text = collapsed;
    }
    text.trim().to_string()
}

fn is_rate_limited(text: &str) -> bool {
    text.contains("429") || text.contains("rateLimitExceeded") || text.contains("RESOURCE_EXHAUSTED")
}

fn is_not_found(text: &str) -> bool {
    text.contains("404") || text.contains("notFound") || text.contains("command not found")
}

fn is_auth_error(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("api key")
        || lower.contains("authentication")
        || lower.contains("unauthenticated")
        || lower.contains("permission_denied")
        || lower.contains("401")
}

/// Classify exit code plus stdout/stderr into an [`Outcome`].
///
/// Rate-limit indicators win over everything, including a zero exit
/// code: the CLI has been seen printing 429 bodies while exiting 0.
pub fn classify(code: i32, stdout: &str, stderr: &str) -> Outcome {
    let combined = format!("{}\n{}", stdout, stderr);
    if is_rate_limited(&combined) {
        return Outcome::RateLimited;
    }

    if code == 0 {
        let clean = sanitize_output(stdout);
        if clean.is_empty() {
            let detail = sanitize_output(stderr);
            return Outcome::GenericError(if detail.is_empty() {
                "The CLI produced no output.".to_string()
            } else {
                detail
            });
        }
        return Outcome::Success(clean);
    }

    let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };
    if is_auth_error(diagnostic) {
        return Outcome::AuthError(sanitize_output(diagnostic));
    }
    if is_not_found(diagnostic) {
        return Outcome::NotFound;
    }
    Outcome::GenericError(sanitize_output(diagnostic))
}

/// Executes invocations through the context's runner, with the
/// configured working directory so the CLI picks up `.gemini/.env`.
pub struct TurnRunner<'a> {
    ctx: &'a CliContext,
}

impl<'a> TurnRunner<'a> {
    pub fn new(ctx: &'a CliContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, invocation: &Invocation) -> Outcome {
        debug!(program = %invocation.program, args = ?invocation.args, "running CLI turn");
        let result = self
            .ctx
            .runner
            .run(
                &invocation.program,
                &invocation.args,
                invocation.stdin.as_deref(),
                self.ctx.workdir.as_deref(),
                TURN_TIMEOUT,
            )
            .await;
        match result {
            Ok(output) => classify(output.code, &output.stdout, &output.stderr),
            Err(e) => {
                warn!(error = %e, "CLI invocation failed to spawn");
                // A spawn failure means the tool is gone, not that the
                // model errored.
                Outcome::NotFound
            }
        }
    }
}
