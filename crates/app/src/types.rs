//! Application state: the stores, the CLI context, and the channels
//! that carry background results back to the UI thread.

use gemini_cli::{
    build_invocation, Attachment, CliContext, CliLocator, DetectedOs, HealthState, Outcome,
    PathCache, SystemRunner,
};
use services::api_key::{validate_key_format, write_env_file};
use services::chats::ChatStore;
use services::store::{default_data_dir, ConfigStore};
use services::usage::UsageTracker;
use shared::chat::{ConversationMode, Message};
use shared::settings::GeminiSettings;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroize;

use crate::workers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Setup,
    Chat,
}

/// Result of a background health check or install.
pub struct HealthReport {
    pub state: HealthState,
    pub detail: String,
}

/// Result of one background chat turn.
pub struct TurnResult {
    pub chat_id: String,
    pub user_message: String,
    pub outcome: Outcome,
}

/// Adapts the config store to the path cache the locator persists
/// through.
struct ConfigPathCache(Arc<ConfigStore>);

impl PathCache for ConfigPathCache {
    fn saved_path(&self) -> Option<String> {
        self.0.custom_cli_path()
    }

    fn save_path(&self, path: &str) {
        self.0.set_custom_cli_path(Some(path.to_string()));
    }

    fn clear_path(&self) {
        self.0.set_custom_cli_path(None);
    }
}

pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub chats: ChatStore,
    pub usage: UsageTracker,
    pub cli: CliContext,
    pub data_dir: PathBuf,

    pub screen: AppScreen,
    pub health_state: HealthState,
    pub health_detail: String,
    pub health_busy: bool,
    health_rx: Option<Receiver<HealthReport>>,

    pub active_chat: Option<String>,
    pub input_text: String,
    pub attachments: Vec<Attachment>,
    pub conversation: ConversationMode,
    pub is_thinking: bool,
    turn_rx: Option<Receiver<TurnResult>>,

    pub api_key_input: String,
    pub key_error: Option<String>,

    pub show_settings: bool,
    pub settings: GeminiSettings,
    pub mcp_input: String,
    pub ext_input: String,
}

impl AppState {
    pub fn new() -> Self {
        let data_dir = default_data_dir();
        let config = Arc::new(ConfigStore::open(data_dir.clone()));
        let chats = ChatStore::open(data_dir.clone());
        let usage = UsageTracker::open(data_dir.clone());
        let settings = config.settings();

        let cli = CliContext::new(
            DetectedOs::detect(),
            Arc::new(SystemRunner),
            Arc::new(ConfigPathCache(Arc::clone(&config))),
            Some(data_dir.clone()),
        );

        let screen = if config.setup_complete() {
            AppScreen::Chat
        } else {
            AppScreen::Setup
        };

        let mcp_input = settings.mcp_servers.join(", ");
        let ext_input = settings.extensions.join(", ");

        let mut state = Self {
            config,
            chats,
            usage,
            cli,
            data_dir,
            screen,
            health_state: HealthState::Checking,
            health_detail: String::new(),
            health_busy: false,
            health_rx: None,
            active_chat: None,
            input_text: String::new(),
            attachments: Vec::new(),
            conversation: ConversationMode::default(),
            is_thinking: false,
            turn_rx: None,
            api_key_input: String::new(),
            key_error: None,
            show_settings: false,
            settings,
            mcp_input,
            ext_input,
        };
        state.active_chat = state.chats.list().first().map(|c| c.id.clone());
        // Verify the environment on every launch, even after a
        // completed setup; installs get removed and keys get revoked.
        state.start_health_check();
        state
    }

    pub fn start_health_check(&mut self) {
        if self.health_busy {
            return;
        }
        self.health_busy = true;
        self.health_state = HealthState::Checking;
        self.health_detail.clear();
        let (tx, rx) = channel();
        self.health_rx = Some(rx);
        workers::run_health_check(self.cli.clone(), self.settings.clone(), tx);
    }

    pub fn start_install(&mut self) {
        if self.health_busy {
            return;
        }
        self.health_busy = true;
        self.health_state = HealthState::Checking;
        self.health_detail.clear();
        let (tx, rx) = channel();
        self.health_rx = Some(rx);
        workers::run_install(self.cli.clone(), self.settings.clone(), tx);
    }

    /// Check for a finished health check or install (called each frame).
    pub fn poll_health(&mut self) {
        let Some(rx) = &self.health_rx else { return };
        let Ok(report) = rx.try_recv() else { return };
        self.health_rx = None;
        self.health_busy = false;
        self.health_state = report.state;
        self.health_detail = report.detail;

        match report.state {
            HealthState::Ready => {
                if !self.config.setup_complete() {
                    self.config.set_setup_complete(true);
                }
                self.screen = AppScreen::Chat;
            }
            HealthState::NeedsCli | HealthState::NeedsKey => {
                self.screen = AppScreen::Setup;
            }
            HealthState::Error if !self.config.setup_complete() => {
                self.screen = AppScreen::Setup;
            }
            _ => {}
        }
    }

    /// Validate the entered key, write the env file the CLI reads, and
    /// re-run the full check. The key text is wiped either way.
    pub fn submit_api_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        if let Err(e) = validate_key_format(&key) {
            self.key_error = Some(e.to_string());
            return;
        }
        match write_env_file(&self.data_dir, &key) {
            Ok(path) => {
                info!(path = %path.display(), "API key saved");
                self.key_error = None;
                self.api_key_input.zeroize();
                self.api_key_input.clear();
                self.start_health_check();
            }
            Err(e) => {
                self.key_error = Some(format!("Could not save the key: {}", e));
            }
        }
    }

    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() || self.is_thinking {
            return;
        }

        let chat_id = match &self.active_chat {
            Some(id) if self.chats.get(id).is_some() => id.clone(),
            _ => {
                let id = self.chats.create(&self.settings.model);
                self.active_chat = Some(id.clone());
                id
            }
        };
        self.chats.add_message(&chat_id, Message::user(text.clone()));
        self.usage.increment();

        let program = CliLocator::new(&self.cli).cli_program();
        let invocation =
            build_invocation(&program, &text, &self.settings, &self.conversation, &self.attachments);
        self.attachments.clear();
        self.input_text.clear();
        self.is_thinking = true;

        let (tx, rx) = channel();
        self.turn_rx = Some(rx);
        workers::run_chat_turn(self.cli.clone(), invocation, chat_id, text, tx);
    }

    /// Check for a finished chat turn (called each frame).
    pub fn poll_turn(&mut self) {
        let Some(rx) = &self.turn_rx else { return };
        let Ok(result) = rx.try_recv() else { return };
        self.turn_rx = None;
        self.is_thinking = false;

        let reply = match result.outcome {
            Outcome::Success(text) => {
                if self.conversation.enabled {
                    self.conversation.record_turn(&result.user_message, &text);
                }
                text
            }
            Outcome::RateLimited => {
                self.usage.set_to_limit();
                "The daily free quota is used up. It resets at midnight Pacific time; \
                 until then requests will keep failing."
                    .to_string()
            }
            Outcome::NotFound => {
                // Never jump straight to NeedsCli; the locator
                // re-derives the state through Checking.
                self.screen = AppScreen::Setup;
                self.start_health_check();
                "The Gemini CLI is no longer reachable. Heading back to setup.".to_string()
            }
            Outcome::AuthError(detail) => {
                format!("The API key was rejected: {}", detail)
            }
            Outcome::GenericError(detail) => {
                format!("Something went wrong:\n\n{}", detail)
            }
        };
        self.chats
            .add_message(&result.chat_id, Message::assistant(reply, Some(self.settings.model.clone())));
    }

    pub fn new_chat(&mut self) {
        let id = self.chats.create(&self.settings.model);
        self.active_chat = Some(id);
        self.conversation.clear_history();
    }

    pub fn delete_chat(&mut self, id: &str) {
        self.chats.delete(id);
        if self.active_chat.as_deref() == Some(id) {
            self.active_chat = self.chats.list().first().map(|c| c.id.clone());
        }
    }

    /// File picker for attachments; unreadable files are skipped.
    pub fn pick_attachments(&mut self) {
        let Some(paths) = rfd::FileDialog::new().pick_files() else {
            return;
        };
        for path in paths {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    self.attachments.push(Attachment { name, content });
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read attachment");
                }
            }
        }
    }

    /// Push the edited settings (including the comma-separated list
    /// fields) into the config store.
    pub fn apply_settings(&mut self) {
        self.settings.mcp_servers = split_csv(&self.mcp_input);
        self.settings.extensions = split_csv(&self.ext_input);
        self.config.set_settings(self.settings.clone());
    }
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gemini_cli::{CommandRunner, ExecOutput};
    use std::path::Path;
    use std::time::Duration;

    /// Every command behaves like a missing binary.
    struct DeadRunner;

    #[async_trait]
    impl CommandRunner for DeadRunner {
        async fn run(
            &self,
            program: &str,
            _args: &[String],
            _stdin: Option<&str>,
            _cwd: Option<&Path>,
            _timeout: Duration,
        ) -> anyhow::Result<ExecOutput> {
            Ok(ExecOutput {
                code: 127,
                stdout: String::new(),
                stderr: format!("{}: command not found", program),
            })
        }
    }

    fn state_in(dir: &Path) -> AppState {
        let config = Arc::new(ConfigStore::open(dir.to_path_buf()));
        let cli = CliContext::new(
            DetectedOs::Mac,
            Arc::new(DeadRunner),
            Arc::new(ConfigPathCache(Arc::clone(&config))),
            None,
        );
        let settings = config.settings();
        AppState {
            config,
            chats: ChatStore::open(dir.to_path_buf()),
            usage: UsageTracker::open(dir.to_path_buf()),
            cli,
            data_dir: dir.to_path_buf(),
            screen: AppScreen::Chat,
            health_state: HealthState::Ready,
            health_detail: String::new(),
            health_busy: false,
            health_rx: None,
            active_chat: None,
            input_text: String::new(),
            attachments: Vec::new(),
            conversation: ConversationMode::default(),
            is_thinking: false,
            turn_rx: None,
            api_key_input: String::new(),
            key_error: None,
            show_settings: false,
            settings,
            mcp_input: String::new(),
            ext_input: String::new(),
        }
    }

    fn deliver_turn(s: &mut AppState, chat_id: &str, outcome: Outcome) {
        let (tx, rx) = channel();
        s.turn_rx = Some(rx);
        s.is_thinking = true;
        tx.send(TurnResult {
            chat_id: chat_id.to_string(),
            user_message: "hi".to_string(),
            outcome,
        })
        .unwrap();
        s.poll_turn();
    }

    #[test]
    fn csv_splitting_trims_and_drops_empties() {
        assert_eq!(split_csv("files, web search , ,"), vec!["files", "web search"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn lost_cli_re_enters_through_checking_not_needs_cli() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = state_in(dir.path());
        let chat_id = s.chats.create("gemini-2.5-flash");

        deliver_turn(&mut s, &chat_id, Outcome::NotFound);

        // The state machine owns the transition: back through Checking,
        // never a direct Ready -> NeedsCli edge.
        assert_eq!(s.health_state, HealthState::Checking);
        assert!(s.health_busy);
        assert_eq!(s.screen, AppScreen::Setup);
        assert!(!s.is_thinking);
        let last = s.chats.get(&chat_id).unwrap().messages.last().unwrap().clone();
        assert_eq!(last.role, "assistant");
        assert!(last.content.contains("no longer reachable"));
    }

    #[test]
    fn rate_limited_turn_pushes_usage_to_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = state_in(dir.path());
        let chat_id = s.chats.create("gemini-2.5-flash");

        deliver_turn(&mut s, &chat_id, Outcome::RateLimited);

        assert!(s.usage.daily_fraction() > 0.9);
        assert_eq!(s.health_state, HealthState::Ready, "quota is not a health problem");
        assert_eq!(s.screen, AppScreen::Chat);
    }
}
