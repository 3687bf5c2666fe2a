//! Builds the argument vector for one chat turn.
//!
//! The message travels as its own argv element (one-shot) or through
//! stdin (interactive), so no shell ever parses it and no escaping
//! layer exists.

use shared::chat::ConversationMode;
use shared::settings::GeminiSettings;

/// A file the user attached to the current message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

/// One ready-to-run CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Interactive mode pipes the message here; one-shot mode leaves
    /// it empty and carries the message in `args`.
    pub stdin: Option<String>,
    pub interactive: bool,
}

impl Invocation {
    /// The exact prompt text the CLI will receive, however it travels.
    pub fn prompt(&self) -> Option<&str> {
        if self.interactive {
            self.stdin.as_deref()
        } else {
            // The value following `--prompt`.
            self.args
                .iter()
                .position(|a| a == "--prompt")
                .and_then(|i| self.args.get(i + 1))
                .map(String::as_str)
        }
    }
}

/// Assemble the full invocation from the user's message, settings,
/// conversation state, and attachments.
pub fn build_invocation(
    program: &str,
    user_message: &str,
    settings: &GeminiSettings,
    conversation: &ConversationMode,
    attachments: &[Attachment],
) -> Invocation {
    let mut args: Vec<String> = Vec::new();

    if !settings.model.is_empty() {
        args.push("--model".to_string());
        args.push(settings.model.clone());
    }
    if settings.sandbox {
        args.push("--sandbox".to_string());
    }
    if settings.all_files {
        args.push("--all-files".to_string());
    }
    if settings.show_memory_usage {
        args.push("--show-memory-usage".to_string());
    }
    if settings.debug {
        args.push("--debug".to_string());
    }
    if !settings.mcp_servers.is_empty() {
        args.push("--allowed-mcp-server-names".to_string());
        args.extend(settings.mcp_servers.iter().cloned());
    }
    if !settings.extensions.is_empty() {
        args.push("--extensions".to_string());
        args.extend(settings.extensions.iter().cloned());
    }

    let message = full_message(user_message, conversation, attachments);

    if conversation.enabled {
        args.push("--interactive".to_string());
        Invocation {
            program: program.to_string(),
            args,
            stdin: Some(message),
            interactive: true,
        }
    } else {
        args.push("--prompt".to_string());
        args.push(message);
        Invocation {
            program: program.to_string(),
            args,
            stdin: None,
            interactive: false,
        }
    }
}

/// Inline attachments and, in conversation mode, the prior transcript
/// into the message body. The CLI is stateless between invocations, so
/// continuity is simulated by replaying role-labeled turns.
fn full_message(
    user_message: &str,
    conversation: &ConversationMode,
    attachments: &[Attachment],
) -> String {
    let mut message = user_message.to_string();

    if !attachments.is_empty() {
        let mut banners = String::new();
        for file in attachments {
            banners.push_str(&format!(
                "\n\n--- File: {} ---\n{}\n--- End file ---",
                file.name, file.content
            ));
        }
        message = format!("{}\n\nAttached files:{}", message, banners);
    }

    if conversation.enabled && !conversation.message_history.is_empty() {
        let transcript = conversation
            .message_history
            .iter()
            .map(|entry| {
                let label = if entry.role == "user" { "User" } else { "Assistant" };
                format!("{}: {}", label, entry.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        message = format!(
            "Previous conversation:\n\n{}\n\nCurrent message: {}",
            transcript, message
        );
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::chat::ConversationMode;

    fn settings() -> GeminiSettings {
        GeminiSettings::default()
    }

    #[test]
    fn boolean_settings_become_single_flags() {
        let mut s = settings();
        s.sandbox = true;
        s.debug = true;
        let inv = build_invocation("gemini", "hi", &s, &ConversationMode::default(), &[]);
        assert!(inv.args.contains(&"--sandbox".to_string()));
        assert!(inv.args.contains(&"--debug".to_string()));
        assert!(!inv.args.contains(&"--all-files".to_string()));
        assert!(!inv.args.contains(&"--show-memory-usage".to_string()));
    }

    #[test]
    fn collections_render_flag_then_values() {
        let mut s = settings();
        s.mcp_servers = vec!["files".into(), "web search".into()];
        let inv = build_invocation("gemini", "hi", &s, &ConversationMode::default(), &[]);
        let pos = inv
            .args
            .iter()
            .position(|a| a == "--allowed-mcp-server-names")
            .unwrap();
        assert_eq!(inv.args[pos + 1], "files");
        // A value with a space stays one argv element; no quoting games.
        assert_eq!(inv.args[pos + 2], "web search");
    }

    #[test]
    fn quotes_and_backticks_survive_exactly() {
        let message = r#"print("hi `whoami`") and a "quoted" tail"#;
        let inv = build_invocation(
            "gemini",
            message,
            &settings(),
            &ConversationMode::default(),
            &[],
        );
        assert_eq!(inv.prompt(), Some(message));
        assert!(!inv.interactive);
    }

    #[test]
    fn attachments_are_wrapped_in_banners() {
        let files = vec![Attachment {
            name: "notes.txt".into(),
            content: "line one\nline two".into(),
        }];
        let inv = build_invocation("gemini", "summarize", &settings(), &ConversationMode::default(), &files);
        let prompt = inv.prompt().unwrap();
        assert!(prompt.starts_with("summarize"));
        assert!(prompt.contains("--- File: notes.txt ---"));
        assert!(prompt.contains("line two\n--- End file ---"));
    }

    #[test]
    fn conversation_mode_prepends_transcript_and_uses_stdin() {
        let mut mode = ConversationMode::start();
        mode.record_turn("what is rust", "A systems language.");
        let inv = build_invocation("gemini", "and cargo?", &settings(), &mode, &[]);
        assert!(inv.interactive);
        assert!(inv.args.contains(&"--interactive".to_string()));
        assert!(!inv.args.contains(&"--prompt".to_string()));
        let prompt = inv.prompt().unwrap();
        assert!(prompt.starts_with("Previous conversation:"));
        assert!(prompt.contains("User: what is rust"));
        assert!(prompt.contains("Assistant: A systems language."));
        assert!(prompt.ends_with("Current message: and cargo?"));
    }

    #[test]
    fn empty_history_adds_no_transcript() {
        let mode = ConversationMode::start();
        let inv = build_invocation("gemini", "hello", &settings(), &mode, &[]);
        assert_eq!(inv.prompt(), Some("hello"));
    }

    #[test]
    fn end_to_end_flash_sandbox_hello() {
        let mut s = settings();
        s.model = "gemini-2.5-flash".into();
        s.sandbox = true;
        s.mcp_servers = vec![];
        let inv = build_invocation("gemini", "hello", &s, &ConversationMode::default(), &[]);
        let model_pos = inv.args.iter().position(|a| a == "--model").unwrap();
        assert_eq!(inv.args[model_pos + 1], "gemini-2.5-flash");
        assert!(inv.args.contains(&"--sandbox".to_string()));
        assert!(!inv.args.contains(&"--allowed-mcp-server-names".to_string()));
        assert_eq!(inv.prompt(), Some("hello"));
    }
}
