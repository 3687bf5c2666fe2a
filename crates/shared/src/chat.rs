//! Chat transcript types shared between the UI and the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One turn in a chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: String, // "user" | "assistant"
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content, None)
    }

    pub fn assistant(content: impl Into<String>, model: Option<String>) -> Self {
        Self::new("assistant", content, model)
    }

    fn new(role: &str, content: impl Into<String>, model: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: role.to_string(),
            content: content.into(),
            timestamp: Utc::now(),
            model,
        }
    }
}

/// A saved conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub model: String,
}

impl Chat {
    pub fn new(model: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: "New conversation".to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            model: model.to_string(),
        }
    }

    /// Append a message, deriving the title from the first user turn.
    pub fn add_message(&mut self, msg: Message) {
        if self.title == "New conversation" && msg.role == "user" {
            self.title = msg.content.chars().take(40).collect::<String>().trim().to_string();
            if msg.content.chars().count() > 40 {
                self.title.push_str("...");
            }
        }
        self.messages.push(msg);
        self.updated_at = Utc::now();
    }
}

/// One remembered exchange entry in conversation mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String, // "user" | "assistant"
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Whether turns carry prior context, and the context itself.
///
/// The history grows by exactly two entries (user, assistant) per
/// completed turn and is cleared on reset or when the mode is turned
/// off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMode {
    pub enabled: bool,
    pub session_id: Option<String>,
    pub message_history: Vec<HistoryEntry>,
}

impl ConversationMode {
    pub fn start() -> Self {
        Self {
            enabled: true,
            session_id: Some(Uuid::new_v4().to_string()),
            message_history: Vec::new(),
        }
    }

    pub fn stop(&mut self) {
        self.enabled = false;
        self.session_id = None;
        self.message_history.clear();
    }

    pub fn clear_history(&mut self) {
        self.message_history.clear();
    }

    /// Record one completed turn.
    pub fn record_turn(&mut self, user: &str, assistant: &str) {
        let now = Utc::now();
        self.message_history.push(HistoryEntry {
            role: "user".to_string(),
            content: user.to_string(),
            timestamp: now,
        });
        self.message_history.push(HistoryEntry {
            role: "assistant".to_string(),
            content: assistant.to_string(),
            timestamp: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_derived_from_first_user_message() {
        let mut chat = Chat::new("gemini-2.5-flash");
        chat.add_message(Message::assistant("Hi! How can I help?", None));
        assert_eq!(chat.title, "New conversation");
        chat.add_message(Message::user("Explain borrow checking in Rust to me please"));
        assert!(chat.title.starts_with("Explain borrow checking"));
        assert!(chat.title.ends_with("..."));
    }

    #[test]
    fn conversation_turn_grows_history_by_two() {
        let mut mode = ConversationMode::start();
        assert!(mode.enabled);
        mode.record_turn("hello", "hi there");
        assert_eq!(mode.message_history.len(), 2);
        assert_eq!(mode.message_history[0].role, "user");
        assert_eq!(mode.message_history[1].role, "assistant");
        mode.stop();
        assert!(mode.message_history.is_empty());
        assert!(mode.session_id.is_none());
    }
}
