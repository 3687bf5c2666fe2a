//! Chat transcript persistence: one JSON file per conversation.

use shared::chat::{Chat, Message};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Loads, saves, and lists chats under `<data_dir>/chats/`.
pub struct ChatStore {
    base_path: PathBuf,
    chats: Vec<Chat>,
}

impl ChatStore {
    pub fn open(dir: PathBuf) -> Self {
        let base_path = dir.join("chats");
        let mut store = Self {
            base_path,
            chats: Vec::new(),
        };
        store.load_all();
        store
    }

    fn load_all(&mut self) {
        let _ = fs::create_dir_all(&self.base_path);
        let mut chats = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.base_path) {
            for entry in entries.flatten() {
                if let Ok(content) = fs::read_to_string(entry.path()) {
                    match serde_json::from_str::<Chat>(&content) {
                        Ok(chat) => chats.push(chat),
                        Err(e) => {
                            warn!(path = %entry.path().display(), error = %e, "skipping unreadable chat")
                        }
                    }
                }
            }
        }
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.chats = chats;
    }

    /// Chats, most recently updated first.
    pub fn list(&self) -> &[Chat] {
        &self.chats
    }

    pub fn get(&self, id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn create(&mut self, model: &str) -> String {
        let chat = Chat::new(model);
        let id = chat.id.clone();
        self.save(&chat);
        self.chats.insert(0, chat);
        id
    }

    pub fn add_message(&mut self, id: &str, msg: Message) {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == id) {
            chat.add_message(msg);
            let snapshot = chat.clone();
            self.save(&snapshot);
            self.chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        }
    }

    pub fn delete(&mut self, id: &str) {
        if let Some(pos) = self.chats.iter().position(|c| c.id == id) {
            let chat = self.chats.remove(pos);
            let _ = fs::remove_file(self.chat_path(&chat.id));
        }
    }

    fn save(&self, chat: &Chat) {
        let path = self.chat_path(&chat.id);
        match serde_json::to_string_pretty(chat) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!(path = %path.display(), error = %e, "failed to save chat");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize chat"),
        }
    }

    fn chat_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }
}
