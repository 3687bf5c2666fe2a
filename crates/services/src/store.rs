//! Local JSON config store: the saved custom CLI path, Gemini
//! settings, and the setup-complete flag.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::settings::GeminiSettings;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store file: {0}")]
    Json(#[from] serde_json::Error),
}

/// App data directory, shared by the config store, chat store, usage
/// tracker, and the `.gemini/.env` file the CLI loads its key from.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com.local", "Gemini Desk", "GeminiDesk")
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./gemini-desk"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AppConfig {
    #[serde(default)]
    custom_cli_path: Option<String>,
    #[serde(default)]
    settings: GeminiSettings,
    #[serde(default)]
    setup_complete: bool,
}

/// `config.json` under the app data dir. Every mutation saves
/// immediately; a missing or corrupt file loads as defaults.
pub struct ConfigStore {
    path: PathBuf,
    config: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn open(dir: PathBuf) -> Self {
        let path = dir.join("config.json");
        let config = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "corrupt config, using defaults");
                AppConfig::default()
            }),
            Err(_) => AppConfig::default(),
        };
        Self {
            path,
            config: Mutex::new(config),
        }
    }

    pub fn open_default() -> Self {
        Self::open(default_data_dir())
    }

    pub fn settings(&self) -> GeminiSettings {
        self.config.lock().settings.clone()
    }

    pub fn set_settings(&self, settings: GeminiSettings) {
        self.config.lock().settings = settings;
        self.save();
    }

    pub fn custom_cli_path(&self) -> Option<String> {
        self.config.lock().custom_cli_path.clone()
    }

    pub fn set_custom_cli_path(&self, path: Option<String>) {
        self.config.lock().custom_cli_path = path;
        self.save();
    }

    pub fn setup_complete(&self) -> bool {
        self.config.lock().setup_complete
    }

    pub fn set_setup_complete(&self, complete: bool) {
        self.config.lock().setup_complete = complete;
        self.save();
    }

    fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!(path = %self.path.display(), error = %e, "failed to save config");
        }
    }

    fn try_save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.config.lock())?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_custom_path_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ConfigStore::open(dir.path().to_path_buf());
            store.set_custom_cli_path(Some("/opt/homebrew/bin/gemini".into()));
            let mut settings = store.settings();
            settings.sandbox = true;
            settings.model = "gemini-2.5-pro".into();
            store.set_settings(settings);
        }
        let reopened = ConfigStore::open(dir.path().to_path_buf());
        assert_eq!(
            reopened.custom_cli_path().as_deref(),
            Some("/opt/homebrew/bin/gemini")
        );
        assert!(reopened.settings().sandbox);
        assert_eq!(reopened.settings().model, "gemini-2.5-pro");
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{not json").unwrap();
        let store = ConfigStore::open(dir.path().to_path_buf());
        assert!(store.custom_cli_path().is_none());
        assert!(!store.setup_complete());
    }

    #[test]
    fn clearing_the_path_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().to_path_buf());
        store.set_custom_cli_path(Some("/tmp/gemini".into()));
        store.set_custom_cli_path(None);
        let reopened = ConfigStore::open(dir.path().to_path_buf());
        assert!(reopened.custom_cli_path().is_none());
    }
}
