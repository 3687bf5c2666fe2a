//! API key validation and the `.gemini/.env` file the CLI reads.
//!
//! The key never lands in the process environment or on a command
//! line; the CLI picks it up from the env file in its working
//! directory.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the data dir that the CLI scans for its env file.
pub const GEMINI_ENV_DIR: &str = ".gemini";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("API key is empty")]
    Empty,
    #[error("API key should start with \"AI\"")]
    BadPrefix,
    #[error("API key looks too short")]
    TooShort,
}

/// Check the shape of a Google AI Studio key before accepting it.
/// Keys start with "AI" and run well past 30 characters.
pub fn validate_key_format(key: &str) -> Result<(), KeyError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if !key.starts_with("AI") {
        return Err(KeyError::BadPrefix);
    }
    if key.chars().count() < 30 {
        return Err(KeyError::TooShort);
    }
    Ok(())
}

/// Write `<dir>/.gemini/.env` containing the key, creating the
/// directory as needed. Returns the path to the env file.
pub fn write_env_file(dir: &Path, key: &str) -> anyhow::Result<PathBuf> {
    validate_key_format(key)?;
    let env_dir = dir.join(GEMINI_ENV_DIR);
    fs::create_dir_all(&env_dir)?;
    let env_path = env_dir.join(".env");
    fs::write(&env_path, format!("GEMINI_API_KEY={}\n", key.trim()))?;
    Ok(env_path)
}

/// True when an env file with a plausible key already exists.
pub fn env_file_present(dir: &Path) -> bool {
    let env_path = dir.join(GEMINI_ENV_DIR).join(".env");
    match fs::read_to_string(env_path) {
        Ok(content) => content
            .lines()
            .any(|line| line.trim().strip_prefix("GEMINI_API_KEY=").is_some_and(|v| !v.is_empty())),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_KEY: &str = "AIzaSyA1234567890abcdefghijklmnop";

    #[test]
    fn accepts_a_plausible_key() {
        assert_eq!(validate_key_format(GOOD_KEY), Ok(()));
        assert_eq!(validate_key_format(&format!("  {}  ", GOOD_KEY)), Ok(()));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(validate_key_format(""), Err(KeyError::Empty));
        assert_eq!(validate_key_format("   "), Err(KeyError::Empty));
        assert_eq!(
            validate_key_format("sk-1234567890abcdefghijklmnopqrst"),
            Err(KeyError::BadPrefix)
        );
        assert_eq!(validate_key_format("AIzaShort"), Err(KeyError::TooShort));
    }

    #[test]
    fn writes_env_file_the_cli_can_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env_file(dir.path(), GOOD_KEY).unwrap();
        assert_eq!(path, dir.path().join(".gemini/.env"));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("GEMINI_API_KEY={}\n", GOOD_KEY));
        assert!(env_file_present(dir.path()));
    }

    #[test]
    fn bad_key_never_reaches_disk() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_env_file(dir.path(), "nope").is_err());
        assert!(!env_file_present(dir.path()));
    }
}
