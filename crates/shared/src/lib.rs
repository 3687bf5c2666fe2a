pub mod chat;

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_model() -> String {
        "gemini-2.5-flash".to_string()
    }

    /// Options passed through to the Gemini CLI on every turn.
    ///
    /// Each boolean maps to one CLI flag; the collections are rendered
    /// as a single flag followed by all values.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct GeminiSettings {
        #[serde(default)]
        pub sandbox: bool,
        #[serde(default)]
        pub all_files: bool,
        #[serde(default)]
        pub show_memory_usage: bool,
        #[serde(default)]
        pub debug: bool,
        #[serde(default = "default_model")]
        pub model: String,
        #[serde(default)]
        pub mcp_servers: Vec<String>,
        #[serde(default)]
        pub extensions: Vec<String>,
    }

    impl Default for GeminiSettings {
        fn default() -> Self {
            Self {
                sandbox: false,
                all_files: false,
                show_memory_usage: false,
                debug: false,
                model: default_model(),
                mcp_servers: vec![],
                extensions: vec![],
            }
        }
    }

    /// Models offered in the settings dropdown.
    pub const KNOWN_MODELS: &[&str] = &[
        "gemini-2.5-flash",
        "gemini-2.5-pro",
        "gemini-1.5-flash",
        "gemini-1.5-pro",
    ];
}
