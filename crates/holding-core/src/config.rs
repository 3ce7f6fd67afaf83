use crate::error::{HoldingError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// AssistantConfig
// ---------------------------------------------------------------------------

/// Connection settings for the external AI assistant service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub base_url: String,
    #[serde(default = "default_assistant_model")]
    pub model: String,
    /// Environment variable holding the API key. The key itself never lands
    /// in config.yaml.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_assistant_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_assistant_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "ASSISTANT_API_KEY".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_url(),
            model: default_assistant_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub workspace: String,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            version: 1,
            workspace: workspace.into(),
            assistant: AssistantConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(HoldingError::NotInitialized);
        }
        crate::io::load_yaml(&path)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::save_yaml(&paths::config_path(root), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_round_trip() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::new("escritorio");
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.workspace, "escritorio");
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.assistant.api_key_env, "ASSISTANT_API_KEY");
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(HoldingError::NotInitialized)
        ));
    }
}
