use serde::{Deserialize, Serialize};
use std::path::Path;

/// Binding configuration, usually read from `viewbind.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Initial value of `track_changes` for new observable objects
    pub track_changes: bool,

    /// Ignore surrounding whitespace when parsing scalar and enum fields
    pub trim_scalar_text: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            track_changes: true,
            trim_scalar_text: true,
        }
    }
}

impl BindingConfig {
    /// Load config from a toml file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from toml text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: BindingConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Save config as pretty toml
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BindingConfig::default();
        assert!(config.track_changes);
        assert!(config.trim_scalar_text);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BindingConfig::from_toml_str("track_changes = false\n").unwrap();
        assert!(!config.track_changes);
        assert!(config.trim_scalar_text);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(BindingConfig::from_toml_str("track_changes = \"maybe\"").is_err());
    }
}
