//! Configuration file handling.
//!
//! `~/.salesos/config.json`, serde-typed. The invoicing section is optional:
//! when absent, every matching/reconciliation/link operation fails fast with
//! a configuration error instead of silently returning empty results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// External invoicing store. None = integration not configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoicing: Option<InvoicingConfig>,
}

/// Connection settings for the invoicing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicingConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Resolve `~/.salesos/config.json`.
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".salesos").join("config.json"))
}

/// Load the config file. A missing file is not an error — it means nothing
/// has been configured yet.
pub fn load_config() -> Result<Option<Config>, String> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let config: Config = serde_json::from_str(&content)
        .map_err(|e| format!("Config file is not valid JSON: {}", e))?;
    Ok(Some(config))
}

/// Write the config file, creating `~/.salesos/` if needed.
pub fn save_config(config: &Config) -> Result<(), String> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let formatted = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, formatted).map_err(|e| format!("Failed to write config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses_without_invoicing_section() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.invoicing.is_none());
    }

    #[test]
    fn test_config_parses_invoicing_section() {
        let config: Config = serde_json::from_str(
            r#"{"invoicing":{"baseUrl":"https://api.example.com/v1","apiKey":"sk-test"}}"#,
        )
        .unwrap();
        let invoicing = config.invoicing.unwrap();
        assert_eq!(invoicing.base_url, "https://api.example.com/v1");
        assert_eq!(invoicing.api_key, "sk-test");
    }
}
