//! Runtime configuration: remote endpoints, credentials and pipeline tuning
//!
//! Values come from a JSON file (explicit path or the per-user default) with
//! every field optional; the CLI layers its own overrides on top.

use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder replaced by the catalog file name in `document_url_template`
pub const NAME_PLACEHOLDER: &str = "{name}";
/// Placeholder replaced by the item id in `history_url_template`
pub const ITEM_ID_PLACEHOLDER: &str = "{item_id}";

const DEFAULT_CATALOG_LIST_URL: &str =
    "https://api.github.com/repos/EXBO-Studio/stalcraft-database/contents/ru/items/misc";
const DEFAULT_DOCUMENT_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/EXBO-Studio/stalcraft-database/main/ru/items/misc/{name}";
const DEFAULT_HISTORY_URL_TEMPLATE: &str =
    "https://eapi.stalcraft.net/ru/auction/{item_id}/history";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory listing of item documents (JSON array of `{name, ...}`)
    pub catalog_list_url: String,
    /// Raw document URL, `{name}` is substituted per catalog entry
    pub document_url_template: String,
    /// Auction history URL, `{item_id}` is substituted per item
    pub history_url_template: String,
    pub client_id: String,
    pub client_secret: String,
    /// Number of history records requested per item
    pub history_limit: u32,
    /// Locale whose label lines are checked for the crafting marker
    pub locale: String,
    pub crafting_marker: String,
    pub user_agent: String,
    /// Pause between the two history attempts
    pub retry_delay_ms: u64,
    /// Maximum in-flight requests per phase
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            catalog_list_url: DEFAULT_CATALOG_LIST_URL.to_string(),
            document_url_template: DEFAULT_DOCUMENT_URL_TEMPLATE.to_string(),
            history_url_template: DEFAULT_HISTORY_URL_TEMPLATE.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            history_limit: 200,
            locale: "ru".to_string(),
            crafting_marker: "Используется для крафтов".to_string(),
            user_agent: "lang_price_sync/1.0".to_string(),
            retry_delay_ms: 1000,
            concurrency: 4,
        }
    }
}

impl SyncConfig {
    /// Load configuration from `path`, or from the default location if it exists.
    ///
    /// Falls back to built-in defaults when no file is given and none is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        log::info!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(&path).map_err(|e| SyncError::io(&path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| SyncError::parse(format!("config file {}", path.display()), e))
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(SyncError::Config(
                "auction API client id and secret are required".to_string(),
            ));
        }
        if !self.document_url_template.contains(NAME_PLACEHOLDER) {
            return Err(SyncError::Config(format!(
                "document_url_template must contain {}",
                NAME_PLACEHOLDER
            )));
        }
        if !self.history_url_template.contains(ITEM_ID_PLACEHOLDER) {
            return Err(SyncError::Config(format!(
                "history_url_template must contain {}",
                ITEM_ID_PLACEHOLDER
            )));
        }
        if self.concurrency == 0 {
            return Err(SyncError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(SyncError::Config(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Returns the default config path: ~/.config/lang_price_sync/config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lang_price_sync").join("config.json"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
