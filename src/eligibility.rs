//! Crafting relevance check for item documents

use crate::config::SyncConfig;
use crate::models::ItemDocument;

/// Matches documents whose info blocks carry the crafting marker label
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    locale: String,
    marker: String,
}

impl EligibilityFilter {
    pub fn new(locale: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            marker: marker.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.locale.clone(), config.crafting_marker.clone())
    }

    /// True iff any element label in the configured locale equals the marker exactly
    pub fn is_eligible(&self, doc: &ItemDocument) -> bool {
        doc.labels(&self.locale).any(|label| label == self.marker)
    }
}
