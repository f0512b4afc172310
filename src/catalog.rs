//! Item catalog client: directory listing and raw item documents
//!
//! Uses async reqwest; every call is a single request, retries are the
//! caller's business.

use crate::config::{SyncConfig, NAME_PLACEHOLDER};
use crate::error::{Result, SyncError};
use crate::models::{CatalogEntry, ItemDocument};

pub struct CatalogClient {
    client: reqwest::Client,
    list_url: String,
    document_url_template: String,
    user_agent: String,
}

impl CatalogClient {
    pub fn new(client: reqwest::Client, config: &SyncConfig) -> Self {
        Self {
            client,
            list_url: config.catalog_list_url.clone(),
            document_url_template: config.document_url_template.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Fetch the catalog directory listing
    pub async fn list_entries(&self) -> Result<Vec<CatalogEntry>> {
        log::info!("Fetching catalog listing from {}", self.list_url);

        let body = self.get_text(&self.list_url).await?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&body).map_err(|e| SyncError::parse("catalog listing", e))?;

        log::info!("Catalog lists {} documents", entries.len());
        Ok(entries)
    }

    /// Fetch and parse one item document by its catalog name
    pub async fn fetch_document(&self, name: &str) -> Result<ItemDocument> {
        let url = self.document_url(name);
        log::debug!("Fetching item document: {}", url);

        let body = self.get_text(&url).await?;
        let raw: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SyncError::parse(format!("document {}", name), e))?;
        Ok(ItemDocument::new(raw))
    }

    pub(crate) fn document_url(&self, name: &str) -> String {
        self.document_url_template
            .replace(NAME_PLACEHOLDER, &urlencoding::encode(name))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
