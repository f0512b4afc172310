//! Auction history client and the per-item retry policy

use crate::config::{SyncConfig, ITEM_ID_PLACEHOLDER};
use crate::error::{Result, SyncError};
use crate::models::{HistoryResponse, ItemId, Transaction};
use std::time::Duration;

/// Total tries per item, including the first one
pub const MAX_ATTEMPTS: u32 = 2;

pub struct MarketClient {
    client: reqwest::Client,
    history_url_template: String,
    client_id: String,
    client_secret: String,
    history_limit: u32,
    user_agent: String,
}

/// Result of fetching history under the retry policy
#[derive(Debug)]
pub enum HistoryOutcome {
    Fetched(Vec<Transaction>),
    /// Every attempt failed; the item is priced at 0
    Fallback {
        last_error: SyncError,
    },
}

impl HistoryOutcome {
    /// Transactions to aggregate; a fallback contributes none, which aggregates to 0
    pub fn transactions(&self) -> &[Transaction] {
        match self {
            HistoryOutcome::Fetched(transactions) => transactions,
            HistoryOutcome::Fallback { .. } => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, HistoryOutcome::Fallback { .. })
    }
}

impl MarketClient {
    pub fn new(client: reqwest::Client, config: &SyncConfig) -> Self {
        Self {
            client,
            history_url_template: config.history_url_template.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            history_limit: config.history_limit,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Fetch recent auction transactions for one item (single request)
    pub async fn fetch_history(&self, item_id: &ItemId) -> Result<Vec<Transaction>> {
        let url = self.history_url(item_id);
        log::debug!("Fetching auction history: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Client-Id", &self.client_id)
            .header("Client-Secret", &self.client_secret)
            .query(&[("limit", self.history_limit)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus {
                url,
                status: response.status(),
            });
        }

        let body = response.text().await?;
        let history: HistoryResponse = serde_json::from_str(&body)
            .map_err(|e| SyncError::parse(format!("auction history of {}", item_id), e))?;
        Ok(history.prices)
    }

    /// Fetch history with up to [`MAX_ATTEMPTS`] tries, sleeping `retry_delay` in between.
    ///
    /// Never fails: exhausting the attempts yields [`HistoryOutcome::Fallback`].
    /// Only transport errors are retried; a body that arrives but does not
    /// parse falls back immediately.
    pub async fn fetch_history_with_retry(
        &self,
        item_id: &ItemId,
        retry_delay: Duration,
    ) -> HistoryOutcome {
        let mut attempt = 1;
        loop {
            match self.fetch_history(item_id).await {
                Ok(transactions) => return HistoryOutcome::Fetched(transactions),
                Err(e) if e.is_transport() && attempt < MAX_ATTEMPTS => {
                    log::warn!(
                        "Auction history for {} failed (attempt {}/{}): {}, retrying",
                        item_id,
                        attempt,
                        MAX_ATTEMPTS,
                        e
                    );
                    tokio::time::sleep(retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Auction history for {} unavailable, pricing at 0: {}",
                        item_id,
                        e
                    );
                    return HistoryOutcome::Fallback { last_error: e };
                }
            }
        }
    }

    fn history_url(&self, item_id: &ItemId) -> String {
        self.history_url_template
            .replace(ITEM_ID_PLACEHOLDER, &urlencoding::encode(item_id.as_str()))
    }
}

#[cfg(test)]
#[path = "market_tests.rs"]
mod tests;
