//! Lang Price Sync - auction prices for localization files
//!
//! Lists item documents from the game catalog, keeps the ones used for
//! crafting, averages their recent auction prices and writes a price
//! annotation next to each item's name in a localization file.

pub mod catalog;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod market;
pub mod models;
pub mod patcher;
pub mod pipeline;
pub mod pricing;

pub use catalog::CatalogClient;
pub use config::SyncConfig;
pub use eligibility::EligibilityFilter;
pub use error::{Result, SyncError};
pub use market::{HistoryOutcome, MarketClient};
pub use models::{CatalogEntry, Item, ItemDocument, ItemId, ItemPrice, Transaction};
pub use patcher::{patch_file, patch_text, PatchReport};
pub use pipeline::{SyncEvent, SyncHandle, SyncPipeline, SyncState, SyncSummary};
pub use pricing::{aggregate, classify, PriceTier};
