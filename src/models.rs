//! Data types shared by the catalog, market and patch stages

use crate::error::{Result, SyncError};
use crate::pricing::PriceTier;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// One entry of the remote catalog directory listing
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Document file name, used to build the raw-content URL
    pub name: String,
}

/// Opaque item identifier; the catalog ships it as a string or an integer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts JSON strings and numbers, anything else is not an id
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item description document as served by the catalog.
///
/// Kept as raw JSON: the document schema is loose and any field may be
/// absent or shaped differently, which must never fail eligibility checks.
#[derive(Debug, Clone)]
pub struct ItemDocument {
    raw: Value,
}

impl ItemDocument {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn item_id(&self) -> Option<ItemId> {
        self.raw.get("id").and_then(ItemId::from_json)
    }

    /// Localization key under `name.key`
    pub fn name_key(&self) -> Option<&str> {
        self.raw.get("name")?.get("key")?.as_str()
    }

    /// All `name.lines.<locale>` labels over every element of every info block
    pub fn labels<'a>(&'a self, locale: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.raw
            .get("infoBlocks")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|block| block.get("elements").and_then(Value::as_array))
            .flatten()
            .filter_map(move |element| element.get("name")?.get("lines")?.get(locale)?.as_str())
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// One auction record; unit price is `price / amount`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Transaction {
    pub price: f64,
    pub amount: f64,
}

impl Transaction {
    /// `None` for a zero amount, which carries no unit price
    pub fn unit_price(&self) -> Option<f64> {
        if self.amount == 0.0 {
            None
        } else {
            Some(self.price / self.amount)
        }
    }
}

/// Auction history endpoint response
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub prices: Vec<Transaction>,
}

/// Aggregated market price attached to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPrice {
    pub average: u64,
    pub tier: PriceTier,
}

impl ItemPrice {
    pub fn from_average(average: u64) -> Self {
        Self {
            average,
            tier: crate::pricing::classify(average),
        }
    }

    /// Localization annotation, e.g. `^(§7 1000руб.)`
    pub fn annotation(&self) -> String {
        format!("^(§{} {}руб.)", self.tier.code(), self.average)
    }
}

/// Crafting-relevant item found in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub item_id: ItemId,
    pub name_key: String,
    price: Option<ItemPrice>,
}

impl Item {
    pub fn new(item_id: ItemId, name_key: impl Into<String>) -> Self {
        Self {
            item_id,
            name_key: name_key.into(),
            price: None,
        }
    }

    /// Build an item from an eligible document
    pub fn from_document(document_name: &str, doc: &ItemDocument) -> Result<Self> {
        let missing = |field| SyncError::MissingField {
            document: document_name.to_string(),
            field,
        };
        let item_id = doc.item_id().ok_or_else(|| missing("id"))?;
        let name_key = doc.name_key().ok_or_else(|| missing("name.key"))?;
        Ok(Self::new(item_id, name_key))
    }

    /// Attach the market price. Only the first call has an effect.
    pub fn attach_price(&mut self, price: ItemPrice) {
        if self.price.is_some() {
            log::warn!("Price for {} already attached, ignoring", self.name_key);
            return;
        }
        self.price = Some(price);
    }

    pub fn price(&self) -> Option<ItemPrice> {
        self.price
    }

    pub fn average_price(&self) -> Option<u64> {
        self.price.map(|p| p.average)
    }

    pub fn price_indicator(&self) -> Option<PriceTier> {
        self.price.map(|p| p.tier)
    }
}
