//! Price aggregation and display-tier classification

use crate::models::Transaction;
use std::fmt;

/// Display tier of an average price.
///
/// The codes are colour indicators of the localization format, not a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceTier {
    /// below 5 000
    Low,
    /// 5 000 to 19 999
    Medium,
    /// 20 000 to 79 999
    High,
    /// 80 000 and above
    Premium,
}

impl PriceTier {
    /// Indicator code written after `§` in the annotation
    pub fn code(self) -> u8 {
        match self {
            PriceTier::Low => 7,
            PriceTier::Medium => 2,
            PriceTier::High => 5,
            PriceTier::Premium => 6,
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Mean unit price over all transactions, truncated to an integer.
///
/// Empty history yields 0. Zero-amount records are ignored.
pub fn aggregate(transactions: &[Transaction]) -> u64 {
    let unit_prices: Vec<f64> = transactions
        .iter()
        .filter_map(|tx| {
            let unit = tx.unit_price();
            if unit.is_none() {
                log::warn!("Skipping transaction with zero amount (price {})", tx.price);
            }
            unit
        })
        .collect();

    if unit_prices.is_empty() {
        return 0;
    }

    let mean = unit_prices.iter().sum::<f64>() / unit_prices.len() as f64;
    // `as` saturates: negative or NaN means become 0
    mean.trunc() as u64
}

/// Map an average price onto its tier, boundaries are inclusive on the lower side
pub fn classify(average: u64) -> PriceTier {
    match average {
        0..=4_999 => PriceTier::Low,
        5_000..=19_999 => PriceTier::Medium,
        20_000..=79_999 => PriceTier::High,
        _ => PriceTier::Premium,
    }
}
