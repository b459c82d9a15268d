use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_quantity() -> f64 {
    1.0
}

/// A stock position as stored in the holdings collection.
///
/// `current_price` mirrors the last successfully quoted price and is
/// advisory only; valuation always prefers a live quote lookup.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(rename = "_id")]
    pub id: String,
    pub symbol: String,
    pub company_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    pub purchase_price: f64,
    #[serde(default)]
    pub current_price: f64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_updated: DateTime<Utc>,
}

/// Payload for creating a holding.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateStock {
    pub symbol: String,
    pub company_name: String,
    pub purchase_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

/// Payload for updating a holding; absent fields keep their stored value.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStock {
    pub symbol: Option<String>,
    pub company_name: Option<String>,
    pub purchase_price: Option<f64>,
    pub quantity: Option<f64>,
}

/// A price quote from the upstream feed. Transient, never persisted.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl Quote {
    /// Build a quote from the provider's price pair, deriving the change
    /// fields. A zero previous close yields a zero change percentage.
    pub fn new(symbol: impl Into<String>, price: f64, previous_close: f64) -> Self {
        let change = price - previous_close;
        let change_percent = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };
        Self {
            symbol: symbol.into(),
            price,
            previous_close,
            change,
            change_percent,
        }
    }
}

/// Per-position metrics derived during valuation.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PositionMetrics {
    pub id: String,
    pub symbol: String,
    pub company_name: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub invested_amount: f64,
    pub current_amount: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
}

/// A symbol's share of the portfolio's current value.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSlice {
    pub symbol: String,
    pub percentage: f64,
}

/// Aggregate portfolio metrics. Recomputed on every request, never stored.
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub total_investment: f64,
    pub current_value: f64,
    pub total_profit_loss: f64,
    pub profit_loss_percentage: f64,
    pub top_performer: Option<PositionMetrics>,
    pub top_gainers: Vec<PositionMetrics>,
    pub top_losers: Vec<PositionMetrics>,
    pub distribution: Vec<DistributionSlice>,
    /// Symbols whose quote lookup failed; their holdings are excluded from
    /// every aggregate above.
    pub unresolved: Vec<String>,
}

/// Response for the market index quote endpoint.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    /// True when the quote is an expired cache entry served because the
    /// upstream refresh failed.
    pub stale: bool,
}
