use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::QuoteError;
use crate::models::Quote;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo drops requests without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Bounds a single upstream call so one stalled request cannot freeze a
/// whole valuation request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream quote lookup, keyed by provider symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError>;
}

/// Response structure for the Yahoo Finance chart API, reduced to the
/// fields the backend cares about.
#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>, // Current price
    chart_previous_close: Option<f64>, // Previous session close
    regular_market_previous_close: Option<f64>,
}

/// Yahoo Finance quote client with a single shared connection pool.
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        // Index symbols like ^NSEI need their caret percent-encoded.
        let url = format!(
            "{}/{}?interval=1d&range=1d",
            CHART_URL,
            urlencoding::encode(symbol)
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(QuoteError::Status {
                symbol: symbol.to_string(),
                status: response.status(),
            });
        }

        let body: ChartResponse = response.json().await?;
        let meta = body
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0).meta)
                }
            })
            .ok_or_else(|| QuoteError::MissingPrice {
                symbol: symbol.to_string(),
            })?;

        let price = meta
            .regular_market_price
            .filter(|price| *price > 0.0)
            .ok_or_else(|| QuoteError::MissingPrice {
                symbol: symbol.to_string(),
            })?;

        let previous_close = meta
            .chart_previous_close
            .or(meta.regular_market_previous_close)
            .unwrap_or(price);

        Ok(Quote::new(symbol, price, previous_close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_response_parses_meta() {
        let raw = r#"{
            "chart": {
                "result": [
                    {"meta": {"regularMarketPrice": 23500.5, "chartPreviousClose": 23400.0}}
                ],
                "error": null
            }
        }"#;
        let body: ChartResponse = serde_json::from_str(raw).unwrap();
        let meta = &body.chart.result.unwrap()[0].meta;
        assert_eq!(meta.regular_market_price, Some(23500.5));
        assert_eq!(meta.chart_previous_close, Some(23400.0));
    }

    #[test]
    fn chart_response_tolerates_missing_result() {
        let raw = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        let body: ChartResponse = serde_json::from_str(raw).unwrap();
        assert!(body.chart.result.is_none());
    }
}
