use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::MarketData;
use crate::AppState;

/// Real-time quote for a market index or arbitrary provider symbol.
/// Index symbols (^NSEI, ^BSESN, ...) are passed to the provider as-is.
pub async fn get_market_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<(StatusCode, Json<MarketData>), (StatusCode, Json<String>)> {
    let symbol = symbol.trim().to_string();
    if symbol.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json("Symbol must not be empty".to_string()),
        ));
    }

    let cached = state.quotes.get_quote(&symbol).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(format!("Failed to fetch market data: {}", e)),
        )
    })?;

    Ok((
        StatusCode::OK,
        Json(MarketData {
            symbol,
            price: cached.quote.price,
            change: round2(cached.quote.change),
            change_percent: round2(cached.quote.change_percent),
            stale: cached.stale,
        }),
    ))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(1.005_3), 1.01);
        assert_eq!(round2(-0.456), -0.46);
        assert_eq!(round2(0.0), 0.0);
    }
}
