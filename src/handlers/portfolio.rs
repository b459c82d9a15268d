use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use futures_util::future::join_all;

use crate::handlers::provider_symbol;
use crate::models::{PortfolioMetrics, Quote};
use crate::valuation::compute_metrics;
use crate::AppState;

/// Compute live portfolio metrics over the current holdings snapshot.
///
/// One quote lookup per distinct symbol, issued concurrently through the
/// cache. A failed lookup leaves the position in `unresolved` rather than
/// failing the request, so the dashboard can still render the rest.
pub async fn get_portfolio_metrics(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<PortfolioMetrics>), (StatusCode, Json<String>)> {
    let holdings = state.store.list_all().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(format!("Failed to load holdings: {}", e)),
        )
    })?;

    let mut symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();
    symbols.sort();
    symbols.dedup();

    let lookups = join_all(symbols.into_iter().map(|symbol| {
        let quotes = state.quotes.clone();
        async move {
            let result = quotes.get_quote(&provider_symbol(&symbol)).await;
            (symbol, result)
        }
    }))
    .await;

    let mut resolved: HashMap<String, Quote> = HashMap::new();
    for (symbol, result) in lookups {
        match result {
            Ok(cached) => {
                if cached.stale {
                    tracing::warn!(
                        "Using last known quote for {} ({}s old)",
                        symbol,
                        cached.age().as_secs()
                    );
                }
                resolved.insert(symbol, cached.quote);
            }
            Err(e) => {
                tracing::warn!("No quote for {}: {}", symbol, e);
            }
        }
    }

    let metrics = compute_metrics(&holdings, |symbol| resolved.get(symbol).cloned());

    Ok((StatusCode::OK, Json(metrics)))
}
