use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::oid::ObjectId;
use chrono::Utc;

use crate::handlers::provider_symbol;
use crate::models::{CreateStock, Holding, UpdateStock};
use crate::AppState;

/// List all holdings with their prices refreshed through the quote cache.
/// A symbol that cannot be priced keeps its last mirrored value instead of
/// failing the whole listing.
pub async fn list_stocks(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Holding>>), (StatusCode, Json<String>)> {
    let mut holdings = state.store.list_all().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(format!("Failed to load holdings: {}", e)),
        )
    })?;

    for holding in &mut holdings {
        match state
            .quotes
            .get_quote(&provider_symbol(&holding.symbol))
            .await
        {
            Ok(cached) => {
                holding.current_price = cached.quote.price;
                holding.last_updated = Utc::now();
                if let Err(e) = state
                    .store
                    .update_price(&holding.id, cached.quote.price, holding.last_updated)
                    .await
                {
                    tracing::error!("Failed to persist price for {}: {}", holding.symbol, e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to refresh price for {}: {}", holding.symbol, e);
            }
        }
    }

    Ok((StatusCode::OK, Json(holdings)))
}

/// Add a new holding. The symbol must be priceable at creation time.
#[axum::debug_handler]
pub async fn create_stock(
    State(state): State<AppState>,
    Json(payload): Json<CreateStock>,
) -> Result<(StatusCode, Json<Holding>), (StatusCode, Json<String>)> {
    let symbol = payload.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json("Symbol must not be empty".to_string()),
        ));
    }
    if payload.quantity < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json("Quantity must not be negative".to_string()),
        ));
    }

    let cached = state
        .quotes
        .get_quote(&provider_symbol(&symbol))
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(format!("Error fetching stock price: {}", e)),
            )
        })?;

    let holding = Holding {
        id: ObjectId::new().to_hex(),
        symbol,
        company_name: payload.company_name,
        quantity: payload.quantity,
        purchase_price: payload.purchase_price,
        current_price: cached.quote.price,
        last_updated: Utc::now(),
    };

    state.store.insert(&holding).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(format!("Failed to create stock: {}", e)),
        )
    })?;

    Ok((StatusCode::CREATED, Json(holding)))
}

/// Partially update a holding and re-price it.
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStock>,
) -> Result<(StatusCode, Json<Holding>), (StatusCode, Json<String>)> {
    let mut holding = state
        .store
        .find_by_id(&id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(format!("Database error: {}", e)),
            )
        })?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json("Stock not found".to_string()),
        ))?;

    if let Some(symbol) = payload.symbol {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            holding.symbol = symbol;
        }
    }
    if let Some(company_name) = payload.company_name {
        holding.company_name = company_name;
    }
    if let Some(purchase_price) = payload.purchase_price {
        holding.purchase_price = purchase_price;
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 0.0 {
            return Err((
                StatusCode::BAD_REQUEST,
                Json("Quantity must not be negative".to_string()),
            ));
        }
        holding.quantity = quantity;
    }

    let cached = state
        .quotes
        .get_quote(&provider_symbol(&holding.symbol))
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(format!("Error fetching stock price: {}", e)),
            )
        })?;
    holding.current_price = cached.quote.price;
    holding.last_updated = Utc::now();

    state.store.replace(&holding).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(format!("Failed to update stock: {}", e)),
        )
    })?;

    Ok((StatusCode::OK, Json(holding)))
}

/// Remove a holding.
pub async fn delete_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<String>)> {
    let deleted = state.store.delete(&id).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(format!("Database error: {}", e)),
        )
    })?;

    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            Json("Stock not found".to_string()),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Stock removed" })),
    ))
}
