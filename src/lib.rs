// src/lib.rs
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod quotes;
pub mod valuation;
pub mod yahoo;

// Re-export commonly used items
pub use config::Config;
pub use db::HoldingsStore;
pub use models::*;

use std::sync::Arc;

use quotes::QuoteCache;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: HoldingsStore,
    pub quotes: Arc<QuoteCache>,
}
