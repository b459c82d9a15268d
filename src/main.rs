use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::{
    routing::{get, put},
    Router,
};
use reqwest::Method;
use tower_http::cors::CorsLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use stockfolio_backend::handlers::{
    market::get_market_quote,
    portfolio::get_portfolio_metrics,
    stocks::{create_stock, delete_stock, list_stocks, update_stock},
};
use stockfolio_backend::quotes::QuoteCache;
use stockfolio_backend::yahoo::YahooProvider;
use stockfolio_backend::{AppState, Config, HoldingsStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set the log level based on the first argument
    let args: Vec<String> = std::env::args().collect();
    let mut log_level = Level::INFO;
    if args.len() >= 2 {
        log_level = match args[1].as_str() {
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_max_level(log_level)
        .init();

    tracing::info!("Log level set to: {}", log_level);

    // Initalize dotenv so we can read .env file
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // Holdings live in MongoDB; quotes go through the process-wide cache
    let store = HoldingsStore::connect(&config.mongodb_uri).await?;
    let quotes = Arc::new(QuoteCache::new(Arc::new(YahooProvider::new())));
    let state = AppState { store, quotes };

    // Initialize CORS layer for the browser client
    let cors = CorsLayer::new()
        .allow_origin(config.client_url.parse::<HeaderValue>()?)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(vec![CONTENT_TYPE]);

    // Build application with routes
    let app = Router::new()
        // Holdings CRUD
        .route("/api/stocks", get(list_stocks).post(create_stock))
        .route("/api/stocks/:id", put(update_stock).delete(delete_stock))
        // Valuation
        .route("/api/portfolio/metrics", get(get_portfolio_metrics))
        // Market indices
        .route("/api/market/quote/:symbol", get(get_market_quote))
        // Shared app state
        .with_state(state)
        // CORS and tracing layers
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        );

    // Run server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;

    tracing::info!("Listening on: {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
