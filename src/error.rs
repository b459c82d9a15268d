use thiserror::Error;

/// Errors raised while fetching or serving quotes.
///
/// The provider reports `MissingPrice`, `Status` and `Transport`; the cache
/// treats all three as a failed refresh and surfaces `Unavailable` to its
/// callers once the stale fallback is exhausted.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Upstream fetch failed and no usable cached value exists.
    #[error("quote unavailable for {symbol}")]
    Unavailable { symbol: String },

    /// The provider answered but the payload carried no usable price.
    #[error("no price data in provider response for {symbol}")]
    MissingPrice { symbol: String },

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status} for {symbol}")]
    Status {
        symbol: String,
        status: reqwest::StatusCode,
    },

    /// The request never produced a response (connect error, timeout).
    #[error("request to quote provider failed: {0}")]
    Transport(#[from] reqwest::Error),
}
