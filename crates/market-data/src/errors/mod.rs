//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while fetching a snapshot from the exchange.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request never produced a response (DNS, connect, timeout...).
    #[error("Request to {url} failed: {message}")]
    BadRequest {
        /// The URL that was requested
        url: String,
        /// The transport error message
        message: String,
    },

    /// The exchange answered with a non-2xx status.
    #[error("Exchange at {url} responded with status {status}")]
    BadResponse {
        /// The URL that was requested
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// The body was not a JSON array of quotes.
    #[error("Failed to decode exchange payload: {0}")]
    Decode(String),
}

impl MarketDataError {
    /// HTTP status of the upstream response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadResponse { status, .. } => Some(*status),
            Self::BadRequest { .. } | Self::Decode(_) => None,
        }
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::Decode(err.to_string())
    }
}
