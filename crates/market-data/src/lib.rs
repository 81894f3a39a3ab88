//! Ratekeeper Market Data Crate
//!
//! This crate fetches full exchange-rate snapshots from the upstream
//! exchange. It knows nothing about storage: it turns an HTTP response into a
//! list of [`ExchangeQuote`] records, or a [`MarketDataError`].
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Ingestion loop  | --> |  QuoteProvider   |  (trait, injected)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | ExchangeProvider |  (reqwest, GET <url>)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  ExchangeQuote   |  ({symbol, price})
//!                          +------------------+
//! ```

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::ExchangeQuote;
pub use provider::exchange::ExchangeProvider;
pub use provider::QuoteProvider;
