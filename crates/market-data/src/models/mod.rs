//! Market data models
//!
//! - `exchange_quote` - One `{symbol, price}` record of an exchange snapshot

mod exchange_quote;

pub use exchange_quote::ExchangeQuote;
