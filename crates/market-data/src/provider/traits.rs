//! Quote provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::ExchangeQuote;

/// Source of full exchange-rate snapshots.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use ratekeeper_market_data::{ExchangeQuote, MarketDataError, QuoteProvider};
///
/// struct FixedProvider;
///
/// #[async_trait]
/// impl QuoteProvider for FixedProvider {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     fn source_url(&self) -> &str {
///         "memory://fixed"
///     }
///
///     async fn fetch_quotes(&self) -> Result<Vec<ExchangeQuote>, MarketDataError> {
///         Ok(vec![ExchangeQuote::new("RUBUSD", Some(0.011))])
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// Where the snapshot comes from, used in logs.
    fn source_url(&self) -> &str;

    /// Fetch the complete current snapshot.
    ///
    /// Returns every record the exchange reported, in the order it reported
    /// them, or a `MarketDataError` when the exchange could not be reached or
    /// answered with a non-2xx status.
    async fn fetch_quotes(&self) -> Result<Vec<ExchangeQuote>, MarketDataError>;
}
