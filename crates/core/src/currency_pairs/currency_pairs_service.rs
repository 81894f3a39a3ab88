use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::currency_pairs_model::CurrencyPairBucket;
use super::currency_pairs_traits::CurrencyPairServiceTrait;
use super::quote_store::QuoteStore;
use crate::errors::Result;

/// Builds a pair symbol from two currency codes, e.g. `rub`, `usd` -> `RUBUSD`.
pub fn make_symbol(base_currency: &str, quote_currency: &str) -> String {
    format!("{}{}", base_currency.trim(), quote_currency.trim()).to_uppercase()
}

pub struct CurrencyPairService {
    store: QuoteStore,
}

impl CurrencyPairService {
    pub fn new(store: QuoteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CurrencyPairServiceTrait for CurrencyPairService {
    async fn fetch_currency_pair(
        &self,
        symbol: &str,
        desired_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<CurrencyPairBucket>> {
        self.store
            .retrieve_latest_currency_pair(symbol, desired_timestamp)
            .await
    }
}
