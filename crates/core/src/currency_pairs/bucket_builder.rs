use chrono::{DateTime, Utc};
use ratekeeper_market_data::ExchangeQuote;

use super::currency_pairs_model::{CurrencyPair, CurrencyPairBucket};

/// Turns an exchange snapshot into a bucket stamped with the current time.
pub fn create_currency_pair_bucket_from_quotes(quotes: Vec<ExchangeQuote>) -> CurrencyPairBucket {
    build_currency_pair_bucket(quotes, Utc::now())
}

/// Turns an exchange snapshot into a bucket stamped with `now`.
///
/// Records are kept in order and are not validated; a record without a
/// usable price yields a pair with no conversion rate.
pub fn build_currency_pair_bucket(
    quotes: Vec<ExchangeQuote>,
    now: DateTime<Utc>,
) -> CurrencyPairBucket {
    let currency_pairs = quotes
        .into_iter()
        .map(|quote| CurrencyPair::new(quote.symbol, quote.price))
        .collect();

    CurrencyPairBucket::new(currency_pairs, now)
}
