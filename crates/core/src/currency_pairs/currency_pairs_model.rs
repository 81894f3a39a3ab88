use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Textual form of a bucket timestamp. Doubles as the storage key.
pub const BUCKET_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One exchange rate, e.g. `RUBUSD` -> 0.011.
///
/// `conversion_rate` is `None` when the upstream record carried no usable price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CurrencyPair {
    pub symbol: String,
    pub conversion_rate: Option<f64>,
}

impl CurrencyPair {
    pub fn new(symbol: impl Into<String>, conversion_rate: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            conversion_rate,
        }
    }
}

/// All rates observed at one ingestion instant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CurrencyPairBucket {
    pub currency_pairs: Vec<CurrencyPair>,
    pub timestamp: DateTime<Utc>,
}

impl CurrencyPairBucket {
    /// Creates a bucket. The timestamp is truncated to whole seconds since
    /// buckets are keyed at second resolution.
    pub fn new(currency_pairs: Vec<CurrencyPair>, timestamp: DateTime<Utc>) -> Self {
        Self {
            currency_pairs,
            timestamp: timestamp.trunc_subsecs(0),
        }
    }

    /// Storage key of this bucket, e.g. `2025-01-01T00:00:00Z`.
    pub fn key(&self) -> String {
        format_bucket_key(self.timestamp)
    }

    /// Score of this bucket in the timestamp index (unix seconds).
    pub fn score(&self) -> i64 {
        self.timestamp.timestamp()
    }

    pub fn find(&self, symbol: &str) -> Option<&CurrencyPair> {
        self.currency_pairs.iter().find(|pair| pair.symbol == symbol)
    }
}

pub fn format_bucket_key(timestamp: DateTime<Utc>) -> String {
    timestamp.format(BUCKET_KEY_FORMAT).to_string()
}

/// Parses a bucket key back into a UTC timestamp.
pub fn parse_bucket_key(key: &str) -> Result<DateTime<Utc>> {
    Ok(NaiveDateTime::parse_from_str(key, BUCKET_KEY_FORMAT)?.and_utc())
}
