use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::currency_pairs_model::{CurrencyPair, CurrencyPairBucket};
use crate::errors::Result;

/// Storage primitives a quote store backend must provide.
///
/// A backend keeps three things: pairs grouped under a bucket key, an expiry
/// per bucket key, and an index of bucket keys ordered by score (unix
/// seconds, then key). Expired buckets read as empty. Their index entries
/// may outlive them.
#[async_trait]
pub trait CurrencyPairRepositoryTrait: Send + Sync {
    /// Writes every pair under `key`. Symbols already stored under `key` are
    /// overwritten, others are kept.
    async fn write_currency_pairs(&self, key: &str, currency_pairs: &[CurrencyPair]) -> Result<()>;

    /// Sets `key` to expire `ttl` from now. No-op when `key` holds nothing.
    async fn set_ttl(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Inserts `key` into the timestamp index, replacing its score if present.
    async fn add_to_timestamp_index(&self, key: &str, score: i64) -> Result<()>;

    /// Reads every live pair stored under `key`.
    async fn read_currency_pairs(&self, key: &str) -> Result<Vec<CurrencyPair>>;

    /// Key of the highest-scored index entry.
    async fn latest_timestamp(&self) -> Result<Option<String>>;

    /// Keys of index entries with `start <= score <= end`, ascending.
    async fn timestamps_in_range(&self, start: i64, end: i64) -> Result<Vec<String>>;

    /// Physically removes expired buckets and returns how many went away.
    /// Backends with native expiry need not implement this.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}

/// Nearest-timestamp lookups of a single pair.
#[async_trait]
pub trait CurrencyPairServiceTrait: Send + Sync {
    /// Returns a bucket holding only `symbol`, taken from the stored bucket
    /// closest to `desired_timestamp` within the same UTC day, or from the
    /// latest bucket when no timestamp is given. `None` when nothing matches.
    async fn fetch_currency_pair(
        &self,
        symbol: &str,
        desired_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<CurrencyPairBucket>>;
}
