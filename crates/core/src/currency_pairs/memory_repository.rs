//! In-memory quote store backend.
//!
//! Buckets live in a `HashMap` keyed by bucket key; the timestamp index is a
//! `BTreeSet` ordered by `(score, key)` so range and max queries are cheap.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use super::currency_pairs_model::CurrencyPair;
use super::currency_pairs_traits::CurrencyPairRepositoryTrait;
use crate::errors::{DatabaseError, Error, Result, ValidationError};

#[derive(Debug, Default)]
struct StoredBucket {
    currency_pairs: Vec<CurrencyPair>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredBucket {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
struct TimestampIndex {
    entries: BTreeSet<(i64, String)>,
    scores: HashMap<String, i64>,
}

/// Process-local backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryCurrencyPairRepository {
    buckets: RwLock<HashMap<String, StoredBucket>>,
    index: RwLock<TimestampIndex>,
}

impl InMemoryCurrencyPairRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error<T>(_: PoisonError<T>) -> Error {
    DatabaseError::Internal("in-memory store lock poisoned".to_string()).into()
}

#[async_trait]
impl CurrencyPairRepositoryTrait for InMemoryCurrencyPairRepository {
    async fn write_currency_pairs(&self, key: &str, currency_pairs: &[CurrencyPair]) -> Result<()> {
        let now = Utc::now();
        let mut buckets = self.buckets.write().map_err(lock_error)?;

        let bucket = buckets.entry(key.to_string()).or_default();
        if bucket.is_expired(now) {
            *bucket = StoredBucket::default();
        }

        for pair in currency_pairs {
            match bucket
                .currency_pairs
                .iter_mut()
                .find(|stored| stored.symbol == pair.symbol)
            {
                Some(stored) => stored.conversion_rate = pair.conversion_rate,
                None => bucket.currency_pairs.push(pair.clone()),
            }
        }
        Ok(())
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> Result<()> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| ValidationError::InvalidInput(format!("TTL out of range: {}", e)))?;
        let now = Utc::now();
        let mut buckets = self.buckets.write().map_err(lock_error)?;

        if let Some(bucket) = buckets.get_mut(key) {
            if !bucket.is_expired(now) {
                bucket.expires_at = Some(now + ttl);
            }
        }
        Ok(())
    }

    async fn add_to_timestamp_index(&self, key: &str, score: i64) -> Result<()> {
        let mut index = self.index.write().map_err(lock_error)?;

        if let Some(previous) = index.scores.insert(key.to_string(), score) {
            index.entries.remove(&(previous, key.to_string()));
        }
        index.entries.insert((score, key.to_string()));
        Ok(())
    }

    async fn read_currency_pairs(&self, key: &str) -> Result<Vec<CurrencyPair>> {
        let now = Utc::now();
        let buckets = self.buckets.read().map_err(lock_error)?;

        Ok(buckets
            .get(key)
            .filter(|bucket| !bucket.is_expired(now))
            .map(|bucket| bucket.currency_pairs.clone())
            .unwrap_or_default())
    }

    async fn latest_timestamp(&self) -> Result<Option<String>> {
        let index = self.index.read().map_err(lock_error)?;
        Ok(index.entries.last().map(|(_, key)| key.clone()))
    }

    async fn timestamps_in_range(&self, start: i64, end: i64) -> Result<Vec<String>> {
        if start > end {
            return Ok(Vec::new());
        }
        let index = self.index.read().map_err(lock_error)?;

        Ok(index
            .entries
            .range((start, String::new())..)
            .take_while(|(score, _)| *score <= end)
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let expired: Vec<String> = {
            let mut buckets = self.buckets.write().map_err(lock_error)?;
            let expired = buckets
                .iter()
                .filter(|(_, bucket)| bucket.is_expired(now))
                .map(|(key, _)| key.clone())
                .collect::<Vec<_>>();
            for key in &expired {
                buckets.remove(key);
            }
            expired
        };

        let mut index = self.index.write().map_err(lock_error)?;
        for key in &expired {
            if let Some(score) = index.scores.remove(key) {
                index.entries.remove(&(score, key.clone()));
            }
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    fn pair(symbol: &str, rate: f64) -> CurrencyPair {
        CurrencyPair::new(symbol, Some(rate))
    }

    #[tokio::test]
    async fn test_write_overwrites_only_matching_symbols() {
        let repo = InMemoryCurrencyPairRepository::new();
        let key = "2025-01-01T00:00:00Z";

        repo.write_currency_pairs(key, &[pair("RUBUSD", 1.0), pair("USDRUB", 90.0)])
            .await
            .unwrap();
        repo.write_currency_pairs(key, &[pair("RUBUSD", 2.0)]).await.unwrap();

        let pairs = repo.read_currency_pairs(key).await.unwrap();
        assert_eq!(pairs, vec![pair("RUBUSD", 2.0), pair("USDRUB", 90.0)]);
    }

    #[tokio::test]
    async fn test_missing_key_reads_empty() {
        let repo = InMemoryCurrencyPairRepository::new();
        assert!(repo.read_currency_pairs("2025-01-01T00:00:00Z").await.unwrap().is_empty());
        assert_eq!(repo.latest_timestamp().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_index_range_is_inclusive_and_ordered() {
        let repo = InMemoryCurrencyPairRepository::new();
        for (key, score) in [("c", 30), ("a", 10), ("b", 20), ("d", 40)] {
            repo.add_to_timestamp_index(key, score).await.unwrap();
        }

        assert_eq!(repo.timestamps_in_range(10, 30).await.unwrap(), vec!["a", "b", "c"]);
        assert!(repo.timestamps_in_range(31, 39).await.unwrap().is_empty());
        assert_eq!(repo.latest_timestamp().await.unwrap().as_deref(), Some("d"));
    }

    #[tokio::test]
    async fn test_readding_key_replaces_score() {
        let repo = InMemoryCurrencyPairRepository::new();
        repo.add_to_timestamp_index("a", 10).await.unwrap();
        repo.add_to_timestamp_index("a", 50).await.unwrap();

        assert!(repo.timestamps_in_range(0, 20).await.unwrap().is_empty());
        assert_eq!(repo.timestamps_in_range(0, 100).await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately_and_purges() {
        let repo = InMemoryCurrencyPairRepository::new();
        repo.write_currency_pairs("old", &[pair("RUBUSD", 1.0)]).await.unwrap();
        repo.set_ttl("old", Duration::ZERO).await.unwrap();
        repo.add_to_timestamp_index("old", 10).await.unwrap();
        repo.write_currency_pairs("new", &[pair("RUBUSD", 2.0)]).await.unwrap();
        repo.set_ttl("new", DAY).await.unwrap();
        repo.add_to_timestamp_index("new", 20).await.unwrap();

        assert!(repo.read_currency_pairs("old").await.unwrap().is_empty());
        assert_eq!(repo.purge_expired().await.unwrap(), 1);
        assert_eq!(repo.read_currency_pairs("new").await.unwrap(), vec![pair("RUBUSD", 2.0)]);
        assert_eq!(repo.timestamps_in_range(0, 100).await.unwrap(), vec!["new"]);
    }
}
