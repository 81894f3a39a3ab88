use chrono::{DateTime, NaiveTime, Utc};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::currency_pairs_errors::{QuoteStoreError, StoreStep};
use super::currency_pairs_model::{format_bucket_key, parse_bucket_key, CurrencyPairBucket};
use super::currency_pairs_traits::CurrencyPairRepositoryTrait;
use crate::errors::{Error, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Time-bucketed store of currency pair snapshots.
///
/// Owns the bucket lifecycle and nearest-timestamp resolution. The backend
/// only provides raw primitives, see [`CurrencyPairRepositoryTrait`].
#[derive(Clone)]
pub struct QuoteStore {
    repository: Arc<dyn CurrencyPairRepositoryTrait>,
    ttl: Duration,
}

impl QuoteStore {
    pub fn new(repository: Arc<dyn CurrencyPairRepositoryTrait>, ttl: Duration) -> Self {
        Self { repository, ttl }
    }

    /// Persists a bucket: pairs, then TTL, then the index entry.
    ///
    /// The three writes are not atomic. A failure stops the remaining steps
    /// and is reported with the step that failed.
    pub async fn create_bucket(&self, bucket: &CurrencyPairBucket) -> Result<()> {
        let key = bucket.key();

        self.repository
            .write_currency_pairs(&key, &bucket.currency_pairs)
            .await
            .map_err(|e| QuoteStoreError::new(StoreStep::WritePairs, &key, e))?;

        self.repository
            .set_ttl(&key, self.ttl)
            .await
            .map_err(|e| QuoteStoreError::new(StoreStep::SetTtl, &key, e))?;

        self.repository
            .add_to_timestamp_index(&key, bucket.score())
            .await
            .map_err(|e| QuoteStoreError::new(StoreStep::UpdateTimestampIndex, &key, e))?;

        debug!(
            "Stored bucket {} with {} currency pairs",
            key,
            bucket.currency_pairs.len()
        );
        Ok(())
    }

    /// Looks up `symbol` in the bucket nearest to `desired_timestamp`.
    ///
    /// Returns a bucket containing only the matching pair, stamped with the
    /// resolved bucket timestamp, or `None` when there is no bucket for that
    /// day or the bucket has no such symbol.
    pub async fn retrieve_latest_currency_pair(
        &self,
        symbol: &str,
        desired_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<CurrencyPairBucket>> {
        let Some(timestamp) = self.resolve_timestamp(desired_timestamp).await? else {
            debug!("No bucket timestamp resolved for {:?}", desired_timestamp);
            return Ok(None);
        };

        let bucket = self.retrieve_currency_pair_bucket(timestamp).await?;
        let Some(pair) = bucket
            .currency_pairs
            .into_iter()
            .find(|pair| pair.symbol == symbol)
        else {
            debug!("Symbol {} not found in bucket {}", symbol, format_bucket_key(timestamp));
            return Ok(None);
        };

        Ok(Some(CurrencyPairBucket::new(vec![pair], timestamp)))
    }

    /// Latest bucket timestamp when `desired_timestamp` is `None`, otherwise
    /// the closest one within the same UTC day.
    pub async fn resolve_timestamp(
        &self,
        desired_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>> {
        match desired_timestamp {
            None => self.retrieve_latest_timestamp().await,
            Some(desired) => self.retrieve_timestamp_closest_to_desired(desired).await,
        }
    }

    pub async fn retrieve_latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let step = StoreStep::ReadLatestTimestamp;
        let key = self
            .repository
            .latest_timestamp()
            .await
            .map_err(|e| QuoteStoreError::new(step, "timestamp index", e))?;

        match key {
            Some(key) => {
                let timestamp =
                    parse_bucket_key(&key).map_err(|e| QuoteStoreError::new(step, &key, e))?;
                Ok(Some(timestamp))
            }
            None => Ok(None),
        }
    }

    pub async fn retrieve_timestamp_closest_to_desired(
        &self,
        desired: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let step = StoreStep::ReadTimestampRange;
        let (start, end) = day_window(desired);
        let target = format!("[{}, {}]", start, end);

        let keys = self
            .repository
            .timestamps_in_range(start, end)
            .await
            .map_err(|e| QuoteStoreError::new(step, &target, e))?;

        let candidates = keys
            .iter()
            .map(|key| parse_bucket_key(key).map_err(|e| Error::from(QuoteStoreError::new(step, key, e))))
            .collect::<Result<Vec<_>>>()?;

        Ok(closest_timestamp(&candidates, desired))
    }

    /// Reads the whole bucket stored at `timestamp`. Expired or missing
    /// buckets come back empty.
    pub async fn retrieve_currency_pair_bucket(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<CurrencyPairBucket> {
        let key = format_bucket_key(timestamp);
        let currency_pairs = self
            .repository
            .read_currency_pairs(&key)
            .await
            .map_err(|e| QuoteStoreError::new(StoreStep::ReadBucket, &key, e))?;

        if currency_pairs.is_empty() {
            warn!("Bucket {} is indexed but holds no currency pairs", key);
        }

        Ok(CurrencyPairBucket::new(currency_pairs, timestamp))
    }

    /// Removes expired buckets from the backend.
    pub async fn purge_expired(&self) -> Result<usize> {
        let purged = self
            .repository
            .purge_expired()
            .await
            .map_err(|e| QuoteStoreError::new(StoreStep::PurgeExpired, "expired buckets", e))?;
        Ok(purged)
    }
}

/// Unix-second bounds `[00:00:00, 23:59:59]` of the UTC day containing `at`.
pub fn day_window(at: DateTime<Utc>) -> (i64, i64) {
    let start = at.date_naive().and_time(NaiveTime::MIN).and_utc().timestamp();
    (start, start + SECONDS_PER_DAY - 1)
}

/// The candidate with the smallest absolute distance to `desired`. On a tie
/// the earliest candidate in slice order wins.
pub fn closest_timestamp(
    candidates: &[DateTime<Utc>],
    desired: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    candidates
        .iter()
        .min_by_key(|ts| (ts.timestamp() - desired.timestamp()).abs())
        .copied()
}
