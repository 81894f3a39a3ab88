use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use ratekeeper_core::currency_pairs::{CurrencyPair, CurrencyPairRepositoryTrait};
use ratekeeper_core::errors::ValidationError;
use ratekeeper_core::Result;

use super::model::{BucketExpirationDB, BucketTimestampDB, CurrencyPairDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{bucket_expirations, bucket_timestamps, currency_pairs};

/// Quote store primitives on SQLite.
///
/// Reads go through the pool, writes through the single writer. Expired
/// buckets are filtered out on read and physically removed by
/// [`purge_expired`](CurrencyPairRepositoryTrait::purge_expired).
#[derive(Clone)]
pub struct CurrencyPairRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CurrencyPairRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn is_expired(conn: &mut SqliteConnection, key: &str, now: i64) -> QueryResult<bool> {
    let expires_at = bucket_expirations::table
        .find(key)
        .select(bucket_expirations::expires_at)
        .first::<i64>(conn)
        .optional()?;
    Ok(expires_at.is_some_and(|at| at <= now))
}

fn delete_buckets(conn: &mut SqliteConnection, keys: &[String]) -> QueryResult<()> {
    diesel::delete(currency_pairs::table.filter(currency_pairs::bucket_key.eq_any(keys)))
        .execute(conn)?;
    diesel::delete(bucket_expirations::table.filter(bucket_expirations::bucket_key.eq_any(keys)))
        .execute(conn)?;
    Ok(())
}

#[async_trait]
impl CurrencyPairRepositoryTrait for CurrencyPairRepository {
    async fn write_currency_pairs(&self, key: &str, pairs: &[CurrencyPair]) -> Result<()> {
        let key = key.to_string();
        let pairs = pairs.to_vec();
        let now = now_millis();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                // An expired bucket is gone; writing starts a fresh one without TTL.
                if is_expired(conn, &key, now).into_core()? {
                    delete_buckets(conn, std::slice::from_ref(&key)).into_core()?;
                }

                let last_position = currency_pairs::table
                    .filter(currency_pairs::bucket_key.eq(&key))
                    .select(max(currency_pairs::position))
                    .first::<Option<i32>>(conn)
                    .into_core()?;
                let mut next_position = last_position.map_or(0, |p| p + 1);

                for pair in &pairs {
                    let row = CurrencyPairDB::new(&key, pair, next_position);
                    diesel::insert_into(currency_pairs::table)
                        .values(&row)
                        .on_conflict((currency_pairs::bucket_key, currency_pairs::symbol))
                        .do_update()
                        .set(currency_pairs::conversion_rate.eq(row.conversion_rate))
                        .execute(conn)
                        .into_core()?;
                    next_position += 1;
                }
                Ok(())
            })
            .await
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> Result<()> {
        let ttl_millis = i64::try_from(ttl.as_millis())
            .map_err(|_| ValidationError::InvalidInput(format!("TTL out of range: {:?}", ttl)))?;
        let key = key.to_string();
        let now = now_millis();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                if is_expired(conn, &key, now).into_core()? {
                    return Ok(());
                }
                // Empty snapshots have no pair rows but still get an index
                // entry, so the expiration row is written regardless.

                let row = BucketExpirationDB {
                    bucket_key: key,
                    expires_at: now.saturating_add(ttl_millis),
                };
                diesel::insert_into(bucket_expirations::table)
                    .values(&row)
                    .on_conflict(bucket_expirations::bucket_key)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn add_to_timestamp_index(&self, key: &str, score: i64) -> Result<()> {
        let row = BucketTimestampDB {
            bucket_key: key.to_string(),
            score,
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(bucket_timestamps::table)
                    .values(&row)
                    .on_conflict(bucket_timestamps::bucket_key)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn read_currency_pairs(&self, key: &str) -> Result<Vec<CurrencyPair>> {
        let mut conn = get_connection(&self.pool)?;
        if is_expired(&mut conn, key, now_millis()).into_core()? {
            return Ok(Vec::new());
        }

        let rows = currency_pairs::table
            .filter(currency_pairs::bucket_key.eq(key))
            .order(currency_pairs::position.asc())
            .select(CurrencyPairDB::as_select())
            .load::<CurrencyPairDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(CurrencyPair::from).collect())
    }

    async fn latest_timestamp(&self) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        bucket_timestamps::table
            .order((bucket_timestamps::score.desc(), bucket_timestamps::bucket_key.desc()))
            .select(bucket_timestamps::bucket_key)
            .first::<String>(&mut conn)
            .optional()
            .into_core()
    }

    async fn timestamps_in_range(&self, start: i64, end: i64) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        bucket_timestamps::table
            .filter(bucket_timestamps::score.between(start, end))
            .order((bucket_timestamps::score.asc(), bucket_timestamps::bucket_key.asc()))
            .select(bucket_timestamps::bucket_key)
            .load::<String>(&mut conn)
            .into_core()
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = now_millis();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let expired = bucket_expirations::table
                    .filter(bucket_expirations::expires_at.le(now))
                    .select(bucket_expirations::bucket_key)
                    .load::<String>(conn)
                    .into_core()?;
                if expired.is_empty() {
                    return Ok(0);
                }

                delete_buckets(conn, &expired).into_core()?;
                diesel::delete(
                    bucket_timestamps::table.filter(bucket_timestamps::bucket_key.eq_any(&expired)),
                )
                .execute(conn)
                .into_core()?;

                debug!("Purged {} expired buckets", expired.len());
                Ok(expired.len())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use chrono::{DateTime, TimeZone};
    use ratekeeper_core::currency_pairs::{CurrencyPairBucket, QuoteStore};
    use tempfile::tempdir;

    const DAY: Duration = Duration::from_secs(86_400);

    /// Returns the repository and the temp dir that keeps the database alive.
    async fn create_test_repository() -> (CurrencyPairRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("db").join("quotes.db");
        let db_path = init(&db_path.to_string_lossy()).expect("Failed to init database");

        let pool = create_pool(&db_path).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        (CurrencyPairRepository::new(pool, writer), temp_dir)
    }

    fn ts(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, hour, 0, 0).unwrap()
    }

    fn rub_usd(rate: f64) -> Vec<CurrencyPair> {
        vec![CurrencyPair::new("RUBUSD", Some(rate))]
    }

    #[tokio::test]
    async fn test_write_upserts_and_keeps_first_write_order() {
        let (repo, _temp_dir) = create_test_repository().await;
        let key = "2025-01-01T00:00:00Z";

        repo.write_currency_pairs(
            key,
            &[
                CurrencyPair::new("USDRUB", Some(90.0)),
                CurrencyPair::new("RUBUSD", None),
            ],
        )
        .await
        .unwrap();
        repo.write_currency_pairs(
            key,
            &[
                CurrencyPair::new("RUBUSD", Some(0.011)),
                CurrencyPair::new("AAABBB", Some(1.0)),
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            repo.read_currency_pairs(key).await.unwrap(),
            vec![
                CurrencyPair::new("USDRUB", Some(90.0)),
                CurrencyPair::new("RUBUSD", Some(0.011)),
                CurrencyPair::new("AAABBB", Some(1.0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_index_range_and_latest() {
        let (repo, _temp_dir) = create_test_repository().await;
        for (key, score) in [("c", 30), ("a", 10), ("b", 20), ("d", 40)] {
            repo.add_to_timestamp_index(key, score).await.unwrap();
        }
        repo.add_to_timestamp_index("a", 35).await.unwrap();

        assert_eq!(repo.timestamps_in_range(10, 35).await.unwrap(), vec!["b", "c", "a"]);
        assert!(repo.timestamps_in_range(41, 100).await.unwrap().is_empty());
        assert_eq!(repo.latest_timestamp().await.unwrap().as_deref(), Some("d"));
    }

    #[tokio::test]
    async fn test_empty_database_reads_nothing() {
        let (repo, _temp_dir) = create_test_repository().await;

        assert_eq!(repo.latest_timestamp().await.unwrap(), None);
        assert!(repo.read_currency_pairs("2025-01-01T00:00:00Z").await.unwrap().is_empty());
        assert_eq!(repo.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_bucket_is_hidden_then_purged() {
        let (repo, _temp_dir) = create_test_repository().await;
        let store = QuoteStore::new(Arc::new(repo.clone()), Duration::ZERO);
        store
            .create_bucket(&CurrencyPairBucket::new(rub_usd(1.0), ts(3, 1, 8)))
            .await
            .unwrap();

        assert!(repo.read_currency_pairs("2025-03-01T08:00:00Z").await.unwrap().is_empty());
        assert!(store
            .retrieve_latest_currency_pair("RUBUSD", None)
            .await
            .unwrap()
            .is_none());

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(repo.latest_timestamp().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_bucket_is_purged_with_its_index_entry() {
        let (repo, _temp_dir) = create_test_repository().await;
        let store = QuoteStore::new(Arc::new(repo.clone()), Duration::ZERO);
        store
            .create_bucket(&CurrencyPairBucket::new(vec![], ts(3, 1, 8)))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(repo.latest_timestamp().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_latest_bucket_ignores_insertion_order() {
        let (repo, _temp_dir) = create_test_repository().await;
        let store = QuoteStore::new(Arc::new(repo), DAY);
        for (month, rate) in [(5, 500.0), (1, 100.0), (3, 300.0)] {
            store
                .create_bucket(&CurrencyPairBucket::new(rub_usd(rate), ts(month, 1, 0)))
                .await
                .unwrap();
        }

        let latest = store
            .retrieve_latest_currency_pair("RUBUSD", None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(latest.timestamp, ts(5, 1, 0));
        assert_eq!(latest.currency_pairs, rub_usd(500.0));
    }

    #[tokio::test]
    async fn test_rewrite_after_expiry_starts_fresh_bucket() {
        let (repo, _temp_dir) = create_test_repository().await;
        let key = "2025-03-01T08:00:00Z";
        repo.write_currency_pairs(key, &[CurrencyPair::new("USDRUB", Some(90.0))])
            .await
            .unwrap();
        repo.set_ttl(key, Duration::ZERO).await.unwrap();

        repo.write_currency_pairs(key, &rub_usd(2.0)).await.unwrap();

        assert_eq!(repo.read_currency_pairs(key).await.unwrap(), rub_usd(2.0));
    }

    #[tokio::test]
    async fn test_quote_store_over_sqlite_monthly_buckets() {
        let (repo, _temp_dir) = create_test_repository().await;
        let store = QuoteStore::new(Arc::new(repo), DAY);
        for (month, rate) in (1..=5).zip([100.0, 200.0, 300.0, 400.0, 500.0]) {
            store
                .create_bucket(&CurrencyPairBucket::new(rub_usd(rate), ts(month, 1, 0)))
                .await
                .unwrap();
        }

        let desired = Utc.with_ymd_and_hms(2025, 3, 1, 12, 12, 12).unwrap();
        let bucket = store
            .retrieve_latest_currency_pair("RUBUSD", Some(desired))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bucket.timestamp, ts(3, 1, 0));
        assert_eq!(bucket.currency_pairs, rub_usd(300.0));

        let latest = store
            .retrieve_latest_currency_pair("RUBUSD", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.currency_pairs, rub_usd(500.0));

        assert!(store
            .retrieve_latest_currency_pair("RUBUSD", Some(ts(3, 2, 0)))
            .await
            .unwrap()
            .is_none());
    }
}
