//! Database models for currency pair buckets.

use diesel::prelude::*;
use ratekeeper_core::currency_pairs::CurrencyPair;
use serde::{Deserialize, Serialize};

/// One pair stored under a bucket key. `position` keeps the order pairs were
/// first written in.
#[derive(Queryable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::currency_pairs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CurrencyPairDB {
    pub bucket_key: String,
    pub symbol: String,
    pub conversion_rate: Option<f64>,
    pub position: i32,
}

/// Expiry of a bucket, in unix milliseconds.
#[derive(Queryable, Insertable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::bucket_expirations)]
#[diesel(primary_key(bucket_key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BucketExpirationDB {
    pub bucket_key: String,
    pub expires_at: i64,
}

/// Timestamp index entry, scored in unix seconds.
#[derive(Queryable, Insertable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::bucket_timestamps)]
#[diesel(primary_key(bucket_key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BucketTimestampDB {
    pub bucket_key: String,
    pub score: i64,
}

impl CurrencyPairDB {
    pub fn new(bucket_key: &str, pair: &CurrencyPair, position: i32) -> Self {
        Self {
            bucket_key: bucket_key.to_string(),
            symbol: pair.symbol.clone(),
            conversion_rate: pair.conversion_rate,
            position,
        }
    }
}

impl From<CurrencyPairDB> for CurrencyPair {
    fn from(db: CurrencyPairDB) -> Self {
        CurrencyPair::new(db.symbol, db.conversion_rate)
    }
}
