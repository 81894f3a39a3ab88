//! Currency pairs module - time-bucketed quote store, bucket builder and lookups.

mod bucket_builder;
mod currency_pairs_errors;
mod currency_pairs_model;
mod currency_pairs_service;
mod currency_pairs_traits;
mod memory_repository;
mod quote_store;

pub use bucket_builder::{build_currency_pair_bucket, create_currency_pair_bucket_from_quotes};
pub use currency_pairs_errors::{QuoteStoreError, StoreStep};
pub use currency_pairs_model::{
    format_bucket_key, parse_bucket_key, CurrencyPair, CurrencyPairBucket, BUCKET_KEY_FORMAT,
};
pub use currency_pairs_service::{make_symbol, CurrencyPairService};
pub use currency_pairs_traits::{CurrencyPairRepositoryTrait, CurrencyPairServiceTrait};
pub use memory_repository::InMemoryCurrencyPairRepository;
pub use quote_store::{closest_timestamp, day_window, QuoteStore};
