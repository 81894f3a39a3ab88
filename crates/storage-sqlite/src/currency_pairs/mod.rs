//! SQLite storage implementation for the quote store primitives.

mod model;
mod repository;

pub use model::{BucketExpirationDB, BucketTimestampDB, CurrencyPairDB};
pub use repository::CurrencyPairRepository;
