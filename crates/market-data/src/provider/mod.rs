//! Quote provider abstraction and the HTTP exchange implementation.
//!
//! The ingestion loop only sees the `QuoteProvider` trait, so tests can swap
//! in a fake source and the exchange can be replaced without touching the
//! core crate.

mod traits;

pub mod exchange;

// Re-exports
pub use traits::QuoteProvider;
