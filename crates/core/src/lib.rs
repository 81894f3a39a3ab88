//! Ratekeeper Core - Domain entities, services, and traits.
//!
//! This crate contains the quote store orchestration, the ingestion loop and
//! the lookup/conversion services. It is database-agnostic and defines the
//! storage primitives that are implemented by the `storage-sqlite` crate
//! (and by the in-memory repository shipped here).

pub mod conversion;
pub mod currency_pairs;
pub mod errors;
pub mod ingestion;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
