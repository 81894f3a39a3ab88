//! Ingestion module - periodic exchange snapshots into the quote store.

mod ingestion_service;

pub use ingestion_service::{CycleOutcome, IngestionService};
