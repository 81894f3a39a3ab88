use std::fmt;
use thiserror::Error;

/// The quote store operation that was running when a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStep {
    WritePairs,
    SetTtl,
    UpdateTimestampIndex,
    ReadLatestTimestamp,
    ReadTimestampRange,
    ReadBucket,
    PurgeExpired,
}

impl fmt::Display for StoreStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            StoreStep::WritePairs => "write pairs",
            StoreStep::SetTtl => "set ttl",
            StoreStep::UpdateTimestampIndex => "update timestamp index",
            StoreStep::ReadLatestTimestamp => "read latest timestamp",
            StoreStep::ReadTimestampRange => "read timestamp range",
            StoreStep::ReadBucket => "read bucket",
            StoreStep::PurgeExpired => "purge expired buckets",
        };
        f.write_str(step)
    }
}

/// A storage backend failure, tagged with the step that failed and the
/// bucket key or range it was operating on.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to {step} ({target}): {message}")]
pub struct QuoteStoreError {
    pub step: StoreStep,
    pub target: String,
    pub message: String,
}

impl QuoteStoreError {
    pub fn new(step: StoreStep, target: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            step,
            target: target.into(),
            message: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_step_and_target() {
        let err = QuoteStoreError::new(
            StoreStep::SetTtl,
            "2025-01-01T00:00:00Z",
            "connection refused",
        );

        assert_eq!(
            err.to_string(),
            "Failed to set ttl (2025-01-01T00:00:00Z): connection refused"
        );
    }
}
