use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Amount must be a finite number greater than zero, got {0}")]
    InvalidAmount(f64),

    #[error("No quotes found for {0}")]
    QuotesNotFound(String),

    #[error("Quotes for {symbol} are {age_seconds:.0}s old (max {max_age_seconds}s)")]
    QuotesOutdated {
        symbol: String,
        age_seconds: f64,
        max_age_seconds: u64,
    },
}
