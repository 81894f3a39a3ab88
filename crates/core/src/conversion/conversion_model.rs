use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConversionRequest {
    pub amount: f64,
    pub base_currency: String,
    pub quote_currency: String,
    pub desired_timestamp: Option<DateTime<Utc>>,
}

/// Result of converting an amount with the rate closest to the desired time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Conversion {
    pub converted_amount: f64,
    pub conversion_rate: f64,
    /// Seconds between the rate's bucket timestamp and now.
    pub conversion_rate_age_seconds: f64,
    pub actual_timestamp_closest_to_desired: DateTime<Utc>,
}
