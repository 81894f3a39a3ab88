use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use super::conversion_errors::ConversionError;
use super::conversion_model::{Conversion, ConversionRequest};
use crate::currency_pairs::{make_symbol, CurrencyPairServiceTrait};
use crate::errors::Result;

/// Converts amounts using stored rates, refusing rates older than
/// `max_quote_age`.
pub struct ConversionService {
    currency_pair_service: Arc<dyn CurrencyPairServiceTrait>,
    max_quote_age: Duration,
}

impl ConversionService {
    pub fn new(
        currency_pair_service: Arc<dyn CurrencyPairServiceTrait>,
        max_quote_age: Duration,
    ) -> Self {
        Self {
            currency_pair_service,
            max_quote_age,
        }
    }

    pub async fn convert(&self, request: &ConversionRequest) -> Result<Conversion> {
        self.convert_at(request, Utc::now()).await
    }

    /// Same as [`convert`](Self::convert) with the rate age measured from `now`.
    pub async fn convert_at(
        &self,
        request: &ConversionRequest,
        now: DateTime<Utc>,
    ) -> Result<Conversion> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(ConversionError::InvalidAmount(request.amount).into());
        }

        let symbol = make_symbol(&request.base_currency, &request.quote_currency);
        let bucket = self
            .currency_pair_service
            .fetch_currency_pair(&symbol, request.desired_timestamp)
            .await?;

        let Some((conversion_rate, timestamp)) = bucket.and_then(|bucket| {
            let rate = bucket.find(&symbol)?.conversion_rate?;
            Some((rate, bucket.timestamp))
        }) else {
            return Err(ConversionError::QuotesNotFound(symbol).into());
        };

        let age_seconds = (now - timestamp).num_milliseconds() as f64 / 1000.0;
        if age_seconds > self.max_quote_age.as_secs_f64() {
            debug!("Rejecting {} quote from {}: {}s old", symbol, timestamp, age_seconds);
            return Err(ConversionError::QuotesOutdated {
                symbol,
                age_seconds,
                max_age_seconds: self.max_quote_age.as_secs(),
            }
            .into());
        }

        Ok(Conversion {
            converted_amount: request.amount * conversion_rate,
            conversion_rate,
            conversion_rate_age_seconds: age_seconds,
            actual_timestamp_closest_to_desired: timestamp,
        })
    }
}
