use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult, QUOTES_NOT_FOUND_MESSAGE},
    main_lib::AppState,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use ratekeeper_core::{
    conversion::ConversionRequest,
    currency_pairs::{format_bucket_key, make_symbol},
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct CurrencyPairQuery {
    base_currency: String,
    quote_currency: String,
    desired_timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct CurrencyPairResponse {
    conversion_rate: Option<f64>,
    actual_timestamp_closest_to_desired: String,
}

#[derive(Deserialize)]
struct ConvertQuery {
    amount: f64,
    from: String,
    to: String,
    desired_timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ConvertResponse {
    converted_amount: f64,
    conversion_rate: f64,
    conversion_rate_age_seconds: f64,
    actual_timestamp_closest_to_desired: String,
}

fn unprocessable(rejection: QueryRejection) -> ApiError {
    ApiError::Unprocessable(rejection.body_text())
}

async fn get_currency_pair(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CurrencyPairQuery>, QueryRejection>,
) -> ApiResult<Json<CurrencyPairResponse>> {
    let Query(query) = query.map_err(unprocessable)?;
    let symbol = make_symbol(&query.base_currency, &query.quote_currency);

    let bucket = state
        .currency_pair_service
        .fetch_currency_pair(&symbol, query.desired_timestamp)
        .await?
        .ok_or_else(|| ApiError::NotFound(QUOTES_NOT_FOUND_MESSAGE.to_string()))?;
    let pair = bucket
        .find(&symbol)
        .ok_or_else(|| ApiError::NotFound(QUOTES_NOT_FOUND_MESSAGE.to_string()))?;

    Ok(Json(CurrencyPairResponse {
        conversion_rate: pair.conversion_rate,
        actual_timestamp_closest_to_desired: format_bucket_key(bucket.timestamp),
    }))
}

async fn convert(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> ApiResult<Json<ConvertResponse>> {
    let Query(query) = query.map_err(unprocessable)?;
    let request = ConversionRequest {
        amount: query.amount,
        base_currency: query.from,
        quote_currency: query.to,
        desired_timestamp: query.desired_timestamp,
    };

    let conversion = state.conversion_service.convert(&request).await?;
    Ok(Json(ConvertResponse {
        converted_amount: conversion.converted_amount,
        conversion_rate: conversion.conversion_rate,
        conversion_rate_age_seconds: conversion.conversion_rate_age_seconds,
        actual_timestamp_closest_to_desired: format_bucket_key(
            conversion.actual_timestamp_closest_to_desired,
        ),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/currency-pair", get(get_currency_pair))
        .route("/convert", get(convert))
}
