use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ratekeeper_core::conversion::ConversionError;
use ratekeeper_core::errors::Error as CoreError;
use serde::Serialize;
use thiserror::Error;

pub const QUOTES_NOT_FOUND_MESSAGE: &str =
    "Conversion is not possible. We don't have quotes for this pair.";
pub const QUOTES_OUTDATED_MESSAGE: &str = "quotes_outdated";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unprocessable(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::Core(e) => match e {
                CoreError::Conversion(ConversionError::QuotesNotFound(_)) => {
                    (StatusCode::NOT_FOUND, QUOTES_NOT_FOUND_MESSAGE.to_string())
                }
                CoreError::Conversion(ConversionError::QuotesOutdated { .. }) => {
                    (StatusCode::NOT_FOUND, QUOTES_OUTDATED_MESSAGE.to_string())
                }
                CoreError::Conversion(ConversionError::InvalidAmount(_))
                | CoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
                _ if e.is_storage_error() => {
                    tracing::error!("Storage failure while serving request: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Error. Failed to get the currency pair. {}", e),
                    )
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            },
            ApiError::NotFound(reason) => (StatusCode::NOT_FOUND, reason.clone()),
            ApiError::Unprocessable(reason) => (StatusCode::UNPROCESSABLE_ENTITY, reason.clone()),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
