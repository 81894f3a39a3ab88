//! Conversion module - amount conversion on top of currency pair lookups.

mod conversion_errors;
mod conversion_model;
mod conversion_service;

pub use conversion_errors::ConversionError;
pub use conversion_model::{Conversion, ConversionRequest};
pub use conversion_service::ConversionService;
