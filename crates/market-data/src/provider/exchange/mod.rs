//! HTTP exchange provider.
//!
//! Issues `GET <exchange-url>` and expects a JSON array of
//! `{"symbol": ..., "price": ...}` objects, which is what the Binance
//! `/api/v3/ticker/price` endpoint returns when called without a symbol.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::ExchangeQuote;
use crate::provider::QuoteProvider;

/// Provider ID constant
const PROVIDER_ID: &str = "EXCHANGE";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches full snapshots from a single exchange URL.
///
/// # Example
///
/// ```ignore
/// use ratekeeper_market_data::ExchangeProvider;
///
/// let provider = ExchangeProvider::new("https://api.binance.com/api/v3/ticker/price");
/// ```
pub struct ExchangeProvider {
    client: Client,
    url: String,
}

impl ExchangeProvider {
    /// Create a provider for `url` with the default request timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    /// Create a provider for `url` whose requests give up after `timeout`.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
        }
    }

    /// Decode a snapshot body.
    fn parse_quotes(body: &str) -> Result<Vec<ExchangeQuote>, MarketDataError> {
        Ok(serde_json::from_str::<Vec<ExchangeQuote>>(body)?)
    }
}

#[async_trait]
impl QuoteProvider for ExchangeProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_quotes(&self) -> Result<Vec<ExchangeQuote>, MarketDataError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MarketDataError::BadRequest {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::BadResponse {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::BadRequest {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let quotes = Self::parse_quotes(&body)?;
        log::debug!("{} returned {} quotes", PROVIDER_ID, quotes.len());
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response and returns the URL to hit.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/api/v3/ticker/price", addr)
    }

    #[test]
    fn test_parse_quotes_rejects_non_array_payload() {
        let result = ExchangeProvider::parse_quotes(r#"{"code": -1121, "msg": "Invalid symbol."}"#);
        assert!(matches!(result, Err(MarketDataError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_quotes_success() {
        let url = serve_once(
            "200 OK",
            r#"[{"symbol":"LTCBTC","price":"0.00101200"},{"symbol":"RUBUSD","price":0.011}]"#,
        )
        .await;
        let provider = ExchangeProvider::new(url.clone());

        let quotes = provider.fetch_quotes().await.unwrap();

        assert_eq!(provider.source_url(), url);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0], ExchangeQuote::new("LTCBTC", Some(0.001012)));
        assert_eq!(quotes[1], ExchangeQuote::new("RUBUSD", Some(0.011)));
    }

    #[tokio::test]
    async fn test_fetch_quotes_non_success_status() {
        let url = serve_once("503 Service Unavailable", "[]").await;
        let provider = ExchangeProvider::new(url);

        let error = provider.fetch_quotes().await.unwrap_err();

        assert_eq!(error.status(), Some(503));
    }

    #[tokio::test]
    async fn test_fetch_quotes_unreachable_exchange() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = ExchangeProvider::with_timeout(
            format!("http://{}/api/v3/ticker/price", addr),
            Duration::from_secs(2),
        );

        let error = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(error, MarketDataError::BadRequest { .. }));
    }
}
