use log::{debug, error, info};
use ratekeeper_market_data::{ExchangeQuote, QuoteProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::currency_pairs::{create_currency_pair_bucket_from_quotes, QuoteStore};

/// What a single ingestion cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Snapshot stored under this bucket key.
    Stored(String),
    FetchFailed,
    /// Snapshot fetched but persisting the bucket with this key failed.
    StoreFailed(String),
    /// Cancelled after the fetch, nothing was stored.
    Cancelled,
}

/// Fetches a full snapshot from the provider every `fetch_interval` and
/// stores it as one bucket.
///
/// Failures never stop the loop; they are logged and the next cycle runs on
/// schedule. Only cancellation ends it.
pub struct IngestionService {
    provider: Arc<dyn QuoteProvider>,
    store: QuoteStore,
    fetch_interval: Duration,
}

impl IngestionService {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        store: QuoteStore,
        fetch_interval: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            fetch_interval,
        }
    }

    /// Runs cycles until `cancel` fires. An in-flight fetch or store call is
    /// allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Currency pair ingestion starting ({} every {:?})",
            self.provider.id(),
            self.fetch_interval
        );

        while !cancel.is_cancelled() {
            let outcome = self.run_cycle_until(&cancel).await;
            debug!("Ingestion cycle finished: {:?}", outcome);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.fetch_interval) => {}
            }
        }

        info!("Currency pair ingestion stopped");
    }

    /// One fetch-build-store cycle.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_until(&CancellationToken::new()).await
    }

    async fn run_cycle_until(&self, cancel: &CancellationToken) -> CycleOutcome {
        let Some(quotes) = self.fetch_currency_pairs().await else {
            return CycleOutcome::FetchFailed;
        };

        if cancel.is_cancelled() {
            return CycleOutcome::Cancelled;
        }

        let bucket = create_currency_pair_bucket_from_quotes(quotes);
        let key = bucket.key();
        match self.store.create_bucket(&bucket).await {
            Ok(()) => {
                info!("Currency pairs successfully stored with key: {}", key);
                CycleOutcome::Stored(key)
            }
            Err(e) => {
                error!("Failed to store currency pairs. {}", e);
                CycleOutcome::StoreFailed(key)
            }
        }
    }

    async fn fetch_currency_pairs(&self) -> Option<Vec<ExchangeQuote>> {
        info!(
            "Trying to fetch currency pairs from {}.",
            self.provider.source_url()
        );

        match self.provider.fetch_quotes().await {
            Ok(quotes) => {
                info!("Currency pairs successfully fetched.");
                Some(quotes)
            }
            Err(e) => {
                error!("Failed to fetch currency pairs. {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency_pairs::{
        CurrencyPair, CurrencyPairRepositoryTrait, InMemoryCurrencyPairRepository,
    };
    use crate::errors::{DatabaseError, Result};
    use async_trait::async_trait;
    use ratekeeper_market_data::MarketDataError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(3600);
    const INTERVAL: Duration = Duration::from_secs(10);

    // --- Mock provider ---

    struct MockProvider {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for MockProvider {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        fn source_url(&self) -> &str {
            "http://exchange.test/api/v3/ticker/price"
        }

        async fn fetch_quotes(&self) -> std::result::Result<Vec<ExchangeQuote>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MarketDataError::BadResponse {
                    url: self.source_url().to_string(),
                    status: 503,
                });
            }
            Ok(vec![
                ExchangeQuote::new("RUBUSD", Some(0.011)),
                ExchangeQuote::new("USDRUB", Some(90.5)),
            ])
        }
    }

    // --- Mock repository ---

    /// Rejects every write, reports an empty index.
    struct UnavailableRepository;

    #[async_trait]
    impl CurrencyPairRepositoryTrait for UnavailableRepository {
        async fn write_currency_pairs(&self, _: &str, _: &[CurrencyPair]) -> Result<()> {
            Err(DatabaseError::ConnectionFailed("store unavailable".to_string()).into())
        }

        async fn set_ttl(&self, _: &str, _: Duration) -> Result<()> {
            Ok(())
        }

        async fn add_to_timestamp_index(&self, _: &str, _: i64) -> Result<()> {
            Ok(())
        }

        async fn read_currency_pairs(&self, _: &str) -> Result<Vec<CurrencyPair>> {
            Ok(Vec::new())
        }

        async fn latest_timestamp(&self) -> Result<Option<String>> {
            Ok(None)
        }

        async fn timestamps_in_range(&self, _: i64, _: i64) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn memory_store() -> QuoteStore {
        QuoteStore::new(Arc::new(InMemoryCurrencyPairRepository::new()), TTL)
    }

    #[tokio::test]
    async fn test_cycle_stores_fetched_snapshot() {
        let store = memory_store();
        let service = IngestionService::new(MockProvider::new(false), store.clone(), INTERVAL);

        let outcome = service.run_cycle().await;

        let CycleOutcome::Stored(key) = outcome else {
            panic!("unexpected outcome: {outcome:?}");
        };
        let bucket = store
            .retrieve_latest_currency_pair("USDRUB", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bucket.key(), key);
        assert_eq!(bucket.currency_pairs, vec![CurrencyPair::new("USDRUB", Some(90.5))]);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_persistence() {
        let store = memory_store();
        let service = IngestionService::new(MockProvider::new(true), store.clone(), INTERVAL);

        assert_eq!(service.run_cycle().await, CycleOutcome::FetchFailed);
        assert_eq!(store.resolve_timestamp(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_not_raised() {
        let store = QuoteStore::new(Arc::new(UnavailableRepository), TTL);
        let service = IngestionService::new(MockProvider::new(false), store, INTERVAL);

        assert!(matches!(service.run_cycle().await, CycleOutcome::StoreFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_repeats_every_interval_until_cancelled() {
        let provider = MockProvider::new(true);
        let service = Arc::new(IngestionService::new(provider.clone(), memory_store(), INTERVAL));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let service = service.clone();
            let cancel = cancel.clone();
            async move { service.run(cancel).await }
        });

        // Cycles at t=0, 10, 20.
        sleep(Duration::from_secs(25)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_loop_does_not_fetch() {
        let provider = MockProvider::new(false);
        let service = IngestionService::new(provider.clone(), memory_store(), INTERVAL);
        let cancel = CancellationToken::new();
        cancel.cancel();

        service.run(cancel).await;

        assert_eq!(provider.calls(), 0);
    }
}
