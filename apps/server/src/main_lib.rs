use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use ratekeeper_core::{
    conversion::ConversionService,
    currency_pairs::{
        CurrencyPairRepositoryTrait, CurrencyPairService, CurrencyPairServiceTrait,
        InMemoryCurrencyPairRepository, QuoteStore,
    },
    ingestion::IngestionService,
};
use ratekeeper_market_data::{ExchangeProvider, QuoteProvider};
use ratekeeper_storage_sqlite::{
    db::{self, spawn_writer},
    CurrencyPairRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub quote_store: QuoteStore,
    pub currency_pair_service: Arc<dyn CurrencyPairServiceTrait>,
    pub conversion_service: Arc<ConversionService>,
    pub ingestion_service: Arc<IngestionService>,
}

pub fn init_tracing() {
    let log_format = std::env::var("RK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn CurrencyPairRepositoryTrait>> {
    match config.store_backend {
        StoreBackend::Sqlite => {
            let db_path = db::init(&config.db_path)?;
            tracing::info!("Database path in use: {}", db_path);
            let pool = db::create_pool(&db_path)?;
            db::run_migrations(&pool)?;
            let writer = spawn_writer((*pool).clone());
            Ok(Arc::new(CurrencyPairRepository::new(pool, writer)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory quote store; quotes are lost on restart");
            Ok(Arc::new(InMemoryCurrencyPairRepository::new()))
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let repository = build_repository(config).await?;
    let quote_store = QuoteStore::new(repository, config.currency_pair_ttl);

    let currency_pair_service: Arc<dyn CurrencyPairServiceTrait> =
        Arc::new(CurrencyPairService::new(quote_store.clone()));
    let conversion_service = Arc::new(ConversionService::new(
        currency_pair_service.clone(),
        config.max_quote_age,
    ));

    let provider: Arc<dyn QuoteProvider> = Arc::new(ExchangeProvider::with_timeout(
        config.exchange_api_url.clone(),
        config.exchange_timeout,
    ));
    let ingestion_service = Arc::new(IngestionService::new(
        provider,
        quote_store.clone(),
        config.exchange_fetch_interval,
    ));

    Ok(Arc::new(AppState {
        quote_store,
        currency_pair_service,
        conversion_service,
        ingestion_service,
    }))
}
