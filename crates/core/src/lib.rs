pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;

use tokio::sync::mpsc;

use errors::StorageError;
use models::history::HistoryEntry;
use models::settings::Settings;
use providers::exchange_rates_api::ExchangeRatesApiProvider;
use providers::traits::CurrencyDataSource;
use services::exchange_service::{ExchangeEvent, ExchangeService};
use services::history_service::HistoryService;
use storage::history_store::HistoryStore;

/// Main entry point for the currency exchange core.
///
/// Wires the remote rate provider into the exchange controller and the local
/// history store into the history controller. The UI layer observes each
/// controller's state, feeds actions in, and forwards conversion-completed
/// events to [`record_conversion`](Self::record_conversion).
pub struct CurrencyExchange {
    pub exchange: ExchangeService,
    pub history: HistoryService,
}

impl CurrencyExchange {
    /// Connect to the configured rate API and open the history database.
    /// The returned receiver is the single consumer of exchange events.
    pub async fn new(
        settings: Settings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ExchangeEvent>), StorageError> {
        let provider = Arc::new(ExchangeRatesApiProvider::new(
            &settings.api_base_url,
            &settings.api_key,
        ));
        let store = HistoryStore::open(&settings.database_url).await?;
        Ok(Self::with_parts(provider, store))
    }

    /// Assemble the facade from pre-built parts. Lets callers swap in a
    /// different data source implementation.
    pub fn with_parts(
        data_source: Arc<dyn CurrencyDataSource>,
        store: HistoryStore,
    ) -> (Self, mpsc::UnboundedReceiver<ExchangeEvent>) {
        let (exchange, events) = ExchangeService::new(data_source);
        let history = HistoryService::new(Arc::new(store));
        (Self { exchange, history }, events)
    }

    /// History-append collaborator for exchange events: a completed
    /// conversion becomes a history row stamped with the current time.
    /// Other event kinds are not history material and pass through.
    pub async fn record_conversion(&self, event: &ExchangeEvent) {
        if let ExchangeEvent::ConversionCompleted {
            source,
            target,
            source_amount,
            target_amount,
        } = event
        {
            let entry = HistoryEntry::new(
                source.code.clone(),
                target.code.clone(),
                source_amount.to_string(),
                target_amount.to_string(),
                chrono::Utc::now().timestamp_millis(),
            );
            self.history.append(entry).await;
        }
    }
}
