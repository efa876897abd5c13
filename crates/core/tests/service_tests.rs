// ═══════════════════════════════════════════════════════════════════
// Service & Integration Tests — ExchangeService, HistoryService,
// CurrencyExchange facade
// ═══════════════════════════════════════════════════════════════════

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use currency_exchange_core::errors::NetworkError;
use currency_exchange_core::models::currency::CurrencySymbol;
use currency_exchange_core::models::history::day_key;
use currency_exchange_core::models::quote::ExchangeRateQuote;
use currency_exchange_core::providers::traits::CurrencyDataSource;
use currency_exchange_core::services::exchange_service::{
    ExchangeAction, ExchangeEvent, ExchangeService, ExchangeStatus,
};
use currency_exchange_core::services::history_service::{HistoryService, HistoryStatus};
use currency_exchange_core::storage::history_store::HistoryStore;
use currency_exchange_core::CurrencyExchange;

// ═══════════════════════════════════════════════════════════════════
// Mock data source
// ═══════════════════════════════════════════════════════════════════

struct MockDataSource {
    symbols_response: Result<Vec<CurrencySymbol>, NetworkError>,
    rate_response: Result<ExchangeRateQuote, NetworkError>,
    symbol_calls: AtomicUsize,
    rate_calls: AtomicUsize,
}

impl MockDataSource {
    fn new() -> Self {
        Self {
            symbols_response: Ok(vec![
                CurrencySymbol::new("EGP", "Egyptian Pound"),
                CurrencySymbol::new("USD", "United States Dollar"),
            ]),
            rate_response: Ok(quote("USD", 1.0, "EGP", 30.0)),
            symbol_calls: AtomicUsize::new(0),
            rate_calls: AtomicUsize::new(0),
        }
    }

    fn with_symbols(symbols: Vec<CurrencySymbol>) -> Self {
        Self {
            symbols_response: Ok(symbols),
            ..Self::new()
        }
    }

    fn failing_symbols(error: NetworkError) -> Self {
        Self {
            symbols_response: Err(error),
            ..Self::new()
        }
    }

    fn failing_rate(error: NetworkError) -> Self {
        Self {
            rate_response: Err(error),
            ..Self::new()
        }
    }
}

#[async_trait]
impl CurrencyDataSource for MockDataSource {
    async fn symbols(&self) -> Result<Vec<CurrencySymbol>, NetworkError> {
        self.symbol_calls.fetch_add(1, Ordering::SeqCst);
        self.symbols_response.clone()
    }

    async fn latest_rate(
        &self,
        _source: &str,
        _target: &str,
    ) -> Result<ExchangeRateQuote, NetworkError> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        self.rate_response.clone()
    }
}

fn quote(src: &str, src_raw: f64, tgt: &str, tgt_raw: f64) -> ExchangeRateQuote {
    let rates: HashMap<String, f64> = [(src.to_string(), src_raw), (tgt.to_string(), tgt_raw)]
        .into_iter()
        .collect();
    ExchangeRateQuote::derive(1_700_000_000, "2024-05-01", src, tgt, &rates).unwrap()
}

fn service(mock: MockDataSource) -> (
    Arc<MockDataSource>,
    ExchangeService,
    tokio::sync::mpsc::UnboundedReceiver<ExchangeEvent>,
) {
    let mock = Arc::new(mock);
    let (service, events) = ExchangeService::new(mock.clone());
    (mock, service, events)
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeService — initial state and symbol loading
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn initial_state_is_idle_with_default_selection() {
    let (_, service, _events) = service(MockDataSource::new());
    let state = service.state().borrow().clone();

    assert_eq!(state.status, ExchangeStatus::Idle);
    assert!(state.symbols.is_empty());
    assert_eq!(state.source_currency.code, "USD");
    assert_eq!(state.target_currency.code, "EGP");
    assert_eq!(state.source_amount, "1.0");
    assert_eq!(state.target_amount, None);
}

#[tokio::test]
async fn load_currencies_stores_symbols_and_finishes_loaded() {
    let (_, service, mut events) = service(MockDataSource::new());

    service.load_currencies().await;

    let state = service.state().borrow().clone();
    assert_eq!(state.status, ExchangeStatus::LoadedCurrencies);
    assert_eq!(state.symbols.len(), 2);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn load_currencies_dedups_keeping_first_occurrence() {
    let (_, service, _events) = service(MockDataSource::with_symbols(vec![
        CurrencySymbol::new("USD", "United States Dollar"),
        CurrencySymbol::new("EUR", "Euro"),
        CurrencySymbol::new("USD", "US Dollar (duplicate)"),
        CurrencySymbol::new("EGP", "Egyptian Pound"),
    ]));

    service.load_currencies().await;

    let state = service.state().borrow().clone();
    let codes: Vec<&str> = state.symbols.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["USD", "EUR", "EGP"]);
    assert_eq!(state.symbols[0].name, "United States Dollar");
}

#[tokio::test]
async fn failed_symbol_load_reports_error_state_and_one_event() {
    let (_, service, mut events) =
        service(MockDataSource::failing_symbols(NetworkError::TooManyRequests));

    service.load_currencies().await;

    let state = service.state().borrow().clone();
    assert_eq!(
        state.status,
        ExchangeStatus::Error(NetworkError::TooManyRequests)
    );
    assert_eq!(
        events.try_recv().unwrap(),
        ExchangeEvent::Error(NetworkError::TooManyRequests)
    );
    assert!(events.try_recv().is_err(), "exactly one event per failure");
}

#[tokio::test]
async fn retry_after_error_reenters_loading_and_can_succeed() {
    let (mock, service, _events) =
        service(MockDataSource::failing_symbols(NetworkError::NoInternet));

    service.load_currencies().await;
    assert_eq!(
        service.state().borrow().status,
        ExchangeStatus::Error(NetworkError::NoInternet)
    );

    // Retry is just issuing the action again.
    service.handle(ExchangeAction::LoadCurrencies).await;
    assert_eq!(mock.symbol_calls.load(Ordering::SeqCst), 2);
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeService — selection and amount input
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn selecting_currencies_is_pure_state_update() {
    let (mock, service, _events) = service(MockDataSource::new());

    service.select_source(CurrencySymbol::new("EUR", "Euro"));
    service.select_target(CurrencySymbol::new("JPY", "Japanese Yen"));

    let state = service.state().borrow().clone();
    assert_eq!(state.source_currency.code, "EUR");
    assert_eq!(state.target_currency.code, "JPY");
    assert_eq!(mock.symbol_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mock.rate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn updating_amount_clears_computed_target() {
    let (_, service, _events) = service(MockDataSource::new());

    service.update_source_amount("10".to_string());
    service.calculate().await;
    assert!(service.state().borrow().target_amount.is_some());

    service.update_source_amount("25".to_string());
    let state = service.state().borrow().clone();
    assert_eq!(state.source_amount, "25");
    assert_eq!(state.target_amount, None);
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeService — calculation
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn calculate_computes_target_amount_from_fresh_quote() {
    let (_, service, mut events) = service(MockDataSource::new());

    service.update_source_amount("10".to_string());
    service.calculate().await;

    let state = service.state().borrow().clone();
    assert_eq!(state.status, ExchangeStatus::LoadedExchangeRate);
    assert_eq!(state.target_amount, Some(300.0));

    let source_rate = state.source_rate.expect("source rate stored");
    assert_eq!(source_rate.symbol, "USD");
    assert!((source_rate.rate - 30.0).abs() < 1e-12);

    let target_rate = state.target_rate.expect("target rate stored");
    assert_eq!(target_rate.symbol, "EGP");
    assert!((target_rate.rate - 1.0 / 30.0).abs() < 1e-12);

    match events.try_recv().unwrap() {
        ExchangeEvent::ConversionCompleted {
            source,
            target,
            source_amount,
            target_amount,
        } => {
            assert_eq!(source.code, "USD");
            assert_eq!(target.code, "EGP");
            assert_eq!(source_amount, 10.0);
            assert_eq!(target_amount, 300.0);
        }
        other => panic!("expected conversion event, got {other:?}"),
    }
}

#[tokio::test]
async fn calculate_with_non_numeric_amount_is_a_no_op() {
    let (mock, service, mut events) = service(MockDataSource::new());
    service.load_currencies().await;
    service.update_source_amount("12,5".to_string());

    let before = service.state().borrow().clone();
    service.calculate().await;
    let after = service.state().borrow().clone();

    assert_eq!(before, after);
    assert_eq!(mock.rate_calls.load(Ordering::SeqCst), 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn calculate_with_empty_amount_is_a_no_op() {
    let (mock, service, _events) = service(MockDataSource::new());

    service.update_source_amount(String::new());
    service.calculate().await;

    assert_eq!(mock.rate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_rate_fetch_returns_to_loaded_currencies() {
    let (_, service, mut events) =
        service(MockDataSource::failing_rate(NetworkError::ServerError));
    service.load_currencies().await;
    service.select_source(CurrencySymbol::new("EUR", "Euro"));

    service.calculate().await;

    let state = service.state().borrow().clone();
    // Not the error status: the screen stays usable with its selection.
    assert_eq!(state.status, ExchangeStatus::LoadedCurrencies);
    assert_eq!(state.source_currency.code, "EUR");
    assert_eq!(
        events.try_recv().unwrap(),
        ExchangeEvent::Error(NetworkError::ServerError)
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn calculate_parses_amount_with_surrounding_whitespace() {
    let (_, service, _events) = service(MockDataSource::new());

    service.update_source_amount(" 2.5 ".to_string());
    service.calculate().await;

    assert_eq!(service.state().borrow().target_amount, Some(75.0));
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeService — swapping
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn swap_exchanges_symbols_rates_and_amounts() {
    let (_, service, _events) = service(MockDataSource::new());
    service.update_source_amount("10".to_string());
    service.calculate().await;

    service.swap();

    let state = service.state().borrow().clone();
    assert_eq!(state.source_currency.code, "EGP");
    assert_eq!(state.target_currency.code, "USD");
    assert_eq!(state.source_amount, "300");
    assert_eq!(state.target_amount, None);
    assert_eq!(state.source_rate.unwrap().symbol, "EGP");
    assert_eq!(state.target_rate.unwrap().symbol, "USD");
}

#[tokio::test]
async fn swap_without_computed_amount_defaults_to_one() {
    let (_, service, _events) = service(MockDataSource::new());

    service.swap();

    let state = service.state().borrow().clone();
    assert_eq!(state.source_currency.code, "EGP");
    assert_eq!(state.source_amount, "1.0");
}

#[tokio::test]
async fn swap_twice_restores_the_currency_pair() {
    let (_, service, _events) = service(MockDataSource::new());

    service.handle(ExchangeAction::Swap).await;
    service.handle(ExchangeAction::Swap).await;

    let state = service.state().borrow().clone();
    assert_eq!(state.source_currency.code, "USD");
    assert_eq!(state.target_currency.code, "EGP");
}

// ═══════════════════════════════════════════════════════════════════
// HistoryService
// ═══════════════════════════════════════════════════════════════════

async fn history_fixture() -> (Arc<HistoryService>, tokio::task::JoinHandle<()>) {
    let store = HistoryStore::open("sqlite::memory:").await.unwrap();
    let service = Arc::new(HistoryService::new(Arc::new(store)));
    let driver = {
        let service = service.clone();
        tokio::spawn(async move { service.load_history().await })
    };
    (service, driver)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[tokio::test]
async fn empty_history_loads_as_empty() {
    let (service, driver) = history_fixture().await;
    let mut state = service.state();

    let snapshot = timeout(
        Duration::from_secs(5),
        state.wait_for(|s| s.status == HistoryStatus::LoadedEmpty),
    )
    .await
    .expect("history did not load")
    .unwrap();

    assert!(snapshot.days.is_empty());
    driver.abort();
}

#[tokio::test]
async fn appended_entry_shows_up_grouped_under_its_day() {
    let (service, driver) = history_fixture().await;
    let mut state = service.state();

    timeout(
        Duration::from_secs(5),
        state.wait_for(|s| s.status == HistoryStatus::LoadedEmpty),
    )
    .await
    .expect("initial emission missing")
    .unwrap();

    let ts = now_millis();
    service
        .append(currency_exchange_core::models::history::HistoryEntry::new(
            "USD", "EGP", "10", "300", ts,
        ))
        .await;

    let snapshot = timeout(
        Duration::from_secs(5),
        state.wait_for(|s| s.status == HistoryStatus::Loaded),
    )
    .await
    .expect("live query did not emit after insert")
    .unwrap();

    assert_eq!(snapshot.days.len(), 1);
    assert_eq!(snapshot.days[0].day, day_key(ts));
    assert_eq!(snapshot.days[0].entries[0].source_symbol, "USD");
    assert_eq!(snapshot.days[0].entries[0].source_amount, "10.00");
    driver.abort();
}

// ═══════════════════════════════════════════════════════════════════
// CurrencyExchange facade
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn conversion_event_flows_into_history() {
    let store = HistoryStore::open("sqlite::memory:").await.unwrap();
    let (app, mut events) = CurrencyExchange::with_parts(Arc::new(MockDataSource::new()), store);
    let app = Arc::new(app);

    let driver = {
        let app = app.clone();
        tokio::spawn(async move { app.history.load_history().await })
    };
    let mut history_state = app.history.state();
    timeout(
        Duration::from_secs(5),
        history_state.wait_for(|s| s.status == HistoryStatus::LoadedEmpty),
    )
    .await
    .expect("history did not come up")
    .unwrap();

    app.exchange.update_source_amount("10".to_string());
    app.exchange.calculate().await;

    let event = events.recv().await.expect("conversion event");
    app.record_conversion(&event).await;

    let snapshot = timeout(
        Duration::from_secs(5),
        history_state.wait_for(|s| s.status == HistoryStatus::Loaded),
    )
    .await
    .expect("conversion never reached history")
    .unwrap();

    assert_eq!(snapshot.days[0].entries[0].source_symbol, "USD");
    assert_eq!(snapshot.days[0].entries[0].target_symbol, "EGP");
    assert_eq!(snapshot.days[0].entries[0].target_amount, "300.00");
    driver.abort();
}

#[tokio::test]
async fn error_events_do_not_reach_history() {
    let store = HistoryStore::open("sqlite::memory:").await.unwrap();
    let (app, _events) = CurrencyExchange::with_parts(
        Arc::new(MockDataSource::failing_symbols(NetworkError::Unknown)),
        store,
    );

    app.record_conversion(&ExchangeEvent::Error(NetworkError::Unknown))
        .await;

    assert!(app.history.state().borrow().days.is_empty());
}
