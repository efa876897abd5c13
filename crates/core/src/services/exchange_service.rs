use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::errors::NetworkError;
use crate::models::currency::CurrencySymbol;
use crate::models::quote::ExchangeRateQuote;
use crate::providers::traits::CurrencyDataSource;

/// Lifecycle of the conversion screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeStatus {
    Idle,
    LoadingCurrencies,
    LoadedCurrencies,
    LoadingExchangeRate,
    LoadedExchangeRate,
    Error(NetworkError),
}

/// One direction of a loaded quote, ready for display next to a currency.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalRate {
    pub symbol: String,
    pub rate: f64,
}

/// Snapshot of everything the conversion screen renders.
///
/// Written only by [`ExchangeService`]; any number of readers can hold a
/// `watch` receiver and observe replacements.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeState {
    pub status: ExchangeStatus,
    pub symbols: Vec<CurrencySymbol>,
    pub source_currency: CurrencySymbol,
    pub target_currency: CurrencySymbol,
    /// Raw user input; validated only when a calculation runs.
    pub source_amount: String,
    pub target_amount: Option<f64>,
    pub source_rate: Option<DirectionalRate>,
    pub target_rate: Option<DirectionalRate>,
}

impl Default for ExchangeState {
    fn default() -> Self {
        Self {
            status: ExchangeStatus::Idle,
            symbols: Vec::new(),
            source_currency: CurrencySymbol::new("USD", "United States Dollar"),
            target_currency: CurrencySymbol::new("EGP", "Egyptian Pound"),
            source_amount: "1.0".to_string(),
            target_amount: None,
            source_rate: None,
            target_rate: None,
        }
    }
}

/// The closed set of user actions the conversion screen can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeAction {
    LoadCurrencies,
    SelectSource(CurrencySymbol),
    SelectTarget(CurrencySymbol),
    UpdateSourceAmount(String),
    Swap,
    Calculate,
}

/// One-shot notifications, delivered at most once per occurrence regardless
/// of later state overwrites.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeEvent {
    Error(NetworkError),
    ConversionCompleted {
        source: CurrencySymbol,
        target: CurrencySymbol,
        source_amount: f64,
        target_amount: f64,
    },
}

/// State controller for the conversion screen.
///
/// All mutations funnel through this service's methods, which complete a
/// whole state replacement before returning; readers never observe a
/// half-applied update. Cancellation is dropping the in-flight future.
pub struct ExchangeService {
    data_source: Arc<dyn CurrencyDataSource>,
    state: watch::Sender<ExchangeState>,
    events: mpsc::UnboundedSender<ExchangeEvent>,
    /// Ticket counter for in-flight rate requests; a response only lands if
    /// no newer request has started since (last started wins).
    rate_generation: AtomicU64,
}

impl ExchangeService {
    /// Build the service around a data source. The returned receiver is the
    /// single consumer of one-shot [`ExchangeEvent`]s.
    pub fn new(
        data_source: Arc<dyn CurrencyDataSource>,
    ) -> (Self, mpsc::UnboundedReceiver<ExchangeEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ExchangeState::default());
        (
            Self {
                data_source,
                state,
                events,
                rate_generation: AtomicU64::new(0),
            },
            event_rx,
        )
    }

    /// Observe state replacements. The receiver immediately holds the
    /// current snapshot.
    pub fn state(&self) -> watch::Receiver<ExchangeState> {
        self.state.subscribe()
    }

    /// Dispatch one user action.
    pub async fn handle(&self, action: ExchangeAction) {
        match action {
            ExchangeAction::LoadCurrencies => self.load_currencies().await,
            ExchangeAction::SelectSource(symbol) => self.select_source(symbol),
            ExchangeAction::SelectTarget(symbol) => self.select_target(symbol),
            ExchangeAction::UpdateSourceAmount(amount) => self.update_source_amount(amount),
            ExchangeAction::Swap => self.swap(),
            ExchangeAction::Calculate => self.calculate().await,
        }
    }

    /// Fetch the symbol list. Errors land in `status` and also fire a
    /// one-shot event; retrying is calling this again.
    pub async fn load_currencies(&self) {
        self.state
            .send_modify(|s| s.status = ExchangeStatus::LoadingCurrencies);

        match self.data_source.symbols().await {
            Ok(symbols) => self.state.send_modify(|s| {
                s.symbols = dedup_symbols(symbols);
                s.status = ExchangeStatus::LoadedCurrencies;
            }),
            Err(error) => {
                self.state
                    .send_modify(|s| s.status = ExchangeStatus::Error(error));
                self.emit(ExchangeEvent::Error(error));
            }
        }
    }

    /// Select the currency being converted from. No network traffic.
    pub fn select_source(&self, symbol: CurrencySymbol) {
        self.state.send_modify(|s| s.source_currency = symbol);
    }

    /// Select the currency being converted into. No network traffic.
    pub fn select_target(&self, symbol: CurrencySymbol) {
        self.state.send_modify(|s| s.target_currency = symbol);
    }

    /// Store the raw amount text and drop the stale computed result.
    pub fn update_source_amount(&self, amount: String) {
        self.state.send_modify(|s| {
            s.source_amount = amount;
            s.target_amount = None;
        });
    }

    /// Fetch a fresh quote and compute the target amount.
    ///
    /// Text that does not parse as a number makes this a no-op. A failed
    /// fetch returns the screen to `LoadedCurrencies` (selection intact) and
    /// fires an error event instead of entering the error status.
    pub async fn calculate(&self) {
        let (source, target, amount_text) = {
            let s = self.state.borrow();
            (
                s.source_currency.clone(),
                s.target_currency.clone(),
                s.source_amount.clone(),
            )
        };

        let Ok(amount) = amount_text.trim().parse::<f64>() else {
            return;
        };

        let ticket = self.rate_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .send_modify(|s| s.status = ExchangeStatus::LoadingExchangeRate);

        let result = self
            .data_source
            .latest_rate(&source.code, &target.code)
            .await;

        if self.rate_generation.load(Ordering::SeqCst) != ticket {
            // A newer request superseded this one while it was in flight.
            return;
        }

        match result {
            Ok(quote) => {
                let target_amount = amount * quote.source_rate;
                self.apply_quote(&quote, target_amount);
                self.emit(ExchangeEvent::ConversionCompleted {
                    source,
                    target,
                    source_amount: amount,
                    target_amount,
                });
            }
            Err(error) => {
                self.state
                    .send_modify(|s| s.status = ExchangeStatus::LoadedCurrencies);
                self.emit(ExchangeEvent::Error(error));
            }
        }
    }

    /// Exchange source and target: symbols and directional rates swap, the
    /// old target amount becomes the new source text ("1.0" when there is
    /// none yet), and the computed amount clears pending recalculation.
    pub fn swap(&self) {
        self.state.send_modify(|s| {
            std::mem::swap(&mut s.source_currency, &mut s.target_currency);
            std::mem::swap(&mut s.source_rate, &mut s.target_rate);
            s.source_amount = match s.target_amount {
                Some(amount) => amount.to_string(),
                None => "1.0".to_string(),
            };
            s.target_amount = None;
        });
    }

    fn apply_quote(&self, quote: &ExchangeRateQuote, target_amount: f64) {
        self.state.send_modify(|s| {
            s.status = ExchangeStatus::LoadedExchangeRate;
            s.source_rate = Some(DirectionalRate {
                symbol: quote.source_symbol.clone(),
                rate: quote.source_rate,
            });
            s.target_rate = Some(DirectionalRate {
                symbol: quote.target_symbol.clone(),
                rate: quote.target_rate,
            });
            s.target_amount = Some(target_amount);
        });
    }

    fn emit(&self, event: ExchangeEvent) {
        // The receiver side may already be gone during teardown.
        let _ = self.events.send(event);
    }
}

/// Drop repeated codes, keeping the first occurrence's position.
fn dedup_symbols(symbols: Vec<CurrencySymbol>) -> Vec<CurrencySymbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.code.clone()))
        .collect()
}
