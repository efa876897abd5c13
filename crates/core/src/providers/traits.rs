use async_trait::async_trait;

use crate::errors::NetworkError;
use crate::models::currency::CurrencySymbol;
use crate::models::quote::ExchangeRateQuote;

/// Trait abstraction for the remote currency data source.
///
/// The controllers only see this trait; the concrete REST provider (or a
/// test double) is injected at construction. If the API changes or gets
/// replaced, only one implementation moves.
#[async_trait]
pub trait CurrencyDataSource: Send + Sync {
    /// Fetch the list of currencies the provider can convert between.
    async fn symbols(&self) -> Result<Vec<CurrencySymbol>, NetworkError>;

    /// Fetch the latest quote for converting `source` into `target`.
    async fn latest_rate(
        &self,
        source: &str,
        target: &str,
    ) -> Result<ExchangeRateQuote, NetworkError>;
}
