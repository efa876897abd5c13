use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::call;
use super::traits::CurrencyDataSource;
use crate::errors::NetworkError;
use crate::models::currency::CurrencySymbol;
use crate::models::quote::ExchangeRateQuote;

/// REST provider for currency symbols and latest exchange rates.
///
/// - **Endpoints**: `/symbols`, `/latest?symbols=SRC,TGT`
/// - **Auth**: API key sent as the `access_key` query parameter on every
///   request.
/// - Rates are quoted against the provider's fixed base currency; the
///   directional pair rate is derived locally from the two raw entries.
pub struct ExchangeRatesApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRatesApiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{path}", self.base_url))
            .query(&[("access_key", self.api_key.as_str())])
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct SymbolsResponse {
    success: bool,
    #[serde(default)]
    symbols: HashMap<String, String>,
}

#[derive(Deserialize)]
struct LatestRatesResponse {
    success: bool,
    timestamp: i64,
    date: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl CurrencyDataSource for ExchangeRatesApiProvider {
    async fn symbols(&self) -> Result<Vec<CurrencySymbol>, NetworkError> {
        let resp: SymbolsResponse = call::get_json(self.get("symbols")).await?;
        if !resp.success {
            return Err(NetworkError::ServerError);
        }

        let mut symbols: Vec<CurrencySymbol> = resp
            .symbols
            .into_iter()
            .map(|(code, name)| CurrencySymbol::new(code, name))
            .collect();
        // The wire format is a JSON object; sort for a stable listing.
        symbols.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(symbols)
    }

    async fn latest_rate(
        &self,
        source: &str,
        target: &str,
    ) -> Result<ExchangeRateQuote, NetworkError> {
        let request = self
            .get("latest")
            .query(&[("symbols", format!("{source},{target}"))]);
        let resp: LatestRatesResponse = call::get_json(request).await?;
        if !resp.success {
            return Err(NetworkError::ServerError);
        }

        ExchangeRateQuote::derive(resp.timestamp, resp.date, source, target, &resp.rates)
            .map_err(|e| {
                log::warn!("rejecting quote for {source}/{target}: {e}");
                NetworkError::ServerError
            })
    }
}
