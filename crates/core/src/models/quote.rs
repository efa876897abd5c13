use std::collections::HashMap;

use thiserror::Error;

/// A derived bidirectional exchange rate between two currencies at a point
/// in time.
///
/// `source_rate` is the amount of target currency per 1 source unit;
/// `target_rate` is the reciprocal direction. Both are derived from the
/// provider's raw rates-versus-base map, so
/// `source_rate * target_rate == 1.0` up to floating-point rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateQuote {
    /// Provider timestamp (Unix seconds) for when the rates were published.
    pub timestamp: i64,

    /// Provider date string, "YYYY-MM-DD".
    pub date: String,

    /// Code of the source currency.
    pub source_symbol: String,

    /// Code of the target currency.
    pub target_symbol: String,

    /// Target units per 1 source unit.
    pub source_rate: f64,

    /// Source units per 1 target unit.
    pub target_rate: f64,
}

/// Failure to derive a quote from a raw rates map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("Provider returned no rate for {0}")]
    MissingRate(String),

    #[error("Provider returned unusable rate for {symbol}: {rate}")]
    InvalidRate { symbol: String, rate: f64 },
}

impl ExchangeRateQuote {
    /// Derive both directional rates from a rates-versus-base map.
    ///
    /// The two requested codes are looked up by key; the map's iteration
    /// order carries no meaning. Requesting the same currency on both sides
    /// resolves to the same entry and yields a 1:1 quote. Zero or non-finite
    /// raw rates are rejected instead of propagating NaN/infinity into the
    /// division.
    pub fn derive(
        timestamp: i64,
        date: impl Into<String>,
        source: &str,
        target: &str,
        rates: &HashMap<String, f64>,
    ) -> Result<Self, QuoteError> {
        let source_raw = raw_rate(rates, source)?;
        let target_raw = raw_rate(rates, target)?;

        Ok(Self {
            timestamp,
            date: date.into(),
            source_symbol: source.to_uppercase(),
            target_symbol: target.to_uppercase(),
            source_rate: target_raw / source_raw,
            target_rate: source_raw / target_raw,
        })
    }

    /// Quote for the opposite conversion direction.
    pub fn swapped(&self) -> Self {
        Self {
            timestamp: self.timestamp,
            date: self.date.clone(),
            source_symbol: self.target_symbol.clone(),
            target_symbol: self.source_symbol.clone(),
            source_rate: self.target_rate,
            target_rate: self.source_rate,
        }
    }
}

fn raw_rate(rates: &HashMap<String, f64>, symbol: &str) -> Result<f64, QuoteError> {
    let upper = symbol.to_uppercase();
    let rate = rates
        .get(&upper)
        .copied()
        .ok_or_else(|| QuoteError::MissingRate(upper.clone()))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(QuoteError::InvalidRate {
            symbol: upper,
            rate,
        });
    }
    Ok(rate)
}
