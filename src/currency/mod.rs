use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("EUR")
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange rates against the base currency, expressed as units of the
/// foreign currency per one base unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default)]
    pub base: CurrencyCode,
    #[serde(default = "RateTable::default_rates")]
    pub rates: HashMap<String, f64>,
    #[serde(default)]
    pub last_update: Option<NaiveDate>,
}

impl RateTable {
    fn default_rates() -> HashMap<String, f64> {
        HashMap::from([
            ("USD".to_string(), 1.08),
            ("GBP".to_string(), 0.86),
            ("CHF".to_string(), 0.97),
            ("CAD".to_string(), 1.47),
            ("JPY".to_string(), 162.5),
        ])
    }

    pub fn rate_for(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code.as_str()).copied()
    }

    /// Replaces the rate set, dropping non-positive entries, and stamps the
    /// update date.
    pub fn replace_rates(&mut self, rates: HashMap<String, f64>, today: NaiveDate) {
        self.rates = rates
            .into_iter()
            .filter(|(_, rate)| *rate > 0.0)
            .collect();
        self.last_update = Some(today);
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            base: CurrencyCode::default(),
            rates: Self::default_rates(),
            last_update: None,
        }
    }
}

/// Converts an entered amount to the base currency.
///
/// Base-currency amounts pass through untouched. A currency without a
/// configured rate also passes through unmodified: the conversion fails
/// open rather than rejecting the entry, and the gap is logged so an
/// operator can spot the missing configuration.
pub fn convert_to_base(amount: f64, currency: &CurrencyCode, table: &RateTable) -> f64 {
    if currency == &table.base {
        return amount;
    }
    match table.rate_for(currency) {
        Some(rate) => amount / rate,
        None => {
            tracing::warn!(code = %currency, "no exchange rate configured; storing amount unconverted");
            amount
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_currency_passes_through() {
        let table = RateTable::default();
        let eur = CurrencyCode::new("EUR");
        assert_eq!(convert_to_base(100.0, &eur, &table), 100.0);
    }

    #[test]
    fn divides_by_configured_rate() {
        let table = RateTable::default();
        let usd = CurrencyCode::new("USD");
        let converted = convert_to_base(100.0, &usd, &table);
        assert!((converted - 92.59).abs() < 0.01);
    }

    #[test]
    fn missing_rate_fails_open() {
        let mut table = RateTable::default();
        table.rates.clear();
        let nok = CurrencyCode::new("NOK");
        assert_eq!(convert_to_base(250.0, &nok, &table), 250.0);
    }

    #[test]
    fn replace_rates_drops_non_positive_entries() {
        let mut table = RateTable::default();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        table.replace_rates(
            HashMap::from([("USD".to_string(), 1.1), ("GBP".to_string(), 0.0)]),
            today,
        );
        assert_eq!(table.rates.len(), 1);
        assert_eq!(table.last_update, Some(today));
    }
}
