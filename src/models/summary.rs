//! Basic summary from `/api/v1/summary/basic`.
//!
//! The endpoint returns one object per metric and currency, keyed by
//! names such as `spent-in-EUR` or `net-worth-in-EUR`. [`Summary`] folds
//! those keys into one [`CurrencySummary`] per currency code.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Separator between the metric name and the currency code in keys.
const CURRENCY_INFIX: &str = "-in-";

/// Summary metrics for one currency. A field is `None` when the server
/// did not report it or its value was unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrencySummary {
    /// Amount spent (signed as reported).
    pub spent: Option<Decimal>,
    /// Amount earned.
    pub earned: Option<Decimal>,
    /// Net change (earned plus spent).
    pub balance: Option<Decimal>,
    /// Net worth at the end of the range.
    pub net_worth: Option<Decimal>,
}

/// A basic summary, indexed by currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Metrics per currency code, ordered by code.
    currencies: BTreeMap<String, CurrencySummary>,
}

impl Summary {
    /// Builds a summary from the raw response body.
    ///
    /// Unknown metrics are ignored. A body that is not a JSON object yields
    /// an empty summary.
    #[must_use]
    pub fn from_value(body: &Value) -> Self {
        let mut currencies: BTreeMap<String, CurrencySummary> = BTreeMap::new();
        let Some(fields) = body.as_object() else {
            return Self::default();
        };
        for (key, entry) in fields {
            let Some((metric, code)) = key.rsplit_once(CURRENCY_INFIX) else {
                continue;
            };
            let Some(amount) = entry.get("monetary_value").and_then(parse_amount) else {
                tracing::debug!(key = %key, "summary field without a readable monetary_value");
                continue;
            };
            let slot = currencies.entry(code.to_owned()).or_default();
            match metric {
                "spent" => slot.spent = Some(amount),
                "earned" => slot.earned = Some(amount),
                "balance" => slot.balance = Some(amount),
                "net-worth" => slot.net_worth = Some(amount),
                _ => {}
            }
        }
        Self { currencies }
    }

    /// Metrics for the given currency code.
    #[inline]
    #[must_use]
    pub fn currency(&self, code: &str) -> Option<&CurrencySummary> {
        self.currencies.get(code)
    }

    /// First currency code, in alphabetical order, that has a `spent-in-`
    /// field.
    #[inline]
    #[must_use]
    pub fn detect_currency(&self) -> Option<&str> {
        self.currencies
            .iter()
            .find(|&(_, metrics)| metrics.spent.is_some())
            .map(|(code, _)| code.as_str())
    }
}

/// Reads a monetary value sent either as a JSON number or a string.
fn parse_amount(value: &Value) -> Option<Decimal> {
    <Decimal as Deserialize>::deserialize(value).ok()
}
