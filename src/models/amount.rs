//! Currency-tagged amounts.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An amount in one currency, as found in `spent`/`earned` arrays.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrencySum {
    /// Signed amount. Firefly III reports spending as negative.
    pub sum: Decimal,
    /// ISO currency code.
    #[serde(default)]
    pub currency_code: Option<String>,
}

impl CurrencySum {
    /// Picks the entry to report from a multi-currency list.
    ///
    /// The entry whose currency matches `preferred` wins; without a
    /// preference or a match, the first entry is used.
    #[inline]
    #[must_use]
    pub fn select<'list>(entries: &'list [Self], preferred: Option<&str>) -> Option<&'list Self> {
        preferred
            .and_then(|code| {
                entries
                    .iter()
                    .find(|entry| entry.currency_code.as_deref() == Some(code))
            })
            .or_else(|| entries.first())
    }

    /// Sum of the selected entry, or zero when the list is absent or empty.
    #[inline]
    #[must_use]
    pub fn select_sum(entries: Option<&[Self]>, preferred: Option<&str>) -> Decimal {
        entries
            .and_then(|list| Self::select(list, preferred))
            .map_or(Decimal::ZERO, |entry| entry.sum)
    }
}
