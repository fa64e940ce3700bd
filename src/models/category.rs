//! Category resource.

use serde::Deserialize;

use super::CurrencySum;

/// Attributes of a category.
///
/// The listing endpoint carries only the name; the detail endpoint, when
/// queried with a date range, adds per-currency `spent` and `earned`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryAttributes {
    /// Display name.
    pub name: String,
    /// Amounts spent in the requested range, one entry per currency.
    #[serde(default)]
    pub spent: Option<Vec<CurrencySum>>,
    /// Amounts earned in the requested range, one entry per currency.
    #[serde(default)]
    pub earned: Option<Vec<CurrencySum>>,
}
