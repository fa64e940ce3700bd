//! Budget and budget-limit resources.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::CurrencySum;

/// Attributes of a budget from the budget listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BudgetAttributes {
    /// Display name.
    pub name: String,
    /// Whether the budget is active.
    #[serde(default)]
    pub active: Option<bool>,
    /// Amount planned per period. Null for budgets without auto-budgeting.
    #[serde(default)]
    pub auto_budget_amount: Option<Decimal>,
}

/// Attributes of a budget limit: the amount assigned to a budget for one
/// period, and what was spent against it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BudgetLimitAttributes {
    /// Planned amount for the period.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Currency of the limit.
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Amount spent in the period.
    #[serde(default)]
    pub spent: Option<LimitSpent>,
}

/// The `spent` field of a budget limit.
///
/// Older servers send one entry per currency; newer ones send a single
/// amount in the limit's own currency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LimitSpent {
    /// One entry per currency.
    PerCurrency(Vec<CurrencySum>),
    /// A single amount in the limit currency.
    Single(Decimal),
}

impl BudgetLimitAttributes {
    /// Signed amount spent against this limit in the preferred currency.
    ///
    /// Falls back to the first listed currency, and to zero when nothing
    /// was spent.
    #[inline]
    #[must_use]
    pub fn spent_in(&self, preferred: Option<&str>) -> Decimal {
        match self.spent.as_ref() {
            Some(LimitSpent::PerCurrency(entries)) => {
                CurrencySum::select_sum(Some(entries), preferred)
            }
            Some(LimitSpent::Single(sum)) => *sum,
            None => Decimal::ZERO,
        }
    }
}
