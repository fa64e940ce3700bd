//! Transaction groups as listed under a budget limit.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Attributes of a transaction group (a transaction and its splits).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionGroupAttributes {
    /// Individual splits.
    #[serde(default)]
    pub transactions: Vec<TransactionSplit>,
}

/// One split of a transaction group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionSplit {
    /// Category the split is filed under, if any.
    #[serde(default)]
    pub category_name: Option<String>,
    /// Split amount, positive for withdrawals.
    pub amount: Decimal,
    /// Currency of the amount.
    #[serde(default)]
    pub currency_code: Option<String>,
}
