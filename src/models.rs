//! Data models for Firefly III API resources.
//!
//! Only the fields the report reads are modelled; everything else in the
//! responses is ignored during deserialization.

mod about;
mod amount;
mod budget;
mod category;
mod envelope;
mod ids;
mod summary;
mod transaction;

pub use about::About;
pub use amount::CurrencySum;
pub use budget::{BudgetAttributes, BudgetLimitAttributes, LimitSpent};
pub use category::CategoryAttributes;
pub use chrono::NaiveDate;
pub use envelope::{Document, Meta, Page, Pagination, Resource};
pub use ids::{BudgetId, BudgetLimitId, CategoryId};
pub use summary::{CurrencySummary, Summary};
pub use transaction::{TransactionGroupAttributes, TransactionSplit};
