//! Where the money went for an overspent budget.

use rust_decimal::Decimal;

use super::budgets::BUDGETS_PATH;
use super::pages::fetch_pages;
use crate::client::FinanceApi;
use crate::error::Result;
use crate::models::{BudgetId, BudgetLimitId, Resource, TransactionGroupAttributes};
use crate::period::ReportingPeriod;

/// Page size requested from the transaction listing.
const TRANSACTIONS_PER_PAGE: u32 = 50;

/// Label for transactions without a category.
const UNCATEGORIZED: &str = "(no category)";

/// Amount spent in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpend {
    /// Category name.
    pub category_name: String,
    /// Summed amount.
    pub amount: Decimal,
}

/// Spending per category, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBreakdown {
    /// Entries sorted by descending amount; equal amounts keep the order
    /// in which their category was first seen.
    pub entries: Vec<CategorySpend>,
}

impl CategoryBreakdown {
    /// Groups line items by category name, summing their amounts.
    #[must_use]
    pub fn from_entries<I: IntoIterator<Item = CategorySpend>>(items: I) -> Self {
        let mut entries: Vec<CategorySpend> = Vec::new();
        for item in items {
            match entries
                .iter_mut()
                .find(|entry| entry.category_name == item.category_name)
            {
                Some(entry) => entry.amount = entry.amount.saturating_add(item.amount),
                None => entries.push(item),
            }
        }
        entries.sort_by(|left, right| right.amount.cmp(&left.amount));
        Self { entries }
    }

    /// Returns `true` if no transactions were found.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lists the transactions booked against a budget limit in `period` and
/// ranks their categories by amount.
///
/// Follows the listing's pagination, bounded as described in
/// [`fetch_pages`].
///
/// # Errors
///
/// Fails if a request fails or a page is not a transaction listing.
#[tracing::instrument(skip_all, fields(budget = %budget_id, limit = %limit_id))]
pub fn category_breakdown<A: FinanceApi + ?Sized>(
    api: &A,
    period: &ReportingPeriod,
    budget_id: &BudgetId,
    limit_id: &BudgetLimitId,
) -> Result<CategoryBreakdown> {
    let path = format!("{BUDGETS_PATH}/{budget_id}/limits/{limit_id}/transactions");
    let [start, end] = period.month_query();
    let query = [("limit", TRANSACTIONS_PER_PAGE.to_string()), start, end];

    let mut items = Vec::new();
    let pages = fetch_pages(
        api,
        &path,
        &query,
        |groups: Vec<Resource<String, TransactionGroupAttributes>>| {
            for group in groups {
                items.extend(group.attributes.transactions.into_iter().map(|split| {
                    CategorySpend {
                        category_name: split
                            .category_name
                            .unwrap_or_else(|| UNCATEGORIZED.to_owned()),
                        amount: split.amount.round_dp(2),
                    }
                }));
            }
        },
    )?;

    let breakdown = CategoryBreakdown::from_entries(items);
    tracing::debug!(pages, categories = breakdown.entries.len(), "built category breakdown");
    Ok(breakdown)
}
