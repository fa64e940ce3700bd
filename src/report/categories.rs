//! Per-category income and expense for the reporting period.

use rust_decimal::Decimal;
use serde_json::Value;

use super::pages::fetch_all;
use crate::client::FinanceApi;
use crate::error::Result;
use crate::models::{CategoryAttributes, CategoryId, CurrencySum, Document, Resource};
use crate::period::ReportingPeriod;

/// Category listing and detail endpoint path.
pub(crate) const CATEGORIES_PATH: &str = "/api/v1/categories";

/// Income and expense of one category over the reporting period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Upstream identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Amount spent, signed as reported (negative for spending).
    pub spent: Decimal,
    /// Amount earned.
    pub earned: Decimal,
    /// `earned + spent`, saturating at the representable range.
    pub total: Decimal,
}

impl Category {
    /// Creates a category record, deriving the total.
    #[inline]
    #[must_use]
    pub fn new(id: CategoryId, name: String, spent: Decimal, earned: Decimal) -> Self {
        Self {
            id,
            name,
            spent,
            earned,
            total: earned.saturating_add(spent),
        }
    }
}

/// Fetches every category and its spend/earn figures for `period`.
///
/// Output follows the order of the category listing. A category whose
/// detail response lacks `spent` or `earned` reports zero for that side;
/// an unreadable detail body reports zero for both.
///
/// # Errors
///
/// Fails if any request fails or the category listing itself is
/// malformed.
#[tracing::instrument(skip_all)]
pub fn aggregate_categories<A: FinanceApi + ?Sized>(
    api: &A,
    period: &ReportingPeriod,
    currency: Option<&str>,
) -> Result<Vec<Category>> {
    let listed: Vec<Resource<CategoryId, CategoryAttributes>> =
        fetch_all(api, CATEGORIES_PATH, &[])?;
    tracing::info!(count = listed.len(), "fetched category list");

    let query = period.month_query();
    let mut categories = Vec::with_capacity(listed.len());
    for entry in listed {
        let path = format!("{CATEGORIES_PATH}/{}", entry.id);
        let body = api.get_json(&path, &query)?;
        categories.push(from_detail(entry, body, currency));
    }
    tracing::info!(count = categories.len(), "aggregated categories");
    Ok(categories)
}

/// Builds a [`Category`] from its detail response.
fn from_detail(
    listed: Resource<CategoryId, CategoryAttributes>,
    body: Value,
    currency: Option<&str>,
) -> Category {
    match serde_json::from_value::<Document<Resource<CategoryId, CategoryAttributes>>>(body) {
        Ok(detail) => {
            let attributes = detail.data.attributes;
            let spent = CurrencySum::select_sum(attributes.spent.as_deref(), currency);
            let earned = CurrencySum::select_sum(attributes.earned.as_deref(), currency);
            tracing::debug!(category = %attributes.name, %spent, %earned, "category totals");
            Category::new(listed.id, attributes.name, spent, earned)
        }
        Err(err) => {
            tracing::warn!(
                category = %listed.attributes.name,
                error = %err,
                "unreadable category detail, reporting zero"
            );
            Category::new(listed.id, listed.attributes.name, Decimal::ZERO, Decimal::ZERO)
        }
    }
}
