//! The aggregation and reconciliation engine.
//!
//! [`build_report`] runs every query for one [`ReportingPeriod`] in order
//! (categories, budgets with their overspend breakdowns, then summary
//! metrics) and returns a [`Report`] ready for rendering.

mod breakdown;
mod budgets;
mod categories;
mod metrics;
mod pages;
#[cfg(test)]
mod testing;

pub use breakdown::{CategoryBreakdown, CategorySpend, category_breakdown};
pub use budgets::{Budget, BudgetReport, reconcile_budgets};
pub use categories::{Category, aggregate_categories};
pub use metrics::{
    DerivedMetrics, Metrics, MonthMetrics, YearMetrics, calculate_metrics, metrics_from_summaries,
};

use rust_decimal::Decimal;

use crate::client::FinanceApi;
use crate::error::Result;
use crate::period::ReportingPeriod;

/// Presentation options that also steer currency selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Reporting currency code, e.g. `EUR`. Auto-detected when `None`.
    pub currency: Option<String>,
    /// Symbol printed before amounts, e.g. `€`.
    pub currency_symbol: Option<String>,
}

/// Everything a rendered report shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The reported month.
    pub period: ReportingPeriod,
    /// Options the report was built with.
    pub options: ReportOptions,
    /// Category totals, in listing order.
    pub categories: Vec<Category>,
    /// Reconciled budgets, in listing order.
    pub budgets: Vec<BudgetReport>,
    /// Month, year-to-date and savings figures.
    pub metrics: Metrics,
    /// Data problems the report worked around.
    pub warnings: Vec<String>,
}

impl Report {
    /// Sum of every budget's planned amount, each rounded to a whole
    /// amount first.
    #[must_use]
    pub fn total_budgeted(&self) -> Decimal {
        self.budgets
            .iter()
            .map(|entry| entry.budget.budgeted.round())
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Symbol to print before amounts; empty when none is configured.
    #[inline]
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        self.options.currency_symbol.as_deref().unwrap_or_default()
    }
}

/// Queries the API and assembles the report for `period`.
///
/// # Errors
///
/// Fails on the first request that fails at transport level or with an
/// unexpected status, and when a category or budget listing is malformed.
/// Problems local to one category, budget or summary are recovered from.
/// Zeroed summary figures are listed in [`Report::warnings`].
#[tracing::instrument(skip_all, fields(month = %period.start()))]
pub fn build_report<A: FinanceApi + ?Sized>(
    api: &A,
    period: ReportingPeriod,
    options: ReportOptions,
) -> Result<Report> {
    let currency = options.currency.as_deref();
    let categories = aggregate_categories(api, &period, currency)?;
    let budgets = reconcile_budgets(api, &period, currency)?;
    let metrics = calculate_metrics(api, &period, currency)?;

    let warnings: Vec<String> = metrics
        .degraded
        .iter()
        .map(|reason| format!("summary figures reported as 0: {reason}"))
        .collect();
    tracing::info!(
        categories = categories.len(),
        budgets = budgets.len(),
        warnings = warnings.len(),
        "report assembled"
    );

    Ok(Report {
        period,
        options,
        categories,
        budgets,
        metrics,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NaiveDate;
    use crate::report::testing::MockApi;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn period() -> ReportingPeriod {
        ReportingPeriod::previous_month(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()).unwrap()
    }

    fn one_page(data: Value) -> Value {
        json!({"data": data, "meta": {"pagination": {"current_page": 1, "total_pages": 1}}})
    }

    fn api(month_summary: Value) -> MockApi {
        MockApi::new()
            .with(
                "/api/v1/categories",
                one_page(json!([{"id": "1", "attributes": {"name": "Groceries"}}])),
            )
            .with(
                "/api/v1/categories/1",
                json!({"data": {"id": "1", "attributes": {
                    "name": "Groceries",
                    "spent": [{"sum": "-120", "currency_code": "EUR"}]
                }}}),
            )
            .with(
                "/api/v1/budgets",
                one_page(json!([
                    {"id": "7", "attributes": {"name": "Food", "auto_budget_amount": "200.4"}},
                    {"id": "8", "attributes": {"name": "Fuel", "auto_budget_amount": "100.6"}}
                ])),
            )
            .with(
                "/api/v1/budgets/8/limits",
                json!({"data": [{"id": "3", "attributes": {"spent": [{"sum": "-40", "currency_code": "EUR"}]}}]}),
            )
            .with("/api/v1/summary/basic", month_summary)
    }

    fn summary() -> Value {
        json!({
            "spent-in-EUR": {"monetary_value": "-1000"},
            "earned-in-EUR": {"monetary_value": "1500"},
            "balance-in-EUR": {"monetary_value": "500"},
            "net-worth-in-EUR": {"monetary_value": "9000"}
        })
    }

    #[test]
    fn assembles_every_section() {
        let api = api(summary());
        let options = ReportOptions {
            currency: None,
            currency_symbol: Some("€".to_owned()),
        };

        let report = build_report(&api, period(), options).unwrap();
        assert_eq!(report.categories[0].total, dec!(-120));
        assert_eq!(report.budgets.len(), 2);
        assert_eq!(report.budgets[0].budget.spent, Some(Decimal::ZERO));
        assert_eq!(report.budgets[1].budget.spent, Some(dec!(40)));
        assert_eq!(report.total_budgeted(), dec!(301));
        assert_eq!(report.metrics.derived.saved_pct, dec!(33));
        assert_eq!(report.currency_symbol(), "€");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_summary_currency_still_completes() {
        let api = api(json!({"balance-in-EUR": {"monetary_value": "5"}}));

        let report = build_report(&api, period(), ReportOptions::default()).unwrap();
        assert_eq!(report.metrics.month, MonthMetrics::default());
        assert_eq!(report.metrics.derived.saved_pct, Decimal::ZERO);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.budgets.len(), 2);
        assert_eq!(report.currency_symbol(), "");
    }

    #[test]
    fn unreadable_limit_counts_as_nothing_spent() {
        let api = api(summary()).with(
            "/api/v1/budgets/7/limits",
            json!({"data": [{"attributes": {"spent": "-300"}}]}),
        );

        let report = build_report(&api, period(), ReportOptions::default()).unwrap();
        assert_eq!(report.budgets[0].budget.spent, Some(Decimal::ZERO));
        assert!(report.warnings.is_empty());
    }
}
