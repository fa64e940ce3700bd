//! Budgets reconciled against what was actually spent.

use rust_decimal::Decimal;
use serde::Deserialize as _;
use serde_json::Value;

use super::breakdown::{CategoryBreakdown, category_breakdown};
use super::pages::fetch_all;
use crate::client::FinanceApi;
use crate::error::{ReportError, Result};
use crate::models::{BudgetAttributes, BudgetId, BudgetLimitAttributes, BudgetLimitId, Resource};
use crate::period::ReportingPeriod;

/// Budget listing endpoint path.
pub(crate) const BUDGETS_PATH: &str = "/api/v1/budgets";

/// A budget and, after reconciliation, its actual spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    /// Upstream identifier.
    pub id: BudgetId,
    /// Display name.
    pub name: String,
    /// Planned amount for the period.
    pub budgeted: Decimal,
    /// Amount spent in the period, as a magnitude rounded to cents.
    /// `None` until reconciled.
    pub spent: Option<Decimal>,
    /// Budget limit covering the period, if the server has one.
    pub limit_id: Option<BudgetLimitId>,
}

impl Budget {
    /// Creates an unreconciled budget from its listing entry.
    #[inline]
    #[must_use]
    pub fn from_listing(entry: Resource<BudgetId, BudgetAttributes>) -> Self {
        Self {
            id: entry.id,
            name: entry.attributes.name,
            budgeted: entry.attributes.auto_budget_amount.unwrap_or_default(),
            spent: None,
            limit_id: None,
        }
    }

    /// Spent amount, zero if not reconciled.
    #[inline]
    #[must_use]
    pub fn spent_or_zero(&self) -> Decimal {
        self.spent.unwrap_or_default()
    }

    /// Returns `true` if more was spent than planned.
    #[inline]
    #[must_use]
    pub fn is_overspent(&self) -> bool {
        self.spent_or_zero() > self.budgeted
    }
}

/// A reconciled budget, with the category breakdown of its spending when
/// it went over plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetReport {
    /// The budget.
    pub budget: Budget,
    /// Category breakdown; `Some` exactly when the budget is overspent.
    pub overspend: Option<CategoryBreakdown>,
}

/// Outcome of a budget-limit lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LimitLookup {
    /// No usable limit for the period.
    Missing,
    /// Spend found on the given limit (signed as reported).
    Spent {
        /// Limit the spend was booked against.
        limit_id: BudgetLimitId,
        /// Amount spent in the selected currency.
        amount: Decimal,
    },
}

/// Fetches every budget and attaches what was spent in `period`.
///
/// Limits are looked up by each budget's own identifier. A budget the
/// server does not know, or whose limit response has no usable data,
/// reports zero spend. Budgets that went over plan get a category
/// breakdown.
///
/// # Errors
///
/// Fails on transport errors, on non-404 error statuses, and when the
/// budget listing itself is malformed.
#[tracing::instrument(skip_all)]
pub fn reconcile_budgets<A: FinanceApi + ?Sized>(
    api: &A,
    period: &ReportingPeriod,
    currency: Option<&str>,
) -> Result<Vec<BudgetReport>> {
    let listed: Vec<Resource<BudgetId, BudgetAttributes>> = fetch_all(api, BUDGETS_PATH, &[])?;
    tracing::info!(count = listed.len(), "fetched budget list");

    let mut reports = Vec::with_capacity(listed.len());
    for entry in listed {
        let mut budget = Budget::from_listing(entry);
        tracing::info!(budget = %budget.name, id = %budget.id, "processing budget");
        match lookup_limit(api, period, &budget.id, currency)? {
            LimitLookup::Spent { limit_id, amount } => {
                budget.spent = Some(amount.abs().round_dp(2));
                budget.limit_id = Some(limit_id);
            }
            LimitLookup::Missing => budget.spent = Some(Decimal::ZERO),
        }
        tracing::info!(
            budget = %budget.name,
            spent = %budget.spent_or_zero(),
            budgeted = %budget.budgeted,
            "reconciled budget"
        );

        let overspend = if budget.is_overspent() {
            Some(explain_overspend(api, period, &budget)?)
        } else {
            None
        };
        reports.push(BudgetReport { budget, overspend });
    }
    Ok(reports)
}

/// Requests the limits of one budget for the period.
fn lookup_limit<A: FinanceApi + ?Sized>(
    api: &A,
    period: &ReportingPeriod,
    id: &BudgetId,
    currency: Option<&str>,
) -> Result<LimitLookup> {
    let path = format!("{BUDGETS_PATH}/{id}/limits");
    match api.get_json(&path, &period.month_query()) {
        Ok(body) => Ok(read_limits(id, &body, currency)),
        Err(err) if err.is_not_found() => {
            tracing::warn!(id = %id, "budget not found, treating spent as 0");
            Ok(LimitLookup::Missing)
        }
        Err(err) => Err(err),
    }
}

/// Reads the spend from a limits response.
///
/// Anything without a non-empty `data` array counts as "not found",
/// whatever else the body says.
fn read_limits(id: &BudgetId, body: &Value, currency: Option<&str>) -> LimitLookup {
    let Some(first) = body
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
    else {
        tracing::warn!(id = %id, "no limit data for budget, treating spent as 0");
        return LimitLookup::Missing;
    };

    match Resource::<BudgetLimitId, BudgetLimitAttributes>::deserialize(first) {
        Ok(limit) => LimitLookup::Spent {
            amount: limit.attributes.spent_in(currency),
            limit_id: limit.id,
        },
        Err(err) => {
            tracing::warn!(id = %id, error = %err, "failed to parse budget limit, treating spent as 0");
            LimitLookup::Missing
        }
    }
}

/// Builds the breakdown for an overspent budget.
///
/// A budget without a known limit, or whose transaction listing is
/// malformed, gets an empty breakdown.
fn explain_overspend<A: FinanceApi + ?Sized>(
    api: &A,
    period: &ReportingPeriod,
    budget: &Budget,
) -> Result<CategoryBreakdown> {
    let Some(limit_id) = budget.limit_id.as_ref() else {
        tracing::warn!(budget = %budget.name, "overspent budget has no limit, skipping breakdown");
        return Ok(CategoryBreakdown::default());
    };
    match category_breakdown(api, period, &budget.id, limit_id) {
        Err(ReportError::DataShape(reason)) => {
            tracing::warn!(budget = %budget.name, reason = %reason, "unreadable transaction listing");
            Ok(CategoryBreakdown::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NaiveDate;
    use crate::report::testing::MockApi;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn period() -> ReportingPeriod {
        ReportingPeriod::previous_month(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()).unwrap()
    }

    fn listing(budgets: &[(&str, &str, &str)]) -> Value {
        let data: Vec<Value> = budgets
            .iter()
            .map(|(id, name, amount)| {
                json!({"id": id, "attributes": {"name": name, "auto_budget_amount": amount}})
            })
            .collect();
        json!({"data": data, "meta": {"pagination": {"total_pages": 1}}})
    }

    fn limits(limit_id: &str, spent: Value) -> Value {
        json!({"data": [{"id": limit_id, "attributes": {"amount": "0", "spent": spent}}]})
    }

    fn transactions(category: &str, amount: &str) -> Value {
        json!({
            "data": [{"id": "1", "attributes": {"transactions": [
                {"category_name": category, "amount": amount}
            ]}}],
            "meta": {"pagination": {"current_page": 1, "total_pages": 1}}
        })
    }

    #[test]
    fn not_found_budget_reports_zero() {
        let api = MockApi::new().with(BUDGETS_PATH, listing(&[("7", "Food", "300")]));

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports.len(), 1);
        let budget = &reports[0].budget;
        assert_eq!(budget.id, BudgetId::from("7"));
        assert_eq!(budget.budgeted, dec!(300));
        assert_eq!(budget.spent, Some(Decimal::ZERO));
        assert!(reports[0].overspend.is_none());
    }

    #[test]
    fn missing_budget_does_not_stop_the_next_one() {
        let api = MockApi::new()
            .with(
                BUDGETS_PATH,
                listing(&[("3", "Gone", "100"), ("9", "Fuel", "150")]),
            )
            .with(
                "/api/v1/budgets/9/limits",
                limits("40", json!([{"sum": "-99.994", "currency_code": "EUR"}])),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].budget.spent, Some(Decimal::ZERO));
        assert_eq!(reports[1].budget.spent, Some(dec!(99.99)));
        assert_eq!(reports[1].budget.limit_id, Some(BudgetLimitId::from("40")));
    }

    #[test]
    fn lookup_is_keyed_by_budget_id_not_position() {
        let api = MockApi::new()
            .with(
                BUDGETS_PATH,
                listing(&[("12", "Rent", "1000"), ("4", "Fun", "50")]),
            )
            .with(
                "/api/v1/budgets/12/limits",
                limits("1", json!([{"sum": "-1000", "currency_code": "EUR"}])),
            )
            .with(
                "/api/v1/budgets/4/limits",
                limits("2", json!([{"sum": "-20", "currency_code": "EUR"}])),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].budget.spent, Some(dec!(1000)));
        assert_eq!(reports[1].budget.spent, Some(dec!(20)));
        assert_eq!(api.call_count("/api/v1/budgets/1/limits"), 0);
    }

    #[test]
    fn empty_data_array_reports_zero() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "300")]))
            .with("/api/v1/budgets/7/limits", json!({"data": []}));

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].budget.spent, Some(Decimal::ZERO));
    }

    #[test]
    fn error_shaped_body_reports_zero() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "300")]))
            .with(
                "/api/v1/budgets/7/limits",
                json!({"error": {"code": "missing", "detail": "No such budget"}}),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].budget.spent, Some(Decimal::ZERO));
    }

    #[test]
    fn malformed_limit_reports_zero() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "300")]))
            .with(
                "/api/v1/budgets/7/limits",
                json!({"data": [{"attributes": {"spent": "lots"}}]}),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].budget.spent, Some(Decimal::ZERO));
        assert!(reports[0].budget.limit_id.is_none());
    }

    #[test]
    fn configured_currency_is_selected() {
        let spent = json!([
            {"sum": "-15", "currency_code": "USD"},
            {"sum": "-120.5", "currency_code": "EUR"}
        ]);
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "300")]))
            .with("/api/v1/budgets/7/limits", limits("1", spent));

        let eur = reconcile_budgets(&api, &period(), Some("EUR")).unwrap();
        let fallback = reconcile_budgets(&api, &period(), Some("GBP")).unwrap();
        let again = reconcile_budgets(&api, &period(), Some("GBP")).unwrap();
        assert_eq!(eur[0].budget.spent, Some(dec!(120.5)));
        assert_eq!(fallback[0].budget.spent, Some(dec!(15)));
        assert_eq!(fallback, again);
    }

    #[test]
    fn overspent_budget_gets_breakdown() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "200")]))
            .with(
                "/api/v1/budgets/7/limits",
                limits("31", json!([{"sum": "-250", "currency_code": "EUR"}])),
            )
            .with(
                "/api/v1/budgets/7/limits/31/transactions",
                transactions("Dining", "250"),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert!(reports[0].budget.is_overspent());
        let breakdown = reports[0].overspend.as_ref().unwrap();
        assert_eq!(breakdown.entries[0].category_name, "Dining");
        assert_eq!(api.call_count("/api/v1/budgets/7/limits/31/transactions"), 1);
    }

    #[test]
    fn on_track_budget_skips_breakdown() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "200")]))
            .with(
                "/api/v1/budgets/7/limits",
                limits("31", json!([{"sum": "-150", "currency_code": "EUR"}])),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert!(!reports[0].budget.is_overspent());
        assert!(reports[0].overspend.is_none());
        assert_eq!(api.call_count("/api/v1/budgets/7/limits/31/transactions"), 0);
    }

    #[test]
    fn unreadable_transactions_give_empty_breakdown() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "200")]))
            .with(
                "/api/v1/budgets/7/limits",
                limits("31", json!("-250")),
            )
            .with(
                "/api/v1/budgets/7/limits/31/transactions",
                json!({"message": "Unexpected"}),
            );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].overspend, Some(CategoryBreakdown::default()));
    }

    #[test]
    fn other_http_errors_abort() {
        let api = MockApi::new()
            .with(BUDGETS_PATH, listing(&[("7", "Food", "200")]))
            .with_status("/api/v1/budgets/7/limits", 500);

        let result = reconcile_budgets(&api, &period(), None);
        assert!(matches!(result, Err(ReportError::Api { status: 500, .. })));
    }

    #[test]
    fn null_auto_budget_amount_is_zero() {
        let api = MockApi::new().with(
            BUDGETS_PATH,
            json!({"data": [{"id": "1", "attributes": {"name": "Misc", "auto_budget_amount": null}}]}),
        );

        let reports = reconcile_budgets(&api, &period(), None).unwrap();
        assert_eq!(reports[0].budget.budgeted, Decimal::ZERO);
    }
}
