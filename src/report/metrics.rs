//! Month and year-to-date figures from the basic summary.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::client::FinanceApi;
use crate::error::Result;
use crate::models::{CurrencySummary, Summary};
use crate::period::ReportingPeriod;

/// Basic summary endpoint path.
pub(crate) const SUMMARY_PATH: &str = "/api/v1/summary/basic";

/// Figures for the reported month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthMetrics {
    /// Amount spent, as a magnitude.
    pub spent: Decimal,
    /// Amount earned.
    pub earned: Decimal,
    /// Net change over the month.
    pub net_change: Decimal,
}

/// Figures from January 1st to the end of the reported month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearMetrics {
    /// Amount spent, as a magnitude.
    pub spent: Decimal,
    /// Amount earned.
    pub earned: Decimal,
    /// Net change over the year so far.
    pub net_change: Decimal,
    /// Net worth at the end of the month.
    pub net_worth: Decimal,
}

/// Savings derived from the month figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedMetrics {
    /// `earned - spent`, rounded to a whole amount.
    pub saved_amount: Decimal,
    /// Share of earnings saved, in whole percent. Zero when nothing was
    /// earned.
    pub saved_pct: Decimal,
    /// `100 - saved_pct`.
    pub spend_pct: Decimal,
}

impl DerivedMetrics {
    /// Derives savings from the month figures.
    ///
    /// Rounding is half to even. Returns `None` when a figure falls
    /// outside the range a [`Decimal`] can hold.
    #[must_use]
    pub fn from_month(month: &MonthMetrics) -> Option<Self> {
        let saved_amount = month.earned.checked_sub(month.spent)?.round();
        let saved_pct = if month.earned.is_zero() {
            Decimal::ZERO
        } else {
            saved_amount
                .checked_div(month.earned)?
                .checked_mul(Decimal::ONE_HUNDRED)?
                .round()
        };
        Some(Self {
            saved_amount,
            saved_pct,
            spend_pct: Decimal::ONE_HUNDRED.checked_sub(saved_pct)?,
        })
    }
}

/// All summary figures of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Currency the figures are in, if one could be resolved.
    pub currency: Option<String>,
    /// Month figures.
    pub month: MonthMetrics,
    /// Year-to-date figures.
    pub year: YearMetrics,
    /// Savings.
    pub derived: DerivedMetrics,
    /// Why the figures were zeroed, when they were.
    pub degraded: Option<String>,
}

impl Metrics {
    /// All-zero figures, recording why.
    fn zeroed(currency: Option<String>, reason: String) -> Self {
        tracing::warn!(reason = %reason, "summary unusable, reporting zero metrics");
        Self {
            currency,
            degraded: Some(reason),
            ..Self::default()
        }
    }
}

/// Queries the month and year-to-date summaries and derives the report
/// figures.
///
/// `configured` wins over auto-detection; otherwise the alphabetically
/// first currency with a `spent` figure in the month summary is used for
/// both summaries. Missing fields give all-zero figures instead of an
/// error.
///
/// # Errors
///
/// Fails only if a summary request fails.
#[tracing::instrument(skip_all)]
pub fn calculate_metrics<A: FinanceApi + ?Sized>(
    api: &A,
    period: &ReportingPeriod,
    configured: Option<&str>,
) -> Result<Metrics> {
    let month = api.get_json(SUMMARY_PATH, &period.month_query())?;
    let year = api.get_json(SUMMARY_PATH, &period.year_to_date_query())?;
    Ok(metrics_from_summaries(&month, &year, configured))
}

/// Derives the report figures from raw month and year summary bodies.
#[must_use]
pub fn metrics_from_summaries(
    month_body: &Value,
    year_body: &Value,
    configured: Option<&str>,
) -> Metrics {
    let month = Summary::from_value(month_body);
    let year = Summary::from_value(year_body);

    let Some(code) = configured
        .map(str::to_owned)
        .or_else(|| month.detect_currency().map(str::to_owned))
    else {
        return Metrics::zeroed(None, "no currency found in the month summary".to_owned());
    };
    tracing::info!(currency = %code, "using currency for summary metrics");

    let (Some(month_fields), Some(year_fields)) = (month.currency(&code), year.currency(&code))
    else {
        let reason = format!("summary has no figures in {code}");
        return Metrics::zeroed(Some(code), reason);
    };
    let (Some(month_metrics), Some(year_metrics)) = (read_month(month_fields), read_year(year_fields))
    else {
        let reason = format!("summary in {code} is missing spent, earned, balance or net worth");
        return Metrics::zeroed(Some(code), reason);
    };
    match DerivedMetrics::from_month(&month_metrics) {
        Some(derived) => Metrics {
            derived,
            currency: Some(code),
            month: month_metrics,
            year: year_metrics,
            degraded: None,
        },
        None => {
            let reason = format!("savings in {code} are out of range");
            Metrics::zeroed(Some(code), reason)
        }
    }
}

/// Month figures, if every field is present.
fn read_month(fields: &CurrencySummary) -> Option<MonthMetrics> {
    Some(MonthMetrics {
        spent: fields.spent?.abs(),
        earned: fields.earned?,
        net_change: fields.balance?,
    })
}

/// Year figures, if every field is present.
fn read_year(fields: &CurrencySummary) -> Option<YearMetrics> {
    Some(YearMetrics {
        spent: fields.spent?.abs(),
        earned: fields.earned?,
        net_change: fields.balance?,
        net_worth: fields.net_worth?,
    })
}
