//! Turns a [`Report`] into an email subject, an HTML body and a plain
//! text body.
//!
//! Rendering is pure: the figures are formatted once into a view, which
//! feeds both the HTML template and the text tables.

use core::fmt;

use askama::Template;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::report::{Budget, BudgetReport, Report};

/// Subject line of every report email.
pub const SUBJECT: &str = "Firefly III: Monthly report";

/// Typographic minus used for negative amounts.
const MINUS: &str = "\u{2212}";

/// A report ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Email subject.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain text body with the same content.
    pub text: String,
}

/// Renders `report` into its email form.
///
/// # Errors
///
/// Returns [`crate::error::ReportError::Template`] if the HTML template
/// fails to render.
#[tracing::instrument(skip_all)]
pub fn render(report: &Report) -> Result<RenderedReport> {
    let view = ReportView::new(report);
    let html = view.render()?;
    let text = PlainText(&view).to_string();
    tracing::debug!(html_len = html.len(), text_len = text.len(), "rendered report");
    Ok(RenderedReport {
        subject: SUBJECT.to_owned(),
        html,
        text,
    })
}

/// Share of a budget used, in whole percent.
///
/// Both amounts are rounded to whole units first. A zero budget reads as
/// 0% while on track and 100% once overspent.
#[must_use]
pub fn budget_percentage(budget: &Budget) -> Decimal {
    let spent = budget.spent_or_zero().round();
    let planned = budget.budgeted.round();
    match spent.checked_div(planned) {
        Some(ratio) => ratio.saturating_mul(Decimal::ONE_HUNDRED).round(),
        _ if budget.is_overspent() => Decimal::ONE_HUNDRED,
        _ => Decimal::ZERO,
    }
}

/// Formatted figures shared by both renderings.
#[derive(Debug, Template)]
#[template(path = "report.html")]
struct ReportView {
    /// Month name.
    month: String,
    /// Reported year.
    year: i32,
    /// Currency symbol, possibly empty.
    symbol: String,
    /// One card per budget.
    budgets: Vec<BudgetCard>,
    /// Month review card.
    review: MonthReview,
    /// Month and year-to-date figures.
    overview: Vec<Row>,
    /// Category totals.
    categories: Vec<Row>,
    /// Data problems worked around.
    warnings: Vec<String>,
}

impl ReportView {
    /// Formats every figure of `report`.
    fn new(report: &Report) -> Self {
        let metrics = &report.metrics;
        let overview = vec![
            Row::new("Spent this month:", whole(metrics.month.spent)),
            Row::new("Earned this month:", whole(metrics.month.earned)),
            Row::new("Net change this month:", whole(metrics.month.net_change)),
            Row::new("Spent so far this year:", whole(metrics.year.spent)),
            Row::new("Earned so far this year:", whole(metrics.year.earned)),
            Row::new("Net change so far this year:", whole(metrics.year.net_change)),
            Row::new("Current net worth:", whole(metrics.year.net_worth)),
        ];
        let spend_pct = metrics.derived.spend_pct;
        let review = MonthReview {
            spend_pct: whole(spend_pct),
            bar_width: bar_width(spend_pct),
            earned: whole(metrics.month.earned),
            total_budgeted: whole(report.total_budgeted()),
            spent: whole(metrics.month.spent),
            saved: whole(metrics.derived.saved_amount),
            saved_pct: whole(metrics.derived.saved_pct),
        };
        Self {
            month: report.period.month_name(),
            year: report.period.year(),
            symbol: report.currency_symbol().to_owned(),
            budgets: report.budgets.iter().map(BudgetCard::new).collect(),
            review,
            overview,
            categories: report
                .categories
                .iter()
                .map(|category| Row::new(&category.name, whole(category.total)))
                .collect(),
            warnings: report.warnings.clone(),
        }
    }
}

/// One budget's card.
#[derive(Debug)]
struct BudgetCard {
    /// Budget name.
    name: String,
    /// Whether more was spent than planned.
    overspent: bool,
    /// Share of the budget used.
    percentage: String,
    /// CSS width of the progress bar, 0 to 100.
    bar_width: String,
    /// Planned amount.
    planned: String,
    /// Spent amount.
    paid: String,
    /// Planned minus spent.
    saved: String,
    /// Where the money went, for overspent budgets.
    breakdown: Vec<BreakdownLine>,
}

impl BudgetCard {
    /// Formats one reconciled budget.
    fn new(entry: &BudgetReport) -> Self {
        let budget = &entry.budget;
        let percentage = budget_percentage(budget);
        let planned = budget.budgeted.round();
        let paid = budget.spent_or_zero().round();
        let breakdown = entry
            .overspend
            .iter()
            .flat_map(|breakdown| breakdown.entries.iter())
            .map(|spend| BreakdownLine {
                category: spend.category_name.clone(),
                amount: cents(spend.amount),
            })
            .collect();
        Self {
            name: budget.name.clone(),
            overspent: budget.is_overspent(),
            percentage: whole(percentage),
            bar_width: bar_width(percentage),
            planned: whole(planned),
            paid: whole(paid),
            saved: whole(planned.saturating_sub(paid)),
            breakdown,
        }
    }
}

/// One category of an overspend breakdown.
#[derive(Debug)]
struct BreakdownLine {
    /// Category name.
    category: String,
    /// Amount with two decimals.
    amount: String,
}

/// Month review card.
#[derive(Debug)]
struct MonthReview {
    /// Share of earnings spent.
    spend_pct: String,
    /// CSS width of the progress bar, 0 to 100.
    bar_width: String,
    /// Earned this month.
    earned: String,
    /// Sum of all budgets.
    total_budgeted: String,
    /// Spent this month.
    spent: String,
    /// Saved this month.
    saved: String,
    /// Share of earnings saved.
    saved_pct: String,
}

/// A label and a formatted amount.
#[derive(Debug)]
struct Row {
    /// Left column.
    label: String,
    /// Right column.
    value: String,
}

impl Row {
    /// Creates a row.
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_owned(),
            value,
        }
    }
}

/// Plain text rendering of a [`ReportView`].
struct PlainText<'view>(&'view ReportView);

impl fmt::Display for PlainText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        let symbol = view.symbol.as_str();
        writeln!(f, "Firefly III monthly review for {} {}", view.month, view.year)?;

        if !view.budgets.is_empty() {
            writeln!(f)?;
            writeln!(f, "Budgets")?;
            let mut table = Table::new();
            _ = table.load_preset(UTF8_FULL);
            _ = table.set_header(vec!["Budget", "Planned", "Paid", "Used", "Status"]);
            for card in &view.budgets {
                let status = if card.overspent { "overspent" } else { "on track" };
                _ = table.add_row(vec![
                    Cell::new(&card.name),
                    amount_cell(symbol, &card.planned),
                    amount_cell(symbol, &card.paid),
                    Cell::new(format!("{}%", card.percentage)).set_alignment(CellAlignment::Right),
                    Cell::new(status),
                ]);
            }
            writeln!(f, "{table}")?;

            for card in view.budgets.iter().filter(|card| card.overspent) {
                writeln!(f)?;
                writeln!(f, "Overspent in {}, by category:", card.name)?;
                let mut breakdown = Table::new();
                _ = breakdown.load_preset(UTF8_FULL);
                _ = breakdown.set_header(vec!["Category", "Amount"]);
                for line in &card.breakdown {
                    _ = breakdown.add_row(vec![
                        Cell::new(&line.category),
                        amount_cell(symbol, &line.amount),
                    ]);
                }
                writeln!(f, "{breakdown}")?;
            }
        }

        let review = &view.review;
        writeln!(f)?;
        writeln!(f, "{} review", view.month)?;
        let mut table = Table::new();
        _ = table.load_preset(UTF8_FULL);
        _ = table.add_row(vec![Cell::new("Spent share of earnings"), percent_cell(&review.spend_pct)]);
        _ = table.add_row(vec![Cell::new("Earned"), amount_cell(symbol, &review.earned)]);
        _ = table.add_row(vec![
            Cell::new("Total budgeted"),
            amount_cell(symbol, &review.total_budgeted),
        ]);
        _ = table.add_row(vec![Cell::new("Paid"), amount_cell(symbol, &review.spent)]);
        _ = table.add_row(vec![Cell::new("Saved"), amount_cell(symbol, &review.saved)]);
        _ = table.add_row(vec![Cell::new("Saved share of earnings"), percent_cell(&review.saved_pct)]);
        writeln!(f, "{table}")?;

        writeln!(f)?;
        writeln!(f, "Overview")?;
        writeln!(f, "{}", rows_table(None, &view.overview))?;

        writeln!(f)?;
        writeln!(f, "Categories")?;
        writeln!(f, "{}", rows_table(Some(["Category", "Total"]), &view.categories))?;

        if !view.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Some figures could not be read:")?;
            for warning in &view.warnings {
                writeln!(f, "- {warning}")?;
            }
        }
        Ok(())
    }
}

/// Two-column table of labelled amounts.
fn rows_table(header: Option<[&str; 2]>, rows: &[Row]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    if let Some(header) = header {
        _ = table.set_header(header.to_vec());
    }
    for row in rows {
        _ = table.add_row(vec![
            Cell::new(&row.label),
            Cell::new(&row.value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Right-aligned amount with the currency symbol.
fn amount_cell(symbol: &str, amount: &str) -> Cell {
    Cell::new(format!("{symbol}{amount}")).set_alignment(CellAlignment::Right)
}

/// Right-aligned percentage.
fn percent_cell(value: &str) -> Cell {
    Cell::new(format!("{value}%")).set_alignment(CellAlignment::Right)
}

/// Whole amount, half to even, with a typographic minus.
fn whole(amount: Decimal) -> String {
    typographic(&normalize(amount.round()).to_string())
}

/// Amount with two decimals and a typographic minus.
fn cents(amount: Decimal) -> String {
    typographic(&format!("{:.2}", normalize(amount)))
}

/// Progress bar width, clamped to 0..=100.
fn bar_width(percentage: Decimal) -> String {
    percentage
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .round()
        .to_string()
}

/// Drops the sign of a negative zero.
fn normalize(amount: Decimal) -> Decimal {
    if amount.is_zero() { Decimal::ZERO } else { amount }
}

/// Replaces ASCII hyphen-minus with U+2212.
fn typographic(text: &str) -> String {
    text.replace('-', MINUS)
}
