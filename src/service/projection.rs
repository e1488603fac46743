use crate::models::{
    CashflowHistory, CashflowProjection, ExpenseRecord, MonthlyPoint, ProjectionPoint, Section,
};
use crate::service::aggregation::{mean, month_label, round2};
use crate::service::alerts::projection_alerts;
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

/// Months projected when the caller does not ask for a horizon
pub const DEFAULT_HORIZON: u32 = 6;

/// Degree-1 least-squares fit of a series against its position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFit {
    pub mean: f64,
    pub slope: f64,
    pub len: usize,
}

impl TrendFit {
    /// Value of the fitted line `step` positions after the last observation.
    ///
    /// The line passes through (centre, mean) with centre = (len - 1) / 2.
    pub fn project(&self, step: u32) -> f64 {
        let centre = (self.len as f64 - 1.0) / 2.0;
        self.mean + self.slope * (centre + f64::from(step))
    }
}

/// Fit `values[i]` against `i`. A single value has a flat trend.
pub fn fit_trend(values: &[f64]) -> Option<TrendFit> {
    let mean_value = mean(values)?;
    let centre = (values.len() as f64 - 1.0) / 2.0;

    let (covariance, variance) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(cov, var), (i, value)| {
            let dx = i as f64 - centre;
            (cov + dx * (value - mean_value), var + dx * dx)
        });

    let slope = if variance == 0.0 { 0.0 } else { covariance / variance };

    Some(TrendFit {
        mean: mean_value,
        slope,
        len: values.len(),
    })
}

/// Ascending monthly series, duplicate months merged
pub fn monthly_series(points: &[MonthlyPoint]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in points {
        *months.entry(point.month).or_insert(0.0) += point.total;
    }
    months
        .into_iter()
        .map(|(month, total)| MonthlyPoint { month, total })
        .collect()
}

/// Expense categories summed per month
pub fn expense_series(expenses: &[ExpenseRecord]) -> Vec<MonthlyPoint> {
    let points: Vec<MonthlyPoint> = expenses
        .iter()
        .map(|e| MonthlyPoint {
            month: e.month,
            total: e.amount,
        })
        .collect();
    monthly_series(&points)
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// True when consecutive points are more than one calendar month apart
pub fn has_calendar_gaps(series: &[MonthlyPoint]) -> bool {
    series
        .windows(2)
        .any(|pair| months_between(pair[0].month, pair[1].month) > 1)
}

/// `YYYY-MM` label of the month `step` months after `as_of`
pub fn future_month_label(as_of: NaiveDate, step: u32) -> String {
    as_of
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(step)))
        .map(month_label)
        .unwrap_or_else(|| format!("+{} months", step))
}

/// Project revenue, expense and result for the next `horizon` months
///
/// Both series are fitted by position, not by calendar month; gaps are
/// reported but not corrected.
pub fn project_cash_flow(
    revenue: &[MonthlyPoint],
    expenses: &[ExpenseRecord],
    horizon: u32,
    as_of: NaiveDate,
) -> Section<CashflowProjection> {
    let revenue = monthly_series(revenue);
    let expense = expense_series(expenses);

    let revenue_values: Vec<f64> = revenue.iter().map(|p| p.total).collect();
    let expense_values: Vec<f64> = expense.iter().map(|p| p.total).collect();

    let (Some(revenue_fit), Some(expense_fit)) =
        (fit_trend(&revenue_values), fit_trend(&expense_values))
    else {
        return Section::NoData(
            "insufficient revenue or expense history for projection".to_string(),
        );
    };

    let revenue_has_gaps = has_calendar_gaps(&revenue);
    let expense_has_gaps = has_calendar_gaps(&expense);
    if revenue_has_gaps || expense_has_gaps {
        tracing::warn!(
            "monthly history has gaps (revenue: {}, expense: {}); trend is fitted by position",
            revenue_has_gaps,
            expense_has_gaps
        );
    }

    let projections: Vec<ProjectionPoint> = (1..=horizon)
        .map(|step| {
            let projected_revenue = revenue_fit.project(step);
            let projected_expense = expense_fit.project(step);
            ProjectionPoint {
                month: future_month_label(as_of, step),
                projected_revenue: round2(projected_revenue),
                projected_expense: round2(projected_expense),
                projected_result: round2(projected_revenue - projected_expense),
            }
        })
        .collect();

    tracing::debug!(
        "projected {} months from {} revenue and {} expense points",
        projections.len(),
        revenue_fit.len,
        expense_fit.len
    );

    let alerts = projection_alerts(&projections);

    Section::Ready(CashflowProjection {
        history: CashflowHistory {
            mean_monthly_revenue: round2(revenue_fit.mean),
            mean_monthly_expense: round2(expense_fit.mean),
            monthly_revenue_growth: round2(revenue_fit.slope),
            monthly_expense_growth: round2(expense_fit.slope),
            revenue_months: revenue_fit.len,
            expense_months: expense_fit.len,
            revenue_has_gaps,
            expense_has_gaps,
        },
        projections,
        alerts,
    })
}
