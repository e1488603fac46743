use crate::models::Alert;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A report section: computed data, an explicit "no data" marker, or a failure.
///
/// Serialized as `{"status": "ready" | "no_data" | "failed", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    NoData(String),
    Failed(String),
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Explanation for a section that carries no data.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Section::Ready(_) => None,
            Section::NoData(reason) | Section::Failed(reason) => Some(reason),
        }
    }
}

/// Net revenue, count and ticket for one origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginRollup {
    pub origin: String,
    pub net_revenue: f64,
    pub claim_count: u64,
    pub mean_ticket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayerRollup {
    pub payer: String,
    pub net_revenue: f64,
    pub mean_denial_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRollup {
    pub month: String,
    pub net_revenue: f64,
    pub denied: f64,
}

/// Entry of a top-N ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedValue {
    pub name: String,
    pub value: f64,
}

/// Revenue by origin over a lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueByOrigin {
    pub period: String,
    pub lookback_months: u32,
    pub gross_revenue_total: f64,
    pub net_revenue_total: f64,
    pub denied_total: f64,
    pub overall_denial_rate: Option<f64>,
    /// Rows whose net amount exceeds the gross amount (data-quality signal)
    pub rows_with_net_above_gross: usize,
    pub by_origin: Vec<OriginRollup>,
    pub by_payer: Vec<PayerRollup>,
    pub monthly_trend: Vec<MonthlyRollup>,
    pub top_origins: Vec<RankedValue>,
    pub top_payers: Vec<RankedValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenialOverview {
    pub provisioned_total: f64,
    pub received_total: f64,
    pub denied_total: f64,
    pub overall_denial_rate: Option<f64>,
    pub mean_denial_rate: Option<f64>,
    pub claims_with_denial: u64,
    pub total_claims: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayerDenial {
    pub payer: String,
    pub denied_total: f64,
    pub provisioned_total: f64,
    pub mean_denial_rate: Option<f64>,
    pub denial_rate: Option<f64>,
}

/// Spread of individual denial rates for one origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginDenial {
    pub origin: String,
    pub claims: u64,
    pub denied_total: f64,
    pub mean_denial_rate: Option<f64>,
    pub median_denial_rate: Option<f64>,
    pub max_denial_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDenial {
    pub month: String,
    pub provisioned_total: f64,
    pub received_total: f64,
    pub denied_total: f64,
    pub mean_denial_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstPerformance {
    pub payer_with_highest_denial: Option<String>,
    pub highest_denied_amount: f64,
    pub origin_with_highest_rate: Option<String>,
    pub highest_mean_denial_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenialAnalysis {
    pub overview: DenialOverview,
    pub by_payer: Vec<PayerDenial>,
    pub by_origin: Vec<OriginDenial>,
    pub monthly_evolution: Vec<MonthlyDenial>,
    pub worst_performance: WorstPerformance,
}

/// One projected future month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub month: String,
    pub projected_revenue: f64,
    pub projected_expense: f64,
    pub projected_result: f64,
}

/// Figures the projection was fitted on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowHistory {
    pub mean_monthly_revenue: f64,
    pub mean_monthly_expense: f64,
    pub monthly_revenue_growth: f64,
    pub monthly_expense_growth: f64,
    pub revenue_months: usize,
    pub expense_months: usize,
    /// The fit is positional; a gap in either series skews the slope
    pub revenue_has_gaps: bool,
    pub expense_has_gaps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowProjection {
    pub history: CashflowHistory,
    pub projections: Vec<ProjectionPoint>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyIndicators {
    pub total_net_revenue: f64,
    pub overall_denial_rate: Option<f64>,
    pub monthly_revenue_growth: f64,
    pub six_month_projected_result: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub indicators: KeyIndicators,
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
}

/// Complete financial report
#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub generated_at: DateTime<Local>,
    pub version: String,
    pub revenue_by_origin: Section<RevenueByOrigin>,
    pub denial_analysis: Section<DenialAnalysis>,
    pub cashflow_projection: Section<CashflowProjection>,
    pub executive_summary: Section<ExecutiveSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_serializes_with_status_tag() {
        let ready: Section<RankedValue> = Section::Ready(RankedValue {
            name: "Particular".to_string(),
            value: 10.0,
        });
        assert_eq!(
            serde_json::to_value(&ready).unwrap(),
            json!({"status": "ready", "data": {"name": "Particular", "value": 10.0}})
        );

        let empty: Section<RankedValue> = Section::NoData("no receivables found".to_string());
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({"status": "no_data", "data": "no receivables found"})
        );
    }

    #[test]
    fn reason_is_only_present_without_data() {
        let failed: Section<()> = Section::Failed("query failed".to_string());
        assert_eq!(failed.reason(), Some("query failed"));
        assert_eq!(failed.ready(), None);
        assert_eq!(Section::Ready(()).reason(), None);
    }
}
