use crate::config::ReportConfig;
use crate::db::queries;
use crate::error::{FinanceError, Result};
use crate::models::{
    CashflowProjection, DenialAnalysis, ExpenseRecord, FinancialReport, MonthlyPoint,
    ReceivableRecord, RevenueByOrigin, Section,
};
use crate::service::{aggregation, projection, report};
use chrono::Local;
use sqlx::PgPool;
use std::path::PathBuf;

/// Report generated by [`FinanceService::generate_full_report`]
#[derive(Debug)]
pub struct GeneratedReport {
    pub report: FinancialReport,
    /// Where the JSON was written, when saving was requested
    pub path: Option<PathBuf>,
}

/// Financial reporting service
pub struct FinanceService {
    pool: PgPool,
    config: ReportConfig,
}

/// Connection failures are reported as missing data, anything else as a failed section.
fn section_from_error<T>(context: &str, err: FinanceError) -> Section<T> {
    tracing::error!("{}: {}", context, err);
    if err.is_connection() {
        Section::NoData(err.to_string())
    } else {
        Section::Failed(err.to_string())
    }
}

impl FinanceService {
    pub fn new(pool: PgPool, config: ReportConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    async fn receivables(&self, months: u32) -> Result<Vec<ReceivableRecord>> {
        let rows = queries::list_receivables(&self.pool, months).await?;
        tracing::debug!("fetched {} receivables ({} months)", rows.len(), months);
        Ok(rows.into_iter().map(ReceivableRecord::from).collect())
    }

    /// Revenue by origin over the last `months` months
    pub async fn revenue_by_origin(&self, months: u32) -> Section<RevenueByOrigin> {
        match self.receivables(months).await {
            Ok(records) => aggregation::revenue_by_origin(&records, months),
            Err(e) => section_from_error("revenue by origin", e),
        }
    }

    /// Denial analysis over the configured history window
    pub async fn analyze_denials(&self) -> Section<DenialAnalysis> {
        match self.receivables(self.config.history_months).await {
            Ok(records) => aggregation::denial_analysis(&records),
            Err(e) => section_from_error("denial analysis", e),
        }
    }

    /// Cash-flow projection for the next `months` months
    pub async fn project_cash_flow(&self, months: u32) -> Section<CashflowProjection> {
        let history = self.config.history_months;

        // one query at a time
        let revenue = match queries::monthly_received_revenue(&self.pool, history).await {
            Ok(rows) => rows.into_iter().map(MonthlyPoint::from).collect::<Vec<_>>(),
            Err(e) => return section_from_error("revenue history", e.into()),
        };
        let expenses = match queries::monthly_paid_expenses(&self.pool, history).await {
            Ok(rows) => rows.into_iter().map(ExpenseRecord::from).collect::<Vec<_>>(),
            Err(e) => return section_from_error("expense history", e.into()),
        };

        tracing::debug!(
            "projecting {} months from {} revenue months and {} expense rows",
            months,
            revenue.len(),
            expenses.len()
        );
        projection::project_cash_flow(&revenue, &expenses, months, Local::now().date_naive())
    }

    /// Generate every section, the executive summary and optionally save the JSON
    pub async fn generate_full_report(&self, save: bool) -> Result<GeneratedReport> {
        tracing::info!("Generating revenue by origin...");
        let revenue = self.revenue_by_origin(self.config.lookback_months).await;

        tracing::info!("Analyzing denials...");
        let denials = self.analyze_denials().await;

        tracing::info!("Projecting cash flow...");
        let cashflow = self.project_cash_flow(self.config.projection_months).await;

        let report = report::assemble_report(Local::now(), revenue, denials, cashflow);

        let path = if save {
            Some(report::write_report(&report, &self.config.output_dir)?)
        } else {
            None
        };

        Ok(GeneratedReport { report, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_database_means_no_data() {
        let section: Section<RevenueByOrigin> =
            section_from_error("revenue by origin", sqlx::Error::PoolTimedOut.into());
        match section {
            Section::NoData(reason) => assert!(reason.starts_with("database unavailable")),
            other => panic!("expected no_data, got {:?}", other),
        }
    }

    #[test]
    fn other_query_errors_fail_the_section() {
        let section: Section<DenialAnalysis> =
            section_from_error("denial analysis", sqlx::Error::RowNotFound.into());
        match section {
            Section::Failed(reason) => assert!(reason.starts_with("query failed")),
            other => panic!("expected failed, got {:?}", other),
        }
    }
}
