use crate::error::Result;
use crate::models::{
    CashflowProjection, DenialAnalysis, ExecutiveSummary, FinancialReport, KeyIndicators,
    RevenueByOrigin, Section,
};
use crate::service::aggregation::round2;
use crate::service::alerts::summary_alerts;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const REPORT_VERSION: &str = "1.0";

/// Top-line figures derived from the already computed sections
///
/// Any section without data short-circuits to `NoData`.
pub fn executive_summary(
    revenue: &Section<RevenueByOrigin>,
    denials: &Section<DenialAnalysis>,
    projection: &Section<CashflowProjection>,
) -> Section<ExecutiveSummary> {
    let (Some(revenue), Some(_), Some(projection)) =
        (revenue.ready(), denials.ready(), projection.ready())
    else {
        return Section::NoData("insufficient data for executive summary".to_string());
    };

    let indicators = KeyIndicators {
        total_net_revenue: revenue.net_revenue_total,
        overall_denial_rate: revenue.overall_denial_rate,
        monthly_revenue_growth: projection.history.monthly_revenue_growth,
        six_month_projected_result: round2(
            projection.projections.iter().map(|p| p.projected_result).sum(),
        ),
    };

    let alerts = summary_alerts(&indicators);
    let recommendations = alerts
        .iter()
        .filter_map(|alert| alert.recommendation())
        .map(str::to_string)
        .collect();

    Section::Ready(ExecutiveSummary {
        indicators,
        alerts,
        recommendations,
    })
}

/// Compose the sections into one document; sections without data stay marked
pub fn assemble_report(
    generated_at: DateTime<Local>,
    revenue_by_origin: Section<RevenueByOrigin>,
    denial_analysis: Section<DenialAnalysis>,
    cashflow_projection: Section<CashflowProjection>,
) -> FinancialReport {
    let executive_summary =
        executive_summary(&revenue_by_origin, &denial_analysis, &cashflow_projection);

    FinancialReport {
        generated_at,
        version: REPORT_VERSION.to_string(),
        revenue_by_origin,
        denial_analysis,
        cashflow_projection,
        executive_summary,
    }
}

/// `financial_report_YYYYMMDD_HHMMSS.json`
pub fn report_file_name(generated_at: &DateTime<Local>) -> String {
    format!("financial_report_{}.json", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Write the report as indented JSON under `dir`
pub fn write_report(report: &FinancialReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(&report.generated_at));

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("report saved to {}", path.display());
    Ok(path)
}

/// Export the projected months as CSV
pub fn export_projection_csv(projection: &CashflowProjection, output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(["month", "projected_revenue", "projected_expense", "projected_result"])?;

    for point in &projection.projections {
        writer.write_record(&[
            point.month.clone(),
            format!("{:.2}", point.projected_revenue),
            format!("{:.2}", point.projected_expense),
            format!("{:.2}", point.projected_result),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Console rendering of the executive summary
pub fn console_summary(report: &FinancialReport) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    if write_summary(&mut out, report).is_err() {
        tracing::warn!("console summary truncated");
    }
    out
}

fn write_summary(out: &mut String, report: &FinancialReport) -> std::fmt::Result {
    writeln!(out, "EXECUTIVE SUMMARY")?;
    writeln!(out, "{}", "-".repeat(30))?;

    match &report.executive_summary {
        Section::Ready(summary) => {
            let ind = &summary.indicators;
            writeln!(out, "Net revenue:          R$ {:.2}", ind.total_net_revenue)?;
            match ind.overall_denial_rate {
                Some(rate) => writeln!(out, "Denial rate:          {:.1}%", rate)?,
                None => writeln!(out, "Denial rate:          n/a")?,
            }
            writeln!(out, "Monthly growth:       R$ {:.2}", ind.monthly_revenue_growth)?;
            writeln!(out, "Projected result:     R$ {:.2}", ind.six_month_projected_result)?;

            if !summary.alerts.is_empty() {
                writeln!(out, "\nALERTS:")?;
                for alert in &summary.alerts {
                    writeln!(out, "  {}", alert)?;
                }
            }

            if !summary.recommendations.is_empty() {
                writeln!(out, "\nRECOMMENDATIONS:")?;
                for rec in &summary.recommendations {
                    writeln!(out, "  - {}", rec)?;
                }
            }
        }
        other => writeln!(out, "{}", other.reason().unwrap_or("no data"))?,
    }

    writeln!(
        out,
        "\nGenerated at {}",
        report.generated_at.format("%d/%m/%Y %H:%M:%S")
    )
}
