use crate::models::{
    DenialAnalysis, DenialOverview, MonthlyDenial, MonthlyRollup, OriginDenial, OriginRollup,
    PayerDenial, PayerRollup, RankedValue, ReceivableRecord, RevenueByOrigin, Section,
    WorstPerformance,
};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};

/// Size of the origin and payer rankings
pub const TOP_N: usize = 5;

/// Round to cents
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Denied share of the gross amount, in percent. `None` when there is no gross amount.
pub fn denial_rate(denied: f64, gross: f64) -> Option<f64> {
    if gross == 0.0 || !gross.is_finite() || !denied.is_finite() {
        return None;
    }
    Some(denied / gross * 100.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of the values that are present; `None` if none are.
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    mean(&present)
}

/// Continuous percentile (linear interpolation between closest ranks), `p` in [0, 1]
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Highest values first; equal values keep their input order.
pub fn top_n(values: Vec<(String, f64)>, n: usize) -> Vec<RankedValue> {
    let mut ranked = values;
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
        .into_iter()
        .map(|(name, value)| RankedValue {
            name,
            value: round2(value),
        })
        .collect()
}

pub fn month_label(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

/// Grouping key: one aggregate row per (month, unit, origin, payer)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub month: NaiveDate,
    pub unit: String,
    pub origin: String,
    pub payer: Option<String>,
}

impl GroupKey {
    pub fn of(record: &ReceivableRecord) -> Self {
        Self {
            month: record.month,
            unit: record.unit.clone(),
            origin: record.origin.clone(),
            payer: record.payer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub count: u64,
    pub gross_total: f64,
    pub net_total: f64,
    pub denied_total: f64,
    /// Average gross amount (ticket)
    pub mean_gross: f64,
    pub denial_rate: Option<f64>,
    pub claims_with_denial: u64,
    /// Average of the per-receivable denial rates
    pub mean_denial_rate: Option<f64>,
}

impl AggregateRow {
    fn from_members(key: GroupKey, members: &[&ReceivableRecord]) -> Self {
        let count = members.len() as u64;
        let gross_total: f64 = members.iter().map(|r| r.gross_amount).sum();
        let net_total: f64 = members.iter().map(|r| r.net_amount).sum();
        let denied_total: f64 = members.iter().map(|r| r.denied_amount).sum();
        let claims_with_denial = members.iter().filter(|r| r.denied_amount > 0.0).count() as u64;

        Self {
            key,
            count,
            gross_total,
            net_total,
            denied_total,
            mean_gross: gross_total / count.max(1) as f64,
            denial_rate: denial_rate(denied_total, gross_total),
            claims_with_denial,
            mean_denial_rate: mean_of_present(
                members.iter().map(|r| denial_rate(r.denied_amount, r.gross_amount)),
            ),
        }
    }
}

/// Group receivables by (month, unit, origin, payer), in order of first appearance
pub fn group_receivables(records: &[ReceivableRecord]) -> Vec<AggregateRow> {
    let mut groups: IndexMap<GroupKey, Vec<&ReceivableRecord>> = IndexMap::new();
    for record in records {
        groups.entry(GroupKey::of(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, members)| AggregateRow::from_members(key, &members))
        .collect()
}

/// Collect rows under a derived key, keeping first-appearance order
fn rollup<'a, K, F>(rows: &'a [AggregateRow], key_of: F) -> IndexMap<K, Vec<&'a AggregateRow>>
where
    K: std::hash::Hash + Eq,
    F: Fn(&AggregateRow) -> Option<K>,
{
    let mut out: IndexMap<K, Vec<&AggregateRow>> = IndexMap::new();
    for row in rows {
        if let Some(key) = key_of(row) {
            out.entry(key).or_default().push(row);
        }
    }
    out
}

fn sum_by<F>(rows: &[&AggregateRow], field: F) -> f64
where
    F: Fn(&AggregateRow) -> f64,
{
    rows.iter().map(|row| field(*row)).sum()
}

/// Revenue by origin, payer and month over the lookback window
///
/// Receivables without a payer are left out of the payer rollup and ranking.
pub fn revenue_by_origin(
    records: &[ReceivableRecord],
    lookback_months: u32,
) -> Section<RevenueByOrigin> {
    if records.is_empty() {
        return Section::NoData(format!(
            "no receivables found in the last {} months",
            lookback_months
        ));
    }

    let rows = group_receivables(records);
    let all: Vec<&AggregateRow> = rows.iter().collect();
    let gross_total = sum_by(&all, |r| r.gross_total);
    let net_total = sum_by(&all, |r| r.net_total);
    let denied_total = sum_by(&all, |r| r.denied_total);

    let rows_with_net_above_gross = records
        .iter()
        .filter(|r| r.net_amount > r.gross_amount)
        .count();
    if rows_with_net_above_gross > 0 {
        tracing::warn!(
            "{} receivables have a net amount above the gross amount",
            rows_with_net_above_gross
        );
    }

    // per origin
    let origins = rollup(&rows, |r| Some(r.key.origin.clone()));
    let mut origin_net = Vec::with_capacity(origins.len());
    let by_origin: Vec<OriginRollup> = origins
        .iter()
        .map(|(origin, group)| {
            let net = sum_by(group, |r| r.net_total);
            origin_net.push((origin.clone(), net));
            let tickets: Vec<f64> = group.iter().map(|r| r.mean_gross).collect();
            OriginRollup {
                origin: origin.clone(),
                net_revenue: round2(net),
                claim_count: group.iter().map(|r| r.count).sum(),
                mean_ticket: round2(mean(&tickets).unwrap_or(0.0)),
            }
        })
        .collect();

    // per payer
    let payers = rollup(&rows, |r| r.key.payer.clone());
    let mut payer_net = Vec::with_capacity(payers.len());
    let by_payer: Vec<PayerRollup> = payers
        .iter()
        .map(|(payer, group)| {
            let net = sum_by(group, |r| r.net_total);
            payer_net.push((payer.clone(), net));
            PayerRollup {
                payer: payer.clone(),
                net_revenue: round2(net),
                mean_denial_rate: mean_of_present(group.iter().map(|r| r.denial_rate)).map(round2),
            }
        })
        .collect();

    // per month, oldest first
    let mut months: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in &rows {
        let entry = months.entry(row.key.month).or_insert((0.0, 0.0));
        entry.0 += row.net_total;
        entry.1 += row.denied_total;
    }
    let monthly_trend = months
        .into_iter()
        .map(|(month, (net, denied))| MonthlyRollup {
            month: month_label(month),
            net_revenue: round2(net),
            denied: round2(denied),
        })
        .collect();

    Section::Ready(RevenueByOrigin {
        period: format!("last {} months", lookback_months),
        lookback_months,
        gross_revenue_total: round2(gross_total),
        net_revenue_total: round2(net_total),
        denied_total: round2(denied_total),
        overall_denial_rate: denial_rate(denied_total, gross_total).map(round2),
        rows_with_net_above_gross,
        by_origin,
        by_payer,
        monthly_trend,
        top_origins: top_n(origin_net, TOP_N),
        top_payers: top_n(payer_net, TOP_N),
    })
}

/// Denial ("glosa") analysis over groups with a positive gross amount
pub fn denial_analysis(records: &[ReceivableRecord]) -> Section<DenialAnalysis> {
    let rows: Vec<AggregateRow> = group_receivables(records)
        .into_iter()
        .filter(|row| row.gross_total > 0.0)
        .collect();

    if rows.is_empty() {
        return Section::NoData("no denial data found".to_string());
    }

    let all: Vec<&AggregateRow> = rows.iter().collect();
    let provisioned = sum_by(&all, |r| r.gross_total);
    let received = sum_by(&all, |r| r.net_total);
    let denied = sum_by(&all, |r| r.denied_total);

    let overview = DenialOverview {
        provisioned_total: round2(provisioned),
        received_total: round2(received),
        denied_total: round2(denied),
        overall_denial_rate: denial_rate(denied, provisioned).map(round2),
        mean_denial_rate: mean_of_present(rows.iter().map(|r| r.mean_denial_rate)).map(round2),
        claims_with_denial: rows.iter().map(|r| r.claims_with_denial).sum(),
        total_claims: rows.iter().map(|r| r.count).sum(),
    };

    let by_payer = rollup(&rows, |r| r.key.payer.clone())
        .into_iter()
        .map(|(payer, group)| {
            let payer_denied = sum_by(&group, |r| r.denied_total);
            let payer_gross = sum_by(&group, |r| r.gross_total);
            PayerDenial {
                payer,
                denied_total: round2(payer_denied),
                provisioned_total: round2(payer_gross),
                mean_denial_rate: mean_of_present(group.iter().map(|r| r.mean_denial_rate))
                    .map(round2),
                denial_rate: denial_rate(payer_denied, payer_gross).map(round2),
            }
        })
        .collect();

    let mut months: BTreeMap<NaiveDate, Vec<&AggregateRow>> = BTreeMap::new();
    for row in &rows {
        months.entry(row.key.month).or_default().push(row);
    }
    let monthly_evolution = months
        .into_iter()
        .map(|(month, group)| MonthlyDenial {
            month: month_label(month),
            provisioned_total: round2(sum_by(&group, |r| r.gross_total)),
            received_total: round2(sum_by(&group, |r| r.net_total)),
            denied_total: round2(sum_by(&group, |r| r.denied_total)),
            mean_denial_rate: mean_of_present(group.iter().map(|r| r.mean_denial_rate))
                .map(round2),
        })
        .collect();

    Section::Ready(DenialAnalysis {
        overview,
        by_payer,
        by_origin: origin_denials(records, &rows),
        monthly_evolution,
        worst_performance: worst_performance(&rows),
    })
}

/// Per-origin spread of the individual denial rates
///
/// Only members of `rows` count, so claim totals match the overview.
fn origin_denials(records: &[ReceivableRecord], rows: &[AggregateRow]) -> Vec<OriginDenial> {
    let kept: HashSet<&GroupKey> = rows.iter().map(|r| &r.key).collect();

    let mut origins: IndexMap<&str, Vec<&ReceivableRecord>> = IndexMap::new();
    for record in records.iter().filter(|r| kept.contains(&GroupKey::of(r))) {
        origins.entry(record.origin.as_str()).or_default().push(record);
    }

    origins
        .into_iter()
        .map(|(origin, members)| {
            let rates: Vec<f64> = members
                .iter()
                .filter_map(|r| denial_rate(r.denied_amount, r.gross_amount))
                .collect();
            OriginDenial {
                origin: origin.to_string(),
                claims: members.len() as u64,
                denied_total: round2(members.iter().map(|r| r.denied_amount).sum()),
                mean_denial_rate: mean(&rates).map(round2),
                median_denial_rate: percentile(&rates, 0.5).map(round2),
                max_denial_rate: rates.iter().copied().reduce(f64::max).map(round2),
            }
        })
        .collect()
}

/// First group holding the largest value wins
fn worst_performance(rows: &[AggregateRow]) -> WorstPerformance {
    let mut by_amount: Option<&AggregateRow> = None;
    for row in rows {
        if by_amount.map_or(true, |best| row.denied_total > best.denied_total) {
            by_amount = Some(row);
        }
    }

    let mut by_rate: Option<(&AggregateRow, f64)> = None;
    for row in rows {
        if let Some(rate) = row.mean_denial_rate {
            if by_rate.map_or(true, |(_, best)| rate > best) {
                by_rate = Some((row, rate));
            }
        }
    }

    WorstPerformance {
        payer_with_highest_denial: by_amount.and_then(|r| r.key.payer.clone()),
        highest_denied_amount: round2(by_amount.map_or(0.0, |r| r.denied_total)),
        origin_with_highest_rate: by_rate.map(|(r, _)| r.key.origin.clone()),
        highest_mean_denial_rate: by_rate.map(|(_, rate)| round2(rate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, 1).unwrap()
    }

    fn receivable(
        m: u32,
        origin: &str,
        payer: Option<&str>,
        gross: f64,
        denied: f64,
    ) -> ReceivableRecord {
        ReceivableRecord {
            month: month(m),
            unit: "Centro".to_string(),
            origin: origin.to_string(),
            payer: payer.map(str::to_string),
            gross_amount: gross,
            net_amount: gross - denied,
            denied_amount: denied,
            status: "Recebido".to_string(),
        }
    }

    #[test]
    fn denial_rate_without_gross_is_none() {
        assert_eq!(denial_rate(10.0, 0.0), None);
        assert_eq!(denial_rate(0.0, 0.0), None);
        assert_eq!(denial_rate(25.0, 100.0), Some(25.0));
    }

    #[test]
    fn zero_gross_rows_do_not_poison_means() {
        let rates = vec![denial_rate(5.0, 0.0), denial_rate(10.0, 100.0), denial_rate(30.0, 100.0)];
        assert_eq!(mean_of_present(rates), Some(20.0));
        assert_eq!(mean_of_present(vec![None, None]), None);
    }

    #[test]
    fn percentile_interpolates() {
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[4.0], 0.5), Some(4.0));
        assert_eq!(percentile(&[1.0, 3.0, 2.0, 4.0], 0.5), Some(2.5));
        assert_eq!(percentile(&[10.0, 0.0, 5.0], 1.0), Some(10.0));
    }

    #[test]
    fn top_n_is_stable_on_ties() {
        let values = vec![
            ("a".to_string(), 10.0),
            ("b".to_string(), 30.0),
            ("c".to_string(), 10.0),
            ("d".to_string(), 20.0),
            ("e".to_string(), 10.0),
            ("f".to_string(), 5.0),
            ("g".to_string(), 1.0),
        ];
        let top = top_n(values, TOP_N);
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn top_n_is_limited_by_distinct_count() {
        let top = top_n(vec![("x".to_string(), 1.0), ("y".to_string(), 2.0)], TOP_N);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "y");
    }

    #[test]
    fn grouping_follows_first_appearance() {
        let records = vec![
            receivable(2, "Convênio", Some("Unimed"), 100.0, 10.0),
            receivable(1, "Particular", None, 50.0, 0.0),
            receivable(2, "Convênio", Some("Unimed"), 300.0, 0.0),
        ];
        let rows = group_receivables(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key.origin, "Convênio");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].gross_total, 400.0);
        assert_eq!(rows[0].mean_gross, 200.0);
        assert_eq!(rows[0].claims_with_denial, 1);
        assert_eq!(rows[0].mean_denial_rate, Some(5.0));
        assert_eq!(rows[1].key.payer, None);
    }

    #[test]
    fn empty_input_reports_no_data() {
        assert!(matches!(revenue_by_origin(&[], 12), Section::NoData(_)));
        assert!(matches!(denial_analysis(&[]), Section::NoData(_)));
    }

    #[test]
    fn overall_denial_rate_matches_totals() {
        let records = vec![
            receivable(1, "Particular", None, 250.0, 0.0),
            receivable(1, "Convênio", Some("Unimed"), 180.0, 36.0),
            receivable(2, "Convênio", Some("Bradesco"), 350.0, 35.0),
        ];
        let report = revenue_by_origin(&records, 12);
        let report = report.ready().expect("report");
        assert_eq!(report.gross_revenue_total, 780.0);
        assert_eq!(report.denied_total, 71.0);
        assert_eq!(report.overall_denial_rate, Some(9.1));
        assert!(report.denied_total <= report.gross_revenue_total);
    }

    #[test]
    fn revenue_rollups() {
        let records = vec![
            receivable(1, "Particular", None, 250.0, 0.0),
            receivable(1, "Convênio", Some("Unimed"), 180.0, 36.0),
            receivable(2, "Convênio", Some("Unimed"), 200.0, 0.0),
            receivable(2, "Convênio", Some("Bradesco"), 350.0, 35.0),
        ];
        let report = revenue_by_origin(&records, 6);
        let report = report.ready().expect("report");

        assert_eq!(report.period, "last 6 months");
        assert_eq!(report.by_origin.len(), 2);
        let convenio = &report.by_origin[1];
        assert_eq!(convenio.origin, "Convênio");
        assert_eq!(convenio.net_revenue, 659.0);
        assert_eq!(convenio.claim_count, 3);

        // payerless receivables are not ranked
        assert_eq!(report.by_payer.len(), 2);
        assert_eq!(report.top_payers[0].name, "Unimed");
        assert_eq!(report.top_payers[0].value, 344.0);
        assert_eq!(report.by_payer[1].mean_denial_rate, Some(10.0));

        assert_eq!(report.top_origins[0].name, "Convênio");
        assert_eq!(report.monthly_trend.len(), 2);
        assert_eq!(report.monthly_trend[0].month, "2025-01");
        assert_eq!(report.monthly_trend[0].net_revenue, 394.0);
        assert_eq!(report.monthly_trend[1].denied, 35.0);
    }

    #[test]
    fn net_above_gross_is_surfaced() {
        let mut broken = receivable(1, "Particular", None, 100.0, 0.0);
        broken.net_amount = 120.0;
        let report = revenue_by_origin(&[broken], 12);
        assert_eq!(report.ready().unwrap().rows_with_net_above_gross, 1);
    }

    #[test]
    fn denial_analysis_skips_groups_without_gross() {
        let records = vec![receivable(1, "Convênio", Some("Unimed"), 0.0, 0.0)];
        assert!(matches!(denial_analysis(&records), Section::NoData(_)));
    }

    #[test]
    fn denial_analysis_breakdown() {
        let records = vec![
            receivable(1, "Particular", None, 250.0, 0.0),
            receivable(1, "Convênio", Some("Unimed"), 180.0, 36.0),
            receivable(2, "Convênio", Some("Bradesco"), 350.0, 35.0),
            receivable(2, "Convênio", Some("Bradesco"), 150.0, 60.0),
        ];
        let analysis = denial_analysis(&records);
        let analysis = analysis.ready().expect("analysis");

        assert_eq!(analysis.overview.total_claims, 4);
        assert_eq!(analysis.overview.claims_with_denial, 3);
        assert_eq!(analysis.overview.provisioned_total, 930.0);
        assert_eq!(analysis.overview.denied_total, 131.0);

        let bradesco = analysis
            .by_payer
            .iter()
            .find(|p| p.payer == "Bradesco")
            .expect("bradesco");
        assert_eq!(bradesco.denied_total, 95.0);
        assert_eq!(bradesco.denial_rate, Some(19.0));
        assert_eq!(bradesco.mean_denial_rate, Some(25.0));

        let worst = &analysis.worst_performance;
        assert_eq!(worst.payer_with_highest_denial.as_deref(), Some("Bradesco"));
        assert_eq!(worst.highest_denied_amount, 95.0);
        assert_eq!(worst.origin_with_highest_rate.as_deref(), Some("Convênio"));
        assert_eq!(worst.highest_mean_denial_rate, Some(25.0));

        let convenio = analysis
            .by_origin
            .iter()
            .find(|o| o.origin == "Convênio")
            .expect("convenio");
        assert_eq!(convenio.claims, 3);
        assert_eq!(convenio.median_denial_rate, Some(20.0));
        assert_eq!(convenio.max_denial_rate, Some(40.0));

        assert_eq!(analysis.monthly_evolution[0].month, "2025-01");
        assert_eq!(analysis.monthly_evolution[1].denied_total, 95.0);
    }

    #[test]
    fn origin_claims_match_overview_claims() {
        let records = vec![
            receivable(1, "Convênio", Some("Unimed"), 200.0, 20.0),
            // zero gross inside a group that still has gross
            receivable(1, "Convênio", Some("Unimed"), 0.0, 0.0),
            // a group with no gross at all is dropped everywhere
            receivable(2, "Particular", None, 0.0, 0.0),
        ];
        let analysis = denial_analysis(&records);
        let analysis = analysis.ready().expect("analysis");

        assert_eq!(analysis.overview.total_claims, 2);
        let origin_claims: u64 = analysis.by_origin.iter().map(|o| o.claims).sum();
        assert_eq!(origin_claims, analysis.overview.total_claims);

        assert_eq!(analysis.by_origin.len(), 1);
        let convenio = &analysis.by_origin[0];
        // the zero-gross claim has no rate of its own
        assert_eq!(convenio.mean_denial_rate, Some(10.0));
        assert_eq!(convenio.max_denial_rate, Some(10.0));
    }
}
