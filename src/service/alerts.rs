pub use crate::models::Alert;
use crate::models::{KeyIndicators, ProjectionPoint};

/// Projected expenses above this share of projected revenue raise an alert
pub const HIGH_EXPENSE_RATIO: f64 = 0.9;
/// Overall denial rate (percent) above which management is alerted
pub const DENIAL_RATE_LIMIT: f64 = 10.0;

/// Per-month alerts, in month order: negative result, then expense ratio
pub fn projection_alerts(points: &[ProjectionPoint]) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for point in points {
        if point.projected_result < 0.0 {
            alerts.push(Alert::NegativeResult {
                month: point.month.clone(),
                amount: point.projected_result,
            });
        }

        if point.projected_expense > point.projected_revenue * HIGH_EXPENSE_RATIO {
            let ratio = (point.projected_revenue > 0.0).then(|| {
                let percent = point.projected_expense / point.projected_revenue * 100.0;
                (percent * 10.0).round() / 10.0
            });
            alerts.push(Alert::HighExpenseRatio {
                month: point.month.clone(),
                ratio,
            });
        }
    }

    alerts
}

/// Executive-level alerts: denial rate, revenue trend, cumulative outlook
pub fn summary_alerts(indicators: &KeyIndicators) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(rate) = indicators.overall_denial_rate {
        if rate > DENIAL_RATE_LIMIT {
            alerts.push(Alert::ElevatedDenialRate { rate });
        }
    }

    if indicators.monthly_revenue_growth < 0.0 {
        alerts.push(Alert::DecliningRevenue {
            slope: indicators.monthly_revenue_growth,
        });
    }

    if indicators.six_month_projected_result < 0.0 {
        alerts.push(Alert::NegativeOutlook {
            total: indicators.six_month_projected_result,
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(month: &str, revenue: f64, expense: f64) -> ProjectionPoint {
        ProjectionPoint {
            month: month.to_string(),
            projected_revenue: revenue,
            projected_expense: expense,
            projected_result: revenue - expense,
        }
    }

    #[test]
    fn negative_result_names_month_and_amount() {
        let alerts = projection_alerts(&[point("2025-07", 100.0, 150.0)]);

        let negative: Vec<&Alert> = alerts
            .iter()
            .filter(|a| matches!(a, Alert::NegativeResult { .. }))
            .collect();
        assert_eq!(negative.len(), 1);
        let message = negative[0].to_string();
        assert!(message.contains("2025-07"));
        assert!(message.contains("-50.00"));

        // rule order within a month
        assert!(matches!(alerts[0], Alert::NegativeResult { .. }));
        assert_eq!(
            alerts[1],
            Alert::HighExpenseRatio {
                month: "2025-07".to_string(),
                ratio: Some(150.0)
            }
        );
    }

    #[test]
    fn healthy_month_raises_nothing() {
        assert!(projection_alerts(&[point("2025-08", 1000.0, 800.0)]).is_empty());
    }

    #[test]
    fn expense_ratio_without_revenue_has_no_percentage() {
        let alerts = projection_alerts(&[point("2025-09", 0.0, 10.0)]);
        assert_eq!(alerts.len(), 2);
        assert_eq!(
            alerts[1].to_string(),
            "Expenses too high in 2025-09: no projected revenue to cover them"
        );
    }

    #[test]
    fn alerts_follow_month_order() {
        let alerts = projection_alerts(&[
            point("2025-07", 100.0, 95.0),
            point("2025-08", 100.0, 120.0),
        ]);
        let months: Vec<String> = alerts
            .iter()
            .map(|a| match a {
                Alert::NegativeResult { month, .. } | Alert::HighExpenseRatio { month, .. } => {
                    month.clone()
                }
                other => panic!("unexpected alert {:?}", other),
            })
            .collect();
        assert_eq!(months, vec!["2025-07", "2025-08", "2025-08"]);
    }

    #[test]
    fn summary_rules_fire_independently_in_order() {
        let indicators = KeyIndicators {
            total_net_revenue: 1000.0,
            overall_denial_rate: Some(12.5),
            monthly_revenue_growth: -40.0,
            six_month_projected_result: -300.0,
        };
        let alerts = summary_alerts(&indicators);
        assert_eq!(alerts.len(), 3);
        assert!(matches!(alerts[0], Alert::ElevatedDenialRate { .. }));
        assert!(matches!(alerts[1], Alert::DecliningRevenue { .. }));
        assert!(matches!(alerts[2], Alert::NegativeOutlook { .. }));
        assert!(alerts.iter().all(|a| a.recommendation().is_some()));
    }

    #[test]
    fn denial_rate_at_limit_is_not_elevated() {
        let indicators = KeyIndicators {
            total_net_revenue: 1000.0,
            overall_denial_rate: Some(10.0),
            monthly_revenue_growth: 5.0,
            six_month_projected_result: 100.0,
        };
        assert!(summary_alerts(&indicators).is_empty());
    }
}
