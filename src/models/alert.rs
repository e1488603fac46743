use serde::{Serialize, Serializer};
use std::fmt;

/// Threshold alert. Rendered and serialized as a human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Projected result below zero for a month
    NegativeResult { month: String, amount: f64 },
    /// Projected expenses above 90% of projected revenue; ratio in percent
    HighExpenseRatio { month: String, ratio: Option<f64> },
    ElevatedDenialRate { rate: f64 },
    DecliningRevenue { slope: f64 },
    /// Cumulative projected result below zero
    NegativeOutlook { total: f64 },
}

impl Alert {
    /// Management recommendation attached to summary-level alerts
    pub fn recommendation(&self) -> Option<&'static str> {
        match self {
            Alert::ElevatedDenialRate { .. } => {
                Some("Review authorization and documentation processes with payers")
            }
            Alert::DecliningRevenue { .. } => {
                Some("Implement strategies to increase patient acquisition")
            }
            Alert::NegativeOutlook { .. } => Some("Review the cost structure and cut expenses"),
            Alert::NegativeResult { .. } | Alert::HighExpenseRatio { .. } => None,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::NegativeResult { month, amount } => {
                write!(f, "Negative result projected for {}: R$ {:.2}", month, amount)
            }
            Alert::HighExpenseRatio {
                month,
                ratio: Some(ratio),
            } => write!(f, "Expenses too high in {}: {:.1}% of revenue", month, ratio),
            Alert::HighExpenseRatio { month, ratio: None } => {
                write!(f, "Expenses too high in {}: no projected revenue to cover them", month)
            }
            Alert::ElevatedDenialRate { rate } => write!(
                f,
                "Elevated denial rate ({:.2}%) - requires immediate attention",
                rate
            ),
            Alert::DecliningRevenue { slope } => {
                write!(f, "Declining revenue trend (R$ {:.2} per month)", slope)
            }
            Alert::NegativeOutlook { total } => {
                write!(f, "Negative projection for the coming months: R$ {:.2}", total)
            }
        }
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
