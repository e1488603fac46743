use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Receivable row as returned by the database (contas_receber joined with unit and payer)
#[derive(Debug, Clone, FromRow)]
pub struct ReceivableRow {
    pub month: NaiveDate,
    pub unit: String,
    pub origin: String,
    pub payer: Option<String>,
    pub gross_amount: BigDecimal,
    pub net_amount: BigDecimal,
    pub denied_amount: BigDecimal,
    pub status: String,
}

/// Monthly total row (received revenue)
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyTotalRow {
    pub month: NaiveDate,
    pub total: BigDecimal,
}

/// Paid expenses per month and category (contas_pagar)
#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub month: NaiveDate,
    pub category: String,
    pub total: BigDecimal,
}

/// A single receivable, amounts already converted for arithmetic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivableRecord {
    pub month: NaiveDate,
    pub unit: String,
    pub origin: String,
    pub payer: Option<String>,
    pub gross_amount: f64,
    pub net_amount: f64,
    pub denied_amount: f64,
    pub status: String,
}

/// One point of a monthly time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub month: NaiveDate,
    pub category: String,
    pub amount: f64,
}

/// Numeric values the driver hands back are exact; the engine works in f64.
///
/// A value with no f64 representation counts as zero and is logged.
pub fn decimal_to_f64(value: &BigDecimal) -> f64 {
    match value.to_f64() {
        Some(converted) if converted.is_finite() => converted,
        _ => {
            tracing::warn!("amount {} has no f64 representation, counted as 0", value);
            0.0
        }
    }
}

impl From<ReceivableRow> for ReceivableRecord {
    fn from(row: ReceivableRow) -> Self {
        Self {
            month: row.month,
            unit: row.unit,
            origin: row.origin,
            payer: row.payer,
            gross_amount: decimal_to_f64(&row.gross_amount),
            net_amount: decimal_to_f64(&row.net_amount),
            denied_amount: decimal_to_f64(&row.denied_amount),
            status: row.status,
        }
    }
}

impl From<MonthlyTotalRow> for MonthlyPoint {
    fn from(row: MonthlyTotalRow) -> Self {
        Self {
            month: row.month,
            total: decimal_to_f64(&row.total),
        }
    }
}

impl From<ExpenseRow> for ExpenseRecord {
    fn from(row: ExpenseRow) -> Self {
        Self {
            month: row.month,
            category: row.category,
            amount: decimal_to_f64(&row.total),
        }
    }
}
