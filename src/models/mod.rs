pub mod alert;
pub mod ledger;
pub mod report;

pub use alert::Alert;
pub use ledger::{
    ExpenseRecord, ExpenseRow, MonthlyPoint, MonthlyTotalRow, ReceivableRecord, ReceivableRow,
};
pub use report::{
    CashflowHistory, CashflowProjection, DenialAnalysis, DenialOverview, ExecutiveSummary,
    FinancialReport, KeyIndicators, MonthlyDenial, MonthlyRollup, OriginDenial, OriginRollup,
    PayerDenial, PayerRollup, ProjectionPoint, RankedValue, RevenueByOrigin, Section,
    WorstPerformance,
};
