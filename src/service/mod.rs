pub mod aggregation;
pub mod alerts;
pub mod finance;
pub mod projection;
pub mod report;

pub use alerts::Alert;
pub use finance::{FinanceService, GeneratedReport};
