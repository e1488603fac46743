use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("database unavailable: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FinanceError {
    /// True when the database could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, FinanceError::Connection(_))
    }
}

impl From<sqlx::Error> for FinanceError {
    fn from(err: sqlx::Error) -> Self {
        let unreachable = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => true,
            // rejected credentials: SQLSTATE class 28
            sqlx::Error::Database(db) => db.code().map_or(false, |code| code.starts_with("28")),
            _ => false,
        };

        if unreachable {
            FinanceError::Connection(err)
        } else {
            FinanceError::Query(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, FinanceError>;
