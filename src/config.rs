use config::{Config, ConfigError, Environment, Map};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub report: ReportConfig,
}

/// Connection parameters for the clinic database.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    /// How long a query waits for a connection before giving up
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the JSON report is written to
    pub output_dir: PathBuf,
    /// Default window for the revenue-by-origin report
    pub lookback_months: u32,
    /// History used by the denial analysis and the cash-flow fit
    pub history_months: u32,
    /// Default projection horizon
    pub projection_months: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            port: 5432,
            acquire_timeout_secs: 10,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            lookback_months: 12,
            history_months: 12,
            projection_months: 6,
        }
    }
}

// Keep the password out of startup logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .field("port", &self.port)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Build sqlx connect options, logging statements slower than 5s
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);

        if !self.password.is_empty() {
            options = options.password(&self.password);
        }

        options.log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5))
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// Database: `SUPABASE_DB_HOST`, `SUPABASE_DB_NAME`, `SUPABASE_DB_USER`,
    /// `SUPABASE_DB_PASSWORD`, `SUPABASE_DB_PORT`, `SUPABASE_DB_ACQUIRE_TIMEOUT_SECS`.
    /// Report: `FINANCE_REPORT_OUTPUT_DIR`, `FINANCE_REPORT_LOOKBACK_MONTHS`,
    /// `FINANCE_REPORT_HISTORY_MONTHS`, `FINANCE_REPORT_PROJECTION_MONTHS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load configuration from an explicit variable map instead of the real environment.
    pub fn load(vars: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let db_defaults = DatabaseConfig::default();
        let database = Config::builder()
            .set_default("host", db_defaults.host)?
            .set_default("name", db_defaults.name)?
            .set_default("user", db_defaults.user)?
            .set_default("password", db_defaults.password)?
            .set_default("port", i64::from(db_defaults.port))?
            .set_default("acquire_timeout_secs", db_defaults.acquire_timeout_secs)?
            .add_source(
                Environment::with_prefix("SUPABASE_DB")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .source(vars.clone()),
            )
            .build()?
            .try_deserialize::<DatabaseConfig>()?;

        let report_defaults = ReportConfig::default();
        let report = Config::builder()
            .set_default("output_dir", report_defaults.output_dir.to_string_lossy().into_owned())?
            .set_default("lookback_months", i64::from(report_defaults.lookback_months))?
            .set_default("history_months", i64::from(report_defaults.history_months))?
            .set_default("projection_months", i64::from(report_defaults.projection_months))?
            .add_source(
                Environment::with_prefix("FINANCE_REPORT")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize::<ReportConfig>()?;

        Ok(Self { database, report })
    }
}
