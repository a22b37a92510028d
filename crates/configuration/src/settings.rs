use serde::Deserialize;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; omitted sections fall back to the
/// values the dashboard has always used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub dashboard: DashboardConfig,
    pub strategies: StrategiesConfig,
    pub reports: ReportsConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

/// Connection parameters for the trading backend's REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL that every collection path is appended to.
    pub base_url: String,
    /// Upper bound on a single request, including reading the body.
    pub request_timeout_secs: u64,
    /// The word placed before the token in the `Authorization` header.
    pub auth_scheme: String,
    /// How many `next` links to follow when the backend paginates a collection.
    pub max_pages: usize,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            auth_scheme: "Token".to_string(),
            max_pages: 20,
        }
    }
}

/// Polling intervals per view, in seconds.
///
/// A view without an interval is fetched once when it starts and again whenever
/// its filters change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub dashboard_secs: Option<u64>,
    pub agents_secs: Option<u64>,
    pub portfolio_secs: Option<u64>,
    pub positions_secs: Option<u64>,
    pub trades_secs: Option<u64>,
    pub strategies_secs: Option<u64>,
    pub reports_secs: Option<u64>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            dashboard_secs: Some(30),
            agents_secs: Some(10),
            portfolio_secs: None,
            positions_secs: None,
            trades_secs: None,
            strategies_secs: None,
            reports_secs: None,
        }
    }
}

/// What the landing dashboard shows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// The account whose portfolio headlines the dashboard.
    pub account_name: String,
    pub recent_trades: usize,
    pub top_positions: usize,
    pub top_strategies: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            account_name: "simulation_main".to_string(),
            recent_trades: 10,
            top_positions: 5,
            top_strategies: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    /// Number of strategies placed side by side in the comparison chart.
    pub compare_limit: usize,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self { compare_limit: 8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Number of most recent reports plotted in the trend chart.
    pub trend_limit: usize,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self { trend_limit: 10 }
    }
}

/// Location of a time-bucketed history endpoint.
///
/// The backend does not ship one out of the box. Without it, equity trend
/// charts report that no historical source is configured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Path, relative to `api.base_url`, returning `[{timestamp, value}]`.
    pub equity_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
            file_prefix: "vantage.log".to_string(),
        }
    }
}
