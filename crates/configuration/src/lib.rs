use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    ApiConfig, Config, DashboardConfig, HistoryConfig, LogFormat, LoggingConfig, RefreshConfig,
    ReportsConfig, StrategiesConfig,
};

/// Prefix for environment overrides, e.g. `VANTAGE_API__BASE_URL`.
pub const ENV_PREFIX: &str = "VANTAGE";

/// Loads the application configuration from `config.toml` in the working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads the configuration from the given file, layered under environment overrides.
///
/// The file is optional: every setting has a default. Environment variables win
/// over the file so that deployments can tweak single values.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

    finish(builder)
}

/// Deserializes and validates whatever sources the builder was given.
fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Rejects settings that would make the refresh loop misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("api.base_url must not be empty".to_string()));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.api.max_pages == 0 {
            return Err(ConfigError::ValidationError("api.max_pages must be at least 1".to_string()));
        }

        let intervals = [
            ("dashboard", self.refresh.dashboard_secs),
            ("agents", self.refresh.agents_secs),
            ("portfolio", self.refresh.portfolio_secs),
            ("positions", self.refresh.positions_secs),
            ("trades", self.refresh.trades_secs),
            ("strategies", self.refresh.strategies_secs),
            ("reports", self.refresh.reports_secs),
        ];
        if let Some((view, _)) = intervals.iter().find(|(_, secs)| *secs == Some(0)) {
            return Err(ConfigError::ValidationError(format!(
                "refresh.{view}_secs must be greater than zero (omit it to disable polling)"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(text: &str) -> Result<Config, ConfigError> {
        finish(config::Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.api.auth_scheme, "Token");
        assert_eq!(config.refresh.dashboard_secs, Some(30));
        assert_eq!(config.refresh.agents_secs, Some(10));
        assert_eq!(config.refresh.trades_secs, None);
        assert_eq!(config.dashboard.account_name, "simulation_main");
        assert!(config.history.equity_path.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = from_toml(
            r#"
            [api]
            base_url = "https://desk.example.com/api"

            [refresh]
            trades_secs = 60

            [logging]
            format = "compact"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://desk.example.com/api");
        assert_eq!(config.api.max_pages, 20);
        assert_eq!(config.refresh.trades_secs, Some(60));
        assert_eq!(config.refresh.agents_secs, Some(10));
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = from_toml("[refresh]\nagents_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("agents")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(from_toml("[api]\nrequest_timeout_secs = 0").is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let config = load_config_from(Path::new("definitely-not-here.toml")).unwrap();
        assert!(!config.api.base_url.is_empty());
    }
}
