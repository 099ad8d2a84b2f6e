//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger posting policy.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// What the posting engine does with a date inside a Closed period.
///
/// Locked periods are always refused regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedPeriodPolicy {
    /// Post anyway and report a warning to the caller.
    #[default]
    Allow,
    /// Refuse with a closed-period error.
    Reject,
}

/// Ledger configuration, company-wide.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Prefix of generated entry numbers (`JE-2026-0001`).
    #[serde(default = "default_entry_number_prefix")]
    pub entry_number_prefix: String,
    /// Closed-period posting policy.
    #[serde(default)]
    pub closed_period_policy: ClosedPeriodPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            entry_number_prefix: default_entry_number_prefix(),
            closed_period_policy: ClosedPeriodPolicy::default(),
        }
    }
}

fn default_entry_number_prefix() -> String {
    "JE".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "tally=info,seeder=info,sea_orm=warn".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__LEDGER__CLOSED_PERIOD_POLICY", None),
                ("TALLY__LEDGER__ENTRY_NUMBER_PREFIX", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.entry_number_prefix, "JE");
                assert_eq!(config.ledger.closed_period_policy, ClosedPeriodPolicy::Allow);
                assert!(!config.logging.json);
            },
        );
    }

    #[test]
    fn test_load_ledger_policy_override() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__LEDGER__CLOSED_PERIOD_POLICY", Some("reject")),
                ("TALLY__LEDGER__ENTRY_NUMBER_PREFIX", Some("GL")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.closed_period_policy, ClosedPeriodPolicy::Reject);
                assert_eq!(config.ledger.entry_number_prefix, "GL");
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars([("TALLY__DATABASE__URL", None::<&str>)], || {
            assert!(AppConfig::load().is_err());
        });
    }
}
