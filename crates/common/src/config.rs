/// All configuration loaded from environment variables at startup.
/// Every variable is optional; unset or unparsable values fall back to the
/// defaults below.
#[derive(Debug, Clone)]
pub struct Config {
    // Broker
    pub start_cash: f64,
    /// Fraction of traded value charged per fill (0.002 = 0.2%).
    pub commission: f64,

    // Market data
    pub data_dir: String,

    // Strategy config file path
    pub strategy_config_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_cash: 100_000.0,
            commission: 0.002,
            data_dir: "data".to_string(),
            strategy_config_path: "config/strategies.toml".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let defaults = Self::default();
        Config {
            start_cash: optional_env("START_CASH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.start_cash),
            commission: optional_env("COMMISSION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.commission),
            data_dir: optional_env("DATA_DIR").unwrap_or(defaults.data_dir),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or(defaults.strategy_config_path),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
