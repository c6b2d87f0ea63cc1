use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use common::{Error, Result};

/// Top-level strategy config file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// type = "grid"
/// name = "grid-3pct"
/// order_size = 100
///
/// [strategy.params]
/// open_ratio = 0.03
/// grid_ratio = 0.05
/// stop_profit_ratio = 0.05
/// valid_days = 1
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier: "grid" or "tail".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Human-readable name shown in logs and selected with `--strategy`.
    pub name: String,
    /// Shares per lot.
    #[serde(default = "default_order_size")]
    pub order_size: u64,
    /// Strategy-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

fn default_order_size() -> u64 {
    100
}

impl StrategyConfig {
    /// Config for `strategy_type` with every parameter at its default.
    pub fn builtin(strategy_type: &str) -> Self {
        Self {
            strategy_type: strategy_type.to_string(),
            name: strategy_type.to_string(),
            order_size: default_order_size(),
            params: HashMap::new(),
        }
    }

    pub fn param_f64(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
            .unwrap_or(default)
    }

    pub fn param_u64(&self, key: &str, default: u64) -> u64 {
        self.params
            .get(key)
            .and_then(|v| v.as_integer())
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(default)
    }
}

impl StrategyFileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read strategy config at '{}': {e}",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }
}
