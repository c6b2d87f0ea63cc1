use tracing::info;

use common::{Error, Result};

use crate::config::{StrategyConfig, StrategyFileConfig};
use crate::grid::{GridParams, GridStrategy};
use crate::history::FillHistory;
use crate::tail::{TailBuyStrategy, TailParams};
use crate::Strategy;

/// Known strategy types, also usable as names without a config file.
pub const STRATEGY_TYPES: [&str; 2] = ["grid", "tail"];

/// Holds the configured strategies and builds fresh instances per symbol.
pub struct StrategyRegistry {
    configs: Vec<StrategyConfig>,
}

impl StrategyRegistry {
    /// Validate every entry of the config file. Unknown types and invalid
    /// parameters are rejected up front.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Result<Self> {
        for cfg in &file_cfg.strategies {
            build_strategy(cfg, "_")
                .map_err(|e| Error::Config(format!("strategy '{}': {e}", cfg.name)))?;
            info!(name = %cfg.name, kind = %cfg.strategy_type, "Registered strategy");
        }
        Ok(Self {
            configs: file_cfg.strategies.clone(),
        })
    }

    /// Registry with one default-parameter entry per known type.
    pub fn builtin() -> Self {
        Self {
            configs: STRATEGY_TYPES.iter().map(|t| StrategyConfig::builtin(t)).collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.name.as_str())
    }

    /// Build a strategy for `symbol`. `name` is matched against configured
    /// names first, then against types; a bare type name falls back to its
    /// defaults.
    pub fn build(&self, name: &str, symbol: &str) -> Result<Box<dyn Strategy>> {
        let cfg = self
            .configs
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.configs.iter().find(|c| c.strategy_type == name))
            .cloned()
            .or_else(|| {
                STRATEGY_TYPES
                    .contains(&name)
                    .then(|| StrategyConfig::builtin(name))
            })
            .ok_or_else(|| Error::Config(format!("unknown strategy '{name}'")))?;

        build_strategy(&cfg, symbol).map_err(Error::Config)
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig, symbol: &str) -> Result<Box<dyn Strategy>, String> {
    if cfg.order_size == 0 {
        return Err("order_size must be > 0".to_string());
    }

    match cfg.strategy_type.as_str() {
        "grid" => {
            let defaults = GridParams::default();
            let params = GridParams {
                open_ratio: cfg.param_f64("open_ratio", defaults.open_ratio),
                grid_ratio: cfg.param_f64("grid_ratio", defaults.grid_ratio),
                stop_profit_ratio: cfg.param_f64("stop_profit_ratio", defaults.stop_profit_ratio),
                order_size: cfg.order_size,
                valid_days: cfg.param_u64("valid_days", defaults.valid_days),
                history_len: cfg.param_u64("history_len", FillHistory::DEFAULT_CAPACITY as u64)
                    as usize,
            };
            check_ratio("open_ratio", params.open_ratio)?;
            check_ratio("grid_ratio", params.grid_ratio)?;
            if params.stop_profit_ratio <= 0.0 {
                return Err("stop_profit_ratio must be > 0".to_string());
            }
            if params.history_len == 0 {
                return Err("history_len must be > 0".to_string());
            }
            Ok(Box::new(GridStrategy::new(cfg.name.clone(), symbol, params)))
        }
        "tail" => {
            let defaults = TailParams::default();
            let params = TailParams {
                order_size: cfg.order_size,
                open_drop: cfg.param_f64("open_drop", defaults.open_drop),
                add_drop: cfg.param_f64("add_drop", defaults.add_drop),
                take_profit: cfg.param_f64("take_profit", defaults.take_profit),
                stop_loss: cfg.param_f64("stop_loss", defaults.stop_loss),
            };
            check_ratio("open_drop", params.open_drop)?;
            check_ratio("add_drop", params.add_drop)?;
            check_ratio("stop_loss", params.stop_loss)?;
            if params.take_profit <= 0.0 {
                return Err("take_profit must be > 0".to_string());
            }
            Ok(Box::new(TailBuyStrategy::new(cfg.name.clone(), symbol, params)))
        }
        other => Err(format!("unknown type '{other}'")),
    }
}

/// Discount ratios must leave a positive price.
fn check_ratio(key: &str, value: f64) -> Result<(), String> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{key} must be in [0, 1), got {value}"))
    }
}
