//! Performance statistics computed from a backtest's equity curve and trades.

pub mod equity;
pub mod summary;
pub mod trades;

pub use equity::{annualized_return, max_drawdown_pct, sharpe_ratio, yearly_returns};
pub use summary::PerformanceSummary;
pub use trades::{trade_stats, TradeStats};
