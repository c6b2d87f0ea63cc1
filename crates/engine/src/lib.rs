pub mod backtest;
pub mod feed;

pub use backtest::{Backtest, BacktestResult};
pub use feed::FileBarSource;
