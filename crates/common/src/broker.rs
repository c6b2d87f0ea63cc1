use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{Bar, Order, Position, Result};

/// Abstraction over order execution and account state.
///
/// `PaperBroker` implements this for backtests. Strategies only ever see a
/// `&dyn Broker`; the backtest runner is the one component that calls
/// `submit`, so every order a strategy emits passes through it.
pub trait Broker {
    /// Queue an order for execution on a later bar. Returns the order id.
    fn submit(&mut self, order: Order) -> String;

    /// Cancel a pending order. Unknown or already-terminal ids are ignored.
    fn cancel(&mut self, order_id: &str);

    /// Current holdings in `symbol`; flat when nothing is held.
    fn position(&self, symbol: &str) -> Position;

    /// Cash available for new purchases.
    fn cash(&self) -> f64;

    /// Overwrite the recorded cost basis of a position.
    fn set_position_price(&mut self, symbol: &str, price: f64);
}

/// Source of historical bars for a symbol.
///
/// Implementations return bars sorted oldest first, restricted to
/// `start..=end`. An empty vector means no data and aborts the run.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn load(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>>;
}
