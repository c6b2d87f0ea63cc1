pub mod config;
pub mod grid;
pub mod history;
pub mod registry;
pub mod tail;

#[cfg(test)]
mod mock;

pub use config::{StrategyConfig, StrategyFileConfig};
pub use grid::{GridParams, GridStrategy};
pub use history::FillHistory;
pub use registry::StrategyRegistry;
pub use tail::{TailBuyStrategy, TailParams};

use common::{Bar, Broker, Order, OrderEvent, TradeRecord};

/// All strategy implementations must satisfy this trait.
///
/// The backtest runner calls `on_order` for every broker notification and
/// `on_trade` for every closed round trip before calling `on_bar` with the
/// bar those events happened on.
pub trait Strategy: Send {
    /// Human-readable name of this strategy instance.
    fn name(&self) -> &str;

    /// The symbol this strategy trades (e.g. "600036").
    fn symbol(&self) -> &str;

    /// Evaluate the latest bar and optionally emit one order.
    fn on_bar(&mut self, bar: &Bar, broker: &dyn Broker) -> Option<Order>;

    /// React to an order status change.
    fn on_order(&mut self, event: &OrderEvent, broker: &mut dyn Broker);

    /// A position went back to flat.
    fn on_trade(&mut self, _trade: &TradeRecord, _broker: &dyn Broker) {}
}
