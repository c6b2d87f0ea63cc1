use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use common::{Bar, Broker, Order, OrderEvent, OrderSide, OrderStatus, TradeRecord};

use crate::history::FillHistory;
use crate::Strategy;

/// Thresholds for the grid/limit controller.
#[derive(Debug, Clone, PartialEq)]
pub struct GridParams {
    /// Entry discount below the bar open while flat (0.03 = 3%).
    pub open_ratio: f64,
    /// Distance between grid levels relative to the last grid buy.
    pub grid_ratio: f64,
    /// Gain over cost basis that closes the whole position.
    pub stop_profit_ratio: f64,
    /// Shares per lot.
    pub order_size: u64,
    /// Calendar days a limit order stays live after the bar it was placed on.
    pub valid_days: u64,
    /// Number of grid buys remembered.
    pub history_len: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            open_ratio: 0.03,
            grid_ratio: 0.05,
            stop_profit_ratio: 0.05,
            order_size: 100,
            valid_days: 1,
            history_len: FillHistory::DEFAULT_CAPACITY,
        }
    }
}

/// Grid trading with limit orders.
///
/// Opens with a discounted limit buy, then adds a lot each time price falls
/// `grid_ratio` below the last grid buy and trims a lot each time it rises
/// `grid_ratio` above it. A rise of `stop_profit_ratio` over the cost basis
/// exits everything. Only one order is ever in flight.
pub struct GridStrategy {
    name: String,
    symbol: String,
    params: GridParams,
    history: FillHistory,
    /// Id of the order currently owned by the broker.
    pending: Option<String>,
}

impl GridStrategy {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, params: GridParams) -> Self {
        let history = FillHistory::new(params.history_len);
        Self {
            name: name.into(),
            symbol: symbol.into(),
            params,
            history,
            pending: None,
        }
    }

    pub fn history(&self) -> &FillHistory {
        &self.history
    }

    pub fn pending_order(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    fn limit(&self, side: OrderSide, quantity: u64, price: f64, date: NaiveDate) -> Order {
        let order = Order::limit(&self.symbol, side, quantity, price);
        match date.checked_add_days(Days::new(self.params.valid_days)) {
            Some(expiry) => order.valid_until(expiry),
            None => order,
        }
    }

    /// First matching rule wins; returns the order to place, if any.
    fn decide(&self, bar: &Bar, broker: &dyn Broker) -> Option<Order> {
        let p = &self.params;
        let position = broker.position(&self.symbol);

        if position.is_flat() {
            let entry_price = bar.open * (1.0 - p.open_ratio);
            if bar.low <= entry_price {
                info!(
                    date = %bar.date,
                    price = entry_price,
                    qty = p.order_size,
                    "Opening with limit buy"
                );
                return Some(self.limit(OrderSide::Buy, p.order_size, entry_price, bar.date));
            }
            return None;
        }

        if position.size < 0 {
            return None;
        }

        let target_price = position.price * (1.0 + p.stop_profit_ratio);
        if bar.high >= target_price {
            info!(
                date = %bar.date,
                high = bar.high,
                target = target_price,
                qty = position.size,
                "Take-profit reached, selling full position"
            );
            return Some(self.limit(
                OrderSide::Sell,
                position.size.unsigned_abs(),
                target_price,
                bar.date,
            ));
        }

        let last_buy = self.history.last_buy_price()?;

        let trim_price = last_buy * (1.0 + p.grid_ratio);
        if bar.high >= trim_price {
            info!(
                date = %bar.date,
                price = trim_price,
                qty = p.order_size,
                "Grid trim, limit sell one lot"
            );
            return Some(self.limit(OrderSide::Sell, p.order_size, trim_price, bar.date));
        }

        let add_price = last_buy * (1.0 - p.grid_ratio);
        if bar.low <= add_price {
            if broker.cash() >= add_price * p.order_size as f64 {
                info!(
                    date = %bar.date,
                    price = add_price,
                    qty = p.order_size,
                    "Grid add, limit buy one lot"
                );
                return Some(self.limit(OrderSide::Buy, p.order_size, add_price, bar.date));
            }
            debug!(date = %bar.date, cash = broker.cash(), "Grid add skipped, not enough cash");
        }

        None
    }

    fn reconcile_fill(&mut self, event: &OrderEvent, broker: &mut dyn Broker) {
        let Some(exec) = event.executed else {
            warn!(order_id = %event.order.id, "Completed order without execution details");
            return;
        };

        if event.order.is_buy() {
            let position = broker.position(&self.symbol);
            self.history.record_buy(exec.price, position.price);
            info!(
                date = %exec.date,
                price = exec.price,
                cost = position.price,
                size = position.size,
                "Buy filled"
            );
            return;
        }

        if exec.size.unsigned_abs() == self.params.order_size {
            self.history.pop_latest();
        } else {
            self.history.clear();
        }
        let cost = self.history.last_cost().unwrap_or(0.0);
        broker.set_position_price(&self.symbol, cost);

        let position = broker.position(&self.symbol);
        info!(
            date = %exec.date,
            price = exec.price,
            cost = cost,
            size = position.size,
            "Sell filled"
        );
    }
}

impl Strategy for GridStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn on_bar(&mut self, bar: &Bar, broker: &dyn Broker) -> Option<Order> {
        if let Some(id) = &self.pending {
            debug!(date = %bar.date, order_id = %id, "Order in flight, waiting");
            return None;
        }

        let order = self.decide(bar, broker)?;
        self.pending = Some(order.id.clone());
        Some(order)
    }

    fn on_order(&mut self, event: &OrderEvent, broker: &mut dyn Broker) {
        match event.status {
            OrderStatus::Submitted | OrderStatus::Accepted => return,
            OrderStatus::Completed => self.reconcile_fill(event, broker),
            OrderStatus::Canceled
            | OrderStatus::Expired
            | OrderStatus::Margin
            | OrderStatus::Rejected => {
                info!(
                    order_id = %event.order.id,
                    side = %event.order.side,
                    status = %event.status,
                    "Order canceled/expired/margin/rejected"
                );
            }
        }

        if self.pending.as_deref() == Some(event.order.id.as_str()) {
            self.pending = None;
        }
    }

    fn on_trade(&mut self, trade: &TradeRecord, broker: &dyn Broker) {
        info!(pnl = trade.pnl, cash = broker.cash(), "Trade closed");
    }
}
