use tracing::info;

use common::{Bar, Broker, Order, OrderEvent, OrderSide, OrderStatus, TradeRecord};

use crate::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct TailParams {
    /// Shares per market order.
    pub order_size: u64,
    /// Intraday drop below the open that triggers the first buy while flat.
    pub open_drop: f64,
    /// Close below cost basis by this much adds one more lot.
    pub add_drop: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl Default for TailParams {
    fn default() -> Self {
        Self {
            order_size: 100,
            open_drop: 0.02,
            add_drop: 0.05,
            take_profit: 0.05,
            stop_loss: 0.20,
        }
    }
}

/// Late-session dip buying with market orders.
///
/// Buys one lot when the bar dips `open_drop` below its open while flat, or
/// when the close sits `add_drop` under the cost basis. Otherwise exits the
/// whole position on a `take_profit` high or a `stop_loss` close.
pub struct TailBuyStrategy {
    name: String,
    symbol: String,
    params: TailParams,
    last_buy_price: Option<f64>,
}

impl TailBuyStrategy {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, params: TailParams) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            params,
            last_buy_price: None,
        }
    }

    pub fn last_buy_price(&self) -> Option<f64> {
        self.last_buy_price
    }
}

impl Strategy for TailBuyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn on_bar(&mut self, bar: &Bar, broker: &dyn Broker) -> Option<Order> {
        let p = &self.params;
        let position = broker.position(&self.symbol);

        let open_condition = position.is_flat() && bar.low <= bar.open * (1.0 - p.open_drop);
        let add_condition = bar.low <= bar.close
            && bar.close <= position.price * (1.0 - p.add_drop)
            && broker.cash() >= bar.close * p.order_size as f64;

        if open_condition || add_condition {
            info!(date = %bar.date, close = bar.close, qty = p.order_size, "Tail buy");
            return Some(Order::market(&self.symbol, OrderSide::Buy, p.order_size));
        }

        if position.size <= 0 {
            return None;
        }

        let take_profit = bar.high >= position.price * (1.0 + p.take_profit);
        let stop_loss = bar.close < position.price * (1.0 - p.stop_loss);
        if take_profit || stop_loss {
            info!(
                date = %bar.date,
                cost = position.price,
                take_profit,
                stop_loss,
                qty = position.size,
                "Closing position"
            );
            return Some(Order::market(
                &self.symbol,
                OrderSide::Sell,
                position.size.unsigned_abs(),
            ));
        }

        None
    }

    fn on_order(&mut self, event: &OrderEvent, broker: &mut dyn Broker) {
        match (event.status, event.executed) {
            (OrderStatus::Completed, Some(exec)) if event.order.is_buy() => {
                self.last_buy_price = Some(exec.price);
                let position = broker.position(&self.symbol);
                info!(
                    date = %exec.date,
                    price = exec.price,
                    cost = position.price,
                    size = position.size,
                    "Buy filled"
                );
            }
            (OrderStatus::Completed, Some(exec)) => {
                info!(date = %exec.date, price = exec.price, "Sell filled");
            }
            (status, _) if status.is_terminal() => {
                info!(order_id = %event.order.id, status = %status, "Order canceled/margin/rejected");
            }
            _ => {}
        }
    }

    fn on_trade(&mut self, trade: &TradeRecord, broker: &dyn Broker) {
        info!(pnl = trade.pnl, cash = broker.cash(), "Trade closed");
    }
}
