use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use common::{
    Bar, Broker, Execution, Order, OrderEvent, OrderKind, OrderSide, OrderStatus, Position,
    TradeRecord,
};

/// Everything the broker reports after matching one bar.
#[derive(Debug, Clone, Default)]
pub struct BarReport {
    /// Order status changes, in the order they happened.
    pub events: Vec<OrderEvent>,
    /// Round trips that went flat on this bar.
    pub closed_trades: Vec<TradeRecord>,
}

/// Simulated broker for backtests.
///
/// Orders submitted while a bar is being evaluated are matched against the
/// following bars: market orders fill at the open, limit orders at the
/// open or their limit, whichever is better for the order. Long only; every
/// fill pays `commission × traded value`.
pub struct PaperBroker {
    cash: f64,
    /// Fraction of traded value charged per fill.
    commission: f64,
    positions: HashMap<String, Position>,
    /// Orders received since the last bar, reported as accepted on the next one.
    submitted: Vec<Order>,
    /// Accepted orders waiting for a matching bar.
    pending: Vec<Order>,
    /// Events raised outside bar processing (cancellations).
    notices: Vec<OrderEvent>,
    open_trades: HashMap<String, TradeRecord>,
    closed_trades: Vec<TradeRecord>,
}

impl PaperBroker {
    pub fn new(start_cash: f64, commission: f64) -> Self {
        info!(cash = start_cash, commission = commission, "PaperBroker initialized");
        Self {
            cash: start_cash,
            commission,
            positions: HashMap::new(),
            submitted: Vec::new(),
            pending: Vec::new(),
            notices: Vec::new(),
            open_trades: HashMap::new(),
            closed_trades: Vec::new(),
        }
    }

    /// Match all live orders for `symbol` against `bar`.
    pub fn process_bar(&mut self, symbol: &str, bar: &Bar) -> BarReport {
        let mut report = BarReport {
            events: std::mem::take(&mut self.notices),
            closed_trades: Vec::new(),
        };

        for order in std::mem::take(&mut self.submitted) {
            if let Some(reason) = invalid_reason(&order) {
                debug!(order_id = %order.id, reason, "Order rejected on submission");
                report.events.push(event(order, OrderStatus::Rejected, None));
                continue;
            }
            report.events.push(event(order.clone(), OrderStatus::Accepted, None));
            self.pending.push(order);
        }

        for order in std::mem::take(&mut self.pending) {
            if order.symbol != symbol {
                self.pending.push(order);
                continue;
            }

            if order.valid_until.is_some_and(|valid| bar.date > valid) {
                debug!(order_id = %order.id, date = %bar.date, "Order expired");
                report.events.push(event(order, OrderStatus::Expired, None));
                continue;
            }

            match match_price(&order, bar) {
                Some(price) => {
                    let ev = self.execute(order, price, bar.date, &mut report.closed_trades);
                    report.events.push(ev);
                }
                None => self.pending.push(order),
            }
        }

        report
    }

    /// Cash plus holdings, with `symbol` marked at `close` and everything
    /// else at cost.
    pub fn value(&self, symbol: &str, close: f64) -> f64 {
        let holdings: f64 = self
            .positions
            .values()
            .map(|p| {
                let mark = if p.symbol == symbol { close } else { p.price };
                p.size as f64 * mark
            })
            .sum();
        self.cash + holdings
    }

    /// Closed round trips followed by any still open.
    pub fn trades(&self) -> Vec<TradeRecord> {
        let mut all = self.closed_trades.clone();
        all.extend(self.open_trades.values().cloned());
        all
    }

    /// Orders the broker still owns.
    pub fn live_orders(&self) -> usize {
        self.submitted.len() + self.pending.len()
    }

    fn execute(
        &mut self,
        order: Order,
        price: f64,
        date: NaiveDate,
        closed: &mut Vec<TradeRecord>,
    ) -> OrderEvent {
        let qty = order.quantity as i64;
        let value = price * order.quantity as f64;
        let commission = value * self.commission;
        let position = self
            .positions
            .entry(order.symbol.clone())
            .or_insert_with(|| Position::flat(&order.symbol));

        let (signed, pnl) = match order.side {
            OrderSide::Buy => {
                if value + commission > self.cash {
                    debug!(
                        order_id = %order.id,
                        needed = value + commission,
                        cash = self.cash,
                        "Not enough cash for fill"
                    );
                    return event(order, OrderStatus::Margin, None);
                }
                self.cash -= value + commission;
                let new_size = position.size + qty;
                position.price =
                    (position.price * position.size as f64 + value) / new_size as f64;
                position.size = new_size;
                (qty, 0.0)
            }
            OrderSide::Sell => {
                if qty > position.size {
                    debug!(
                        order_id = %order.id,
                        qty = qty,
                        held = position.size,
                        "Sell exceeds holdings"
                    );
                    return event(order, OrderStatus::Rejected, None);
                }
                self.cash += value - commission;
                let pnl = qty as f64 * (price - position.price);
                position.size -= qty;
                if position.size == 0 {
                    position.price = 0.0;
                }
                (-qty, pnl)
            }
        };
        let size_after = position.size;

        debug!(
            order_id = %order.id,
            side = %order.side,
            kind = %order.kind,
            price = price,
            qty = qty,
            commission = commission,
            "Paper fill simulated"
        );

        self.book_trade(&order.symbol, date, pnl, commission, size_after, closed);

        let executed = Execution {
            date,
            price,
            size: signed,
            commission,
        };
        event(order, OrderStatus::Completed, Some(executed))
    }

    fn book_trade(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        pnl: f64,
        commission: f64,
        size_after: i64,
        closed: &mut Vec<TradeRecord>,
    ) {
        let trade = self
            .open_trades
            .entry(symbol.to_string())
            .or_insert_with(|| TradeRecord {
                symbol: symbol.to_string(),
                opened: date,
                closed: None,
                pnl: 0.0,
                pnl_comm: 0.0,
                commission: 0.0,
            });
        trade.pnl += pnl;
        trade.commission += commission;
        trade.pnl_comm = trade.pnl - trade.commission;

        if size_after != 0 {
            return;
        }
        if let Some(mut trade) = self.open_trades.remove(symbol) {
            trade.closed = Some(date);
            info!(
                symbol = %trade.symbol,
                pnl = trade.pnl,
                pnl_comm = trade.pnl_comm,
                "Trade closed"
            );
            self.closed_trades.push(trade.clone());
            closed.push(trade);
        }
    }
}

impl Broker for PaperBroker {
    fn submit(&mut self, order: Order) -> String {
        debug!(
            order_id = %order.id,
            symbol = %order.symbol,
            side = %order.side,
            kind = %order.kind,
            qty = order.quantity,
            price = ?order.price,
            "Order submitted"
        );
        let id = order.id.clone();
        self.submitted.push(order);
        id
    }

    fn cancel(&mut self, order_id: &str) {
        for queue in [&mut self.submitted, &mut self.pending] {
            if let Some(idx) = queue.iter().position(|o| o.id == order_id) {
                let order = queue.remove(idx);
                self.notices.push(event(order, OrderStatus::Canceled, None));
                return;
            }
        }
    }

    fn position(&self, symbol: &str) -> Position {
        self.positions
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Position::flat(symbol))
    }

    fn cash(&self) -> f64 {
        self.cash
    }

    fn set_position_price(&mut self, symbol: &str, price: f64) {
        self.positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::flat(symbol))
            .price = price;
    }
}

fn event(order: Order, status: OrderStatus, executed: Option<Execution>) -> OrderEvent {
    OrderEvent {
        order,
        status,
        executed,
    }
}

fn invalid_reason(order: &Order) -> Option<&'static str> {
    if order.quantity == 0 || i64::try_from(order.quantity).is_err() {
        return Some("quantity out of range");
    }
    match (order.kind, order.price) {
        (OrderKind::Limit, None) => Some("limit order without price"),
        (OrderKind::Limit, Some(p)) if !p.is_finite() || p < 0.0 => Some("invalid limit price"),
        // A sell limit at zero trades at the open; a buy limit at zero never trades.
        (OrderKind::Limit, Some(p)) if order.is_buy() && p == 0.0 => Some("zero buy limit price"),
        _ => None,
    }
}

/// Execution price for `order` on `bar`, if it trades at all.
fn match_price(order: &Order, bar: &Bar) -> Option<f64> {
    let limit = match (order.kind, order.price) {
        (OrderKind::Market, _) => return Some(bar.open),
        (OrderKind::Limit, Some(limit)) => limit,
        (OrderKind::Limit, None) => return None,
    };

    match order.side {
        OrderSide::Buy if bar.open <= limit => Some(bar.open),
        OrderSide::Buy if bar.low <= limit => Some(limit),
        OrderSide::Sell if bar.open >= limit => Some(bar.open),
        OrderSide::Sell if bar.high >= limit => Some(limit),
        _ => None,
    }
}
