use std::collections::HashMap;

use common::{Broker, Order, Position};

/// In-memory broker for strategy unit tests. Records submitted orders and
/// never fills anything on its own.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockBroker {
    cash: f64,
    positions: HashMap<String, Position>,
    pub submitted: Vec<Order>,
}

impl MockBroker {
    pub(crate) fn new(cash: f64) -> Self {
        Self { cash, ..Self::default() }
    }

    pub(crate) fn holding(mut self, symbol: &str, size: i64, price: f64) -> Self {
        self.positions.insert(
            symbol.to_string(),
            Position { symbol: symbol.to_string(), size, price },
        );
        self
    }
}

impl Broker for MockBroker {
    fn submit(&mut self, order: Order) -> String {
        let id = order.id.clone();
        self.submitted.push(order);
        id
    }

    fn cancel(&mut self, order_id: &str) {
        self.submitted.retain(|o| o.id != order_id);
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
