use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Bars are delivered to strategies oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// How the broker is allowed to execute an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Executes at the open of the next bar.
    Market,
    /// Executes only at `price` or better.
    Limit,
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Market => write!(f, "market"),
            OrderKind::Limit => write!(f, "limit"),
        }
    }
}

/// An order handed to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub kind: OrderKind,
    /// Number of shares, always positive.
    pub quantity: u64,
    /// `None` for market orders.
    pub price: Option<f64>,
    /// Last date the order may execute on. `None` = good until canceled.
    pub valid_until: Option<NaiveDate>,
}

impl Order {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            kind: OrderKind::Market,
            quantity,
            price: None,
            valid_until: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: OrderSide, quantity: u64, price: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            kind: OrderKind::Limit,
            quantity,
            price: Some(price),
            valid_until: None,
        }
    }

    pub fn valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }
}

/// Lifecycle status reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Expired,
    /// Not enough cash to cover the fill.
    Margin,
    Rejected,
}

impl OrderStatus {
    /// True once the broker has let go of the order.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Submitted => "submitted",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Expired => "expired",
            OrderStatus::Margin => "margin",
            OrderStatus::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// Execution details of a completed order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub date: NaiveDate,
    pub price: f64,
    /// Signed share count: positive for buys, negative for sells.
    pub size: i64,
    pub commission: f64,
}

/// Notification emitted by the broker whenever an order changes status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order: Order,
    pub status: OrderStatus,
    /// Present only when `status == Completed`.
    pub executed: Option<Execution>,
}

/// Holdings in one symbol as seen by the broker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed share count. Zero means flat.
    pub size: i64,
    /// Average cost basis of the shares held; zero when flat.
    pub price: f64,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            size: 0,
            price: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }
}

/// A round trip from flat back to flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub opened: NaiveDate,
    pub closed: Option<NaiveDate>,
    /// Realized profit before commission.
    pub pnl: f64,
    /// Realized profit after commission.
    pub pnl_comm: f64,
    pub commission: f64,
}

impl TradeRecord {
    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }
}

/// One point on the portfolio value curve, recorded after every bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_order_carries_price_and_expiry() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let order = Order::limit("600036", OrderSide::Buy, 100, 9.7).valid_until(date);
        assert_eq!(order.kind, OrderKind::Limit);
        assert_eq!(order.price, Some(9.7));
        assert_eq!(order.valid_until, Some(date));
        assert!(order.is_buy());
    }

    #[test]
    fn market_orders_get_unique_ids() {
        let a = Order::market("600036", OrderSide::Sell, 100);
        let b = Order::market("600036", OrderSide::Sell, 100);
        assert_ne!(a.id, b.id);
        assert!(a.price.is_none());
        assert!(a.is_sell());
    }

    #[test]
    fn only_submitted_and_accepted_are_live() {
        assert!(!OrderStatus::Submitted.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        for status in [
            OrderStatus::Completed,
            OrderStatus::Canceled,
            OrderStatus::Expired,
            OrderStatus::Margin,
            OrderStatus::Rejected,
        ] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
    }
}
