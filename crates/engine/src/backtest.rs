use tracing::{debug, info};

use common::{Bar, Broker, EquityPoint, TradeRecord};
use paper::PaperBroker;
use strategy::Strategy;

/// Outcome of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: String,
    pub start_cash: f64,
    /// Cash plus holdings marked at the last close.
    pub final_value: f64,
    pub cash: f64,
    /// Portfolio value after every bar.
    pub equity: Vec<EquityPoint>,
    /// Closed round trips followed by any still open.
    pub trades: Vec<TradeRecord>,
    pub orders_submitted: usize,
}

/// Drives one strategy over a bar series against a `PaperBroker`.
///
/// For every bar, in this order: the broker matches pending orders, the
/// strategy receives each order event and each closed trade, then sees the
/// bar itself. An order returned from `on_bar` is submitted immediately and
/// can execute from the next bar on.
///
/// Strategies never submit orders themselves; this runner does.
pub struct Backtest {
    strategy: Box<dyn Strategy>,
    broker: PaperBroker,
    start_cash: f64,
}

impl Backtest {
    pub fn new(strategy: Box<dyn Strategy>, start_cash: f64, commission: f64) -> Self {
        Self {
            strategy,
            broker: PaperBroker::new(start_cash, commission),
            start_cash,
        }
    }

    pub fn run(mut self, bars: &[Bar]) -> BacktestResult {
        let symbol = self.strategy.symbol().to_string();
        info!(
            symbol = %symbol,
            strategy = %self.strategy.name(),
            bars = bars.len(),
            "Backtest starting"
        );

        let mut equity = Vec::with_capacity(bars.len());
        let mut orders_submitted = 0;

        for bar in bars {
            let report = self.broker.process_bar(&symbol, bar);
            for event in &report.events {
                self.strategy.on_order(event, &mut self.broker);
            }
            for trade in &report.closed_trades {
                self.strategy.on_trade(trade, &self.broker);
            }

            if let Some(order) = self.strategy.on_bar(bar, &self.broker) {
                debug!(date = %bar.date, order_id = %order.id, "Submitting order");
                self.broker.submit(order);
                orders_submitted += 1;
            }

            equity.push(EquityPoint {
                date: bar.date,
                value: self.broker.value(&symbol, bar.close),
            });
        }

        let final_value = equity.last().map_or(self.start_cash, |p| p.value);
        info!(
            symbol = %symbol,
            final_value = final_value,
            orders = orders_submitted,
            "Backtest finished"
        );

        BacktestResult {
            strategy: self.strategy.name().to_string(),
            symbol,
            start_cash: self.start_cash,
            final_value,
            cash: self.broker.cash(),
            equity,
            trades: self.broker.trades(),
            orders_submitted,
        }
    }
}
