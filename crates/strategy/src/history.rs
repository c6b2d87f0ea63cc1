use std::collections::VecDeque;

/// Bounded record of the most recent grid buys.
///
/// Holds two parallel sequences: the executed price of each buy and the
/// position cost basis right after it. Both sequences always have the same
/// length; once `capacity` is reached the oldest entry of each is dropped.
#[derive(Debug, Clone)]
pub struct FillHistory {
    buy_prices: VecDeque<f64>,
    costs: VecDeque<f64>,
    capacity: usize,
}

impl FillHistory {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FillHistory capacity must be > 0");
        Self {
            buy_prices: VecDeque::with_capacity(capacity),
            costs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a buy fill and the cost basis it produced.
    pub fn record_buy(&mut self, price: f64, cost: f64) {
        if self.buy_prices.len() == self.capacity {
            self.buy_prices.pop_front();
            self.costs.pop_front();
        }
        self.buy_prices.push_back(price);
        self.costs.push_back(cost);
    }

    /// Drop the most recent entry. Returns `(buy_price, cost)` if there was one.
    pub fn pop_latest(&mut self) -> Option<(f64, f64)> {
        let price = self.buy_prices.pop_back()?;
        let cost = self.costs.pop_back()?;
        Some((price, cost))
    }

    pub fn clear(&mut self) {
        self.buy_prices.clear();
        self.costs.clear();
    }

    pub fn last_buy_price(&self) -> Option<f64> {
        self.buy_prices.back().copied()
    }

    pub fn last_cost(&self) -> Option<f64> {
        self.costs.back().copied()
    }

    pub fn len(&self) -> usize {
        self.buy_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy_prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of recorded cost entries. Equal to `len()` at all times.
    pub fn cost_len(&self) -> usize {
        self.costs.len()
    }
}

impl Default for FillHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_no_reference_price() {
        let history = FillHistory::default();
        assert!(history.is_empty());
        assert!(history.last_buy_price().is_none());
        assert!(history.last_cost().is_none());
    }

    #[test]
    fn pop_returns_latest_pair() {
        let mut history = FillHistory::default();
        history.record_buy(9.70, 9.70);
        history.record_buy(9.215, 9.4575);
        assert_eq!(history.pop_latest(), Some((9.215, 9.4575)));
        assert_eq!(history.last_buy_price(), Some(9.70));
        assert_eq!(history.last_cost(), Some(9.70));
    }

    #[test]
    fn oldest_entry_evicted_at_capacity() {
        let mut history = FillHistory::new(3);
        for i in 0..5 {
            history.record_buy(i as f64, 100.0 + i as f64);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cost_len(), 3);
        assert_eq!(history.last_buy_price(), Some(4.0));

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.cost_len(), 0);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_rejected() {
        let _ = FillHistory::new(0);
    }
}
