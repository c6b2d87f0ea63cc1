use common::TradeRecord;

/// Trade counts over a run. Break-even closed trades count as won; open
/// trades count toward `total` but are neither won nor lost.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TradeStats {
    pub total: usize,
    pub closed: usize,
    pub won: usize,
    pub lost: usize,
}

impl TradeStats {
    /// Won trades as a percentage of all trades, `None` with no trades.
    pub fn win_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.won as f64 / self.total as f64 * 100.0)
    }
}

pub fn trade_stats(trades: &[TradeRecord]) -> TradeStats {
    let mut stats = TradeStats {
        total: trades.len(),
        ..TradeStats::default()
    };
    for trade in trades.iter().filter(|t| t.is_closed()) {
        stats.closed += 1;
        if trade.pnl_comm >= 0.0 {
            stats.won += 1;
        } else {
            stats.lost += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(pnl_comm: f64, closed: bool) -> TradeRecord {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        TradeRecord {
            symbol: "600036".into(),
            opened: day,
            closed: closed.then_some(day),
            pnl: pnl_comm,
            pnl_comm,
            commission: 0.0,
        }
    }

    #[test]
    fn counts_wins_losses_and_open() {
        let stats = trade_stats(&[
            trade(12.0, true),
            trade(-3.0, true),
            trade(5.0, true),
            trade(0.0, true),
            trade(0.0, false),
        ]);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.closed, 4);
        assert_eq!(stats.won, 3);
        assert_eq!(stats.lost, 1);
        assert!((stats.win_rate().unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn no_trades_has_no_win_rate() {
        assert_eq!(trade_stats(&[]).win_rate(), None);
    }
}
