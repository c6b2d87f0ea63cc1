use std::fmt;

use chrono::NaiveDate;

use common::{EquityPoint, TradeRecord};

use crate::equity::{annualized_return, max_drawdown_pct, sharpe_ratio, yearly_returns};
use crate::trades::{trade_stats, TradeStats};

/// Yearly risk-free rate used for the Sharpe ratio.
pub const RISK_FREE_RATE: f64 = 0.01;

/// End-of-run performance report for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub symbol: String,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub start_cash: f64,
    pub final_value: f64,
    pub cash: f64,
    pub net_pnl: f64,
    pub sharpe: Option<f64>,
    pub max_drawdown_pct: f64,
    pub annualized_return_pct: f64,
    pub trades: TradeStats,
}

impl PerformanceSummary {
    pub fn compute(
        symbol: &str,
        start_cash: f64,
        final_value: f64,
        cash: f64,
        equity: &[EquityPoint],
        trades: &[TradeRecord],
    ) -> Self {
        let yearly = yearly_returns(start_cash, equity);
        Self {
            symbol: symbol.to_string(),
            first_date: equity.first().map(|p| p.date),
            last_date: equity.last().map(|p| p.date),
            start_cash,
            final_value,
            cash,
            net_pnl: final_value - start_cash,
            sharpe: sharpe_ratio(&yearly, RISK_FREE_RATE),
            max_drawdown_pct: max_drawdown_pct(start_cash, equity),
            annualized_return_pct: annualized_return(start_cash, final_value, equity.len()),
            trades: trade_stats(trades),
        }
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => writeln!(f, "Period:            {first} to {last}")?,
            _ => writeln!(f, "Period:            (no bars)")?,
        }
        writeln!(f, "Symbol:            {}", self.symbol)?;
        writeln!(f, "Initial cash:      {:.2}", self.start_cash)?;
        writeln!(
            f,
            "Final value:       {:.2} (cash {:.2})",
            self.final_value, self.cash
        )?;
        writeln!(f, "Net P&L:           {:.2}", self.net_pnl)?;
        match self.sharpe {
            Some(s) => writeln!(f, "Sharpe ratio:      {s:.4}")?,
            None => writeln!(f, "Sharpe ratio:      n/a")?,
        }
        writeln!(f, "Max drawdown:      {:.2}%", self.max_drawdown_pct)?;
        writeln!(f, "Total trades:      {}", self.trades.total)?;
        match self.trades.win_rate() {
            Some(rate) => writeln!(f, "Win rate:          {rate:.2}%")?,
            None => writeln!(f, "Win rate:          n/a")?,
        }
        write!(f, "Annualized return: {:.2}%", self.annualized_return_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_reports_zeroes() {
        let summary = PerformanceSummary::compute("600036", 100_000.0, 100_000.0, 100_000.0, &[], &[]);
        assert_eq!(summary.net_pnl, 0.0);
        assert_eq!(summary.max_drawdown_pct, 0.0);
        assert_eq!(summary.annualized_return_pct, 0.0);
        assert!(summary.sharpe.is_none());

        let text = summary.to_string();
        assert!(text.contains("(no bars)"));
        assert!(text.contains("Win rate:          n/a"));
    }

    #[test]
    fn net_pnl_and_period_from_equity() {
        let equity = vec![
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                value: 100_000.0,
            },
            EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                value: 100_500.0,
            },
        ];
        let summary =
            PerformanceSummary::compute("600036", 100_000.0, 100_500.0, 99_000.0, &equity, &[]);
        assert_eq!(summary.net_pnl, 500.0);
        assert!(summary.annualized_return_pct > 0.0);
        assert!(summary.to_string().contains("2024-01-02 to 2024-01-03"));
    }
}
