use chrono::NaiveDate;

use common::Bar;
use engine::Backtest;
use strategy::{GridParams, GridStrategy, StrategyRegistry};

fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

fn grid() -> Box<GridStrategy> {
    Box::new(GridStrategy::new("grid", "600036", GridParams::default()))
}

/// Entry, one grid add, one grid trim, then take-profit on the rest.
fn grid_cycle() -> Vec<Bar> {
    vec![
        bar(2, 10.0, 10.1, 9.6, 9.9),   // limit buy @ 9.70
        bar(3, 9.8, 9.9, 9.65, 9.75),   // filled @ 9.70
        bar(4, 9.5, 9.55, 9.2, 9.3),    // grid add @ 9.215
        bar(5, 9.3, 9.4, 9.1, 9.2),     // filled @ 9.215
        bar(8, 9.6, 9.8, 9.55, 9.7),    // grid trim @ 9.67575
        bar(9, 9.7, 9.8, 9.6, 9.75),    // filled at open 9.70
        bar(10, 10.0, 10.3, 9.95, 10.2), // take-profit @ 10.185
        bar(11, 10.2, 10.25, 10.1, 10.2), // filled at open 10.20
    ]
}

#[test]
fn grid_cycle_round_trips_to_flat() {
    let result = Backtest::new(grid(), 100_000.0, 0.0).run(&grid_cycle());

    assert_eq!(result.orders_submitted, 4);
    assert_eq!(result.equity.len(), 8);
    assert_eq!(result.trades.len(), 1);
    assert!(result.trades[0].is_closed());

    // 970 + 921.5 spent, 970 + 1020 received.
    assert!((result.cash - 100_098.5).abs() < 1e-6, "cash {}", result.cash);
    assert!((result.final_value - result.cash).abs() < 1e-9);
}

#[test]
fn emptied_history_while_holding_exits_at_next_open() {
    // One-entry history: the grid add evicts the entry buy, the trim pops
    // the add, leaving 100 shares with a zero cost basis.
    let params = GridParams { history_len: 1, ..GridParams::default() };
    let strategy = Box::new(GridStrategy::new("grid", "600036", params));
    let mut bars = grid_cycle();
    bars.extend((12..=31).map(|d| bar(d, 10.2, 10.25, 10.1, 10.2)));

    let result = Backtest::new(strategy, 100_000.0, 0.0).run(&bars);

    // Entry, add, trim, then the zero-cost take-profit filled at the open 10.00.
    assert_eq!(result.orders_submitted, 4);
    assert_eq!(result.trades.len(), 1);
    assert!(result.trades[0].is_closed());
    assert_eq!(result.trades[0].closed, NaiveDate::from_ymd_opt(2024, 1, 10));
    assert!((result.cash - 100_078.5).abs() < 1e-6, "cash {}", result.cash);
    assert!((result.final_value - result.cash).abs() < 1e-9);
}

#[test]
fn commission_reduces_final_value() {
    let free = Backtest::new(grid(), 100_000.0, 0.0).run(&grid_cycle());
    let charged = Backtest::new(grid(), 100_000.0, 0.002).run(&grid_cycle());
    assert!(charged.final_value < free.final_value);
    assert!(charged.trades[0].pnl_comm < charged.trades[0].pnl);
}

#[test]
fn expired_entry_is_retried_on_a_later_bar() {
    let bars = vec![
        bar(2, 10.0, 10.1, 9.6, 9.9),  // limit buy @ 9.70, valid through the 3rd
        bar(3, 10.0, 10.2, 9.9, 10.1), // not touched, still pending
        bar(4, 10.0, 10.1, 9.6, 9.8),  // expired, new entry order
    ];
    let result = Backtest::new(grid(), 100_000.0, 0.0).run(&bars);

    assert_eq!(result.orders_submitted, 2);
    assert!(result.trades.is_empty());
    assert_eq!(result.final_value, 100_000.0);
}

#[test]
fn cash_shortfall_never_submits_grid_add() {
    // One lot at 9.70 leaves 30 in cash; the add needs 921.5.
    let result = Backtest::new(grid(), 1_000.0, 0.0).run(&grid_cycle()[..4]);
    assert_eq!(result.orders_submitted, 1);
    assert!((result.cash - 30.0).abs() < 1e-9);
}

#[test]
fn empty_series_keeps_starting_cash() {
    let result = Backtest::new(grid(), 50_000.0, 0.002).run(&[]);
    assert_eq!(result.final_value, 50_000.0);
    assert!(result.equity.is_empty());
}

#[test]
fn tail_strategy_from_registry_runs() {
    let strategy = StrategyRegistry::builtin().build("tail", "600036").unwrap();
    let bars = vec![
        bar(2, 10.0, 10.1, 9.7, 9.9),    // dip → market buy
        bar(3, 9.9, 10.0, 9.8, 9.95),    // filled at open 9.90
        bar(4, 10.0, 10.5, 9.95, 10.3),  // high ≥ 10.395 → market sell
        bar(5, 10.3, 10.4, 10.2, 10.3),  // filled at open 10.30
    ];
    let result = Backtest::new(strategy, 100_000.0, 0.0).run(&bars);

    assert_eq!(result.strategy, "tail");
    assert_eq!(result.trades.len(), 1);
    assert!((result.trades[0].pnl - 40.0).abs() < 1e-9);
}
