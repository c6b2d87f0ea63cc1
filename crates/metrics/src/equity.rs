//! Helpers for equity-curve derived metrics.

use chrono::Datelike;

use common::EquityPoint;

/// Trading days per year used to annualize per-bar returns.
pub const BARS_PER_YEAR: f64 = 252.0;

/// Maximum drawdown from the running high-water mark, in percent.
///
/// The high-water mark starts at `start_value`, so a curve that only ever
/// falls still reports its loss.
#[must_use]
pub fn max_drawdown_pct(start_value: f64, equity: &[EquityPoint]) -> f64 {
    let mut high_water = start_value;
    let mut max_dd: f64 = 0.0;

    for point in equity {
        if point.value > high_water {
            high_water = point.value;
        } else if high_water > 0.0 {
            let dd = (high_water - point.value) / high_water;
            max_dd = max_dd.max(dd);
        }
    }

    max_dd.clamp(0.0, 1.0) * 100.0
}

/// Calendar-year returns. Each year is measured from the previous year's
/// last value (the first from `start_value`) to its own last value; a
/// trailing partial year counts as a year.
#[must_use]
pub fn yearly_returns(start_value: f64, equity: &[EquityPoint]) -> Vec<f64> {
    let mut returns = Vec::new();
    let mut base = start_value;

    let mut iter = equity.iter().peekable();
    while let Some(point) = iter.next() {
        let year_ends = iter
            .peek()
            .map_or(true, |next| next.date.year() != point.date.year());
        if year_ends {
            if base > 0.0 {
                returns.push(point.value / base - 1.0);
            }
            base = point.value;
        }
    }

    returns
}

/// Sharpe ratio of yearly returns over `risk_free` (yearly rate), using
/// the population standard deviation. `None` when fewer than two returns
/// are available or their spread is zero.
#[must_use]
pub fn sharpe_ratio(yearly: &[f64], risk_free: f64) -> Option<f64> {
    if yearly.len() < 2 {
        return None;
    }

    let n = yearly.len() as f64;
    let excess: Vec<f64> = yearly.iter().map(|r| r - risk_free).collect();
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return None;
    }
    Some(mean / std_dev)
}

/// Annualized return in percent, compounding the average log return per
/// bar over [`BARS_PER_YEAR`] bars.
#[must_use]
pub fn annualized_return(start_value: f64, end_value: f64, bars: usize) -> f64 {
    if bars == 0 || start_value <= 0.0 {
        return 0.0;
    }
    if end_value <= 0.0 {
        return -100.0;
    }
    let per_bar = (end_value / start_value).ln() / bars as f64;
    ((per_bar * BARS_PER_YEAR).exp() - 1.0) * 100.0
}
