mod cli;

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{BarSource, Config};
use engine::{Backtest, FileBarSource};
use metrics::PerformanceSummary;
use strategy::{StrategyFileConfig, StrategyRegistry};

use cli::{Cli, Commands, Window};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        start_cash = cfg.start_cash,
        commission = cfg.commission,
        data_dir = %cfg.data_dir,
        "GridBot starting"
    );

    // ── Strategy registry ─────────────────────────────────────────────────────
    let registry = load_registry(&cfg.strategy_config_path)?;
    let source = FileBarSource::new(&cfg.data_dir);

    match cli.command {
        Commands::Run { symbol, window } => {
            match backtest_symbol(&source, &registry, &cfg, &symbol, &window).await {
                Ok(summary) => println!("{summary}"),
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Backtest aborted");
                    return Err(e);
                }
            }
        }
        Commands::Screen { limit, top, window } => {
            screen(&source, &registry, &cfg, limit, top, &window).await?;
        }
    }

    Ok(())
}

fn load_registry(path: &str) -> anyhow::Result<StrategyRegistry> {
    if !Path::new(path).exists() {
        info!(path, "No strategy config file, using built-in strategies");
        return Ok(StrategyRegistry::builtin());
    }
    let file = StrategyFileConfig::load(path)
        .with_context(|| format!("loading strategy config {path}"))?;
    let registry = StrategyRegistry::from_config(&file)?;
    info!(path, strategies = ?registry.names().collect::<Vec<_>>(), "Strategy config loaded");
    Ok(registry)
}

async fn backtest_symbol(
    source: &FileBarSource,
    registry: &StrategyRegistry,
    cfg: &Config,
    symbol: &str,
    window: &Window,
) -> anyhow::Result<PerformanceSummary> {
    check_window(window.start_date, window.end_date)?;
    let bars = source.load(symbol, window.start_date, window.end_date).await?;
    let strategy = registry.build(&window.strategy, symbol)?;

    let result = Backtest::new(strategy, cfg.start_cash, cfg.commission).run(&bars);
    for trade in result.trades.iter().filter(|t| !t.is_closed()) {
        info!(symbol, opened = %trade.opened, pnl = trade.pnl, "Trade still open at end of data");
    }

    Ok(PerformanceSummary::compute(
        &result.symbol,
        result.start_cash,
        result.final_value,
        result.cash,
        &result.equity,
        &result.trades,
    ))
}

async fn screen(
    source: &FileBarSource,
    registry: &StrategyRegistry,
    cfg: &Config,
    limit: usize,
    top: usize,
    window: &Window,
) -> anyhow::Result<()> {
    check_window(window.start_date, window.end_date)?;
    let symbols = source
        .symbols()
        .await
        .with_context(|| format!("listing {}", source.dir().display()))?;
    info!(found = symbols.len(), limit, "Screening symbols");

    let mut ranked = Vec::new();
    for symbol in symbols.iter().take(limit) {
        match backtest_symbol(source, registry, cfg, symbol, window).await {
            Ok(summary) => {
                println!("{summary}\n");
                ranked.push(summary);
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "Skipping symbol"),
        }
    }

    rank_by_annualized_return(&mut ranked);
    println!("Top {} by annualized return:", top.min(ranked.len()));
    for (i, s) in ranked.iter().take(top).enumerate() {
        println!(
            "{:>3}. {:<10} {:>8.2}%  value {:.2}",
            i + 1,
            s.symbol,
            s.annualized_return_pct,
            s.final_value
        );
    }
    Ok(())
}

fn check_window(start: NaiveDate, end: NaiveDate) -> anyhow::Result<()> {
    if start > end {
        anyhow::bail!("start date {start} is after end date {end}");
    }
    Ok(())
}

fn rank_by_annualized_return(summaries: &mut [PerformanceSummary]) {
    summaries.sort_by(|a, b| b.annualized_return_pct.total_cmp(&a.annualized_return_pct));
}
