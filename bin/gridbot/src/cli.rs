use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gridbot")]
#[command(about = "Backtest rule-based equity strategies on daily bars", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Backtest one symbol and print its performance summary
    Run {
        /// Stock code, matching a bar file in the data directory
        #[arg(long, default_value = "600036")]
        symbol: String,

        #[command(flatten)]
        window: Window,
    },

    /// Backtest every symbol in the data directory and rank them
    Screen {
        /// Maximum number of symbols to run
        #[arg(long, default_value_t = 3000)]
        limit: usize,

        /// Number of ranked symbols to print
        #[arg(long, default_value_t = 10)]
        top: usize,

        #[command(flatten)]
        window: Window,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct Window {
    /// First bar date, YYYYMMDD
    #[arg(long = "start_date", default_value = "20140101", value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Last bar date, YYYYMMDD or "today"
    #[arg(long = "end_date", default_value = "today", value_parser = parse_date)]
    pub end_date: NaiveDate,

    /// Strategy name or type from the strategy config
    #[arg(long, default_value = "grid")]
    pub strategy: String,
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| format!("'{s}' is not YYYYMMDD: {e}"))
}
