use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use common::{Bar, BarSource, Error, Result};

/// Reads daily bars from `<dir>/<symbol>.csv` or `<dir>/<symbol>.json`.
///
/// CSV files need a header row naming `date,open,high,low,close` (plus an
/// optional `volume`) in any order; extra columns are ignored. JSON files
/// hold an array of objects with the same fields. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct FileBarSource {
    dir: PathBuf,
}

impl FileBarSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Symbols with a bar file in the data directory, sorted.
    pub async fn symbols(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut symbols = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_bar_file = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("csv") | Some("json")
            );
            if !is_bar_file {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    async fn read_bars(&self, symbol: &str) -> Result<Vec<Bar>> {
        let csv_path = self.dir.join(format!("{symbol}.csv"));
        match tokio::fs::read(&csv_path).await {
            Ok(bytes) => return parse_csv(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let json_path = self.dir.join(format!("{symbol}.json"));
        match tokio::fs::read(&json_path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::Data(format!(
                "no bar file for '{symbol}' in {}",
                self.dir.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BarSource for FileBarSource {
    async fn load(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
        let mut bars = self.read_bars(symbol).await?;
        debug!(symbol, rows = bars.len(), "Bar file read");

        bars.retain(|b| b.date >= start && b.date <= end);
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        if let Some(bad) = bars.iter().find(|b| !is_sane(b)) {
            return Err(Error::Data(format!(
                "malformed bar for '{symbol}' on {}",
                bad.date
            )));
        }
        if bars.is_empty() {
            return Err(Error::NoData {
                symbol: symbol.to_string(),
            });
        }

        info!(symbol, bars = bars.len(), from = %start, to = %end, "Bars loaded");
        Ok(bars)
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut bars = Vec::new();
    for row in reader.deserialize() {
        bars.push(row?);
    }
    Ok(bars)
}

fn is_sane(bar: &Bar) -> bool {
    let prices = [bar.open, bar.high, bar.low, bar.close];
    prices.iter().all(|p| p.is_finite() && *p > 0.0) && bar.low <= bar.high
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const CSV: &str = "\
date,open,close,high,low,volume
2024-01-03,10.1,10.3,10.4,10.0,1200
2024-01-02,10.0,10.1,10.2,9.6,1000
2024-01-04,10.3,10.2,10.5,10.1,900
";

    #[tokio::test]
    async fn csv_bars_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("600036.csv"), CSV).unwrap();
        let source = FileBarSource::new(dir.path());

        let bars = source
            .load("600036", d(2024, 1, 2), d(2024, 1, 3))
            .await
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[0].low, 9.6);
        assert_eq!(bars[1].close, 10.3);
    }

    #[tokio::test]
    async fn json_file_used_when_no_csv() {
        let dir = tempdir().unwrap();
        let json = r#"[{"date":"2024-01-02","open":10.0,"high":10.2,"low":9.6,"close":10.1}]"#;
        std::fs::write(dir.path().join("600066.json"), json).unwrap();
        let source = FileBarSource::new(dir.path());

        let bars = source
            .load("600066", d(2024, 1, 1), d(2024, 12, 31))
            .await
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 0.0);
    }

    #[tokio::test]
    async fn empty_range_is_no_data() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("600036.csv"), CSV).unwrap();
        let source = FileBarSource::new(dir.path());

        let err = source
            .load("600036", d(2023, 1, 1), d(2023, 12, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoData { .. }));
    }

    #[tokio::test]
    async fn missing_symbol_is_data_error() {
        let dir = tempdir().unwrap();
        let source = FileBarSource::new(dir.path());
        let err = source
            .load("000001", d(2024, 1, 1), d(2024, 12, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[tokio::test]
    async fn unparsable_row_is_csv_error() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("600036.csv"),
            "date,open,close,high,low\n2024-01-02,abc,1,1,1\n",
        )
        .unwrap();
        let source = FileBarSource::new(dir.path());
        let err = source
            .load("600036", d(2024, 1, 1), d(2024, 12, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[tokio::test]
    async fn symbols_listed_from_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("600066.csv"), CSV).unwrap();
        std::fs::write(dir.path().join("600036.csv"), CSV).unwrap();
        std::fs::write(dir.path().join("600036.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let source = FileBarSource::new(dir.path());

        assert_eq!(source.symbols().await.unwrap(), vec!["600036", "600066"]);
    }
}
