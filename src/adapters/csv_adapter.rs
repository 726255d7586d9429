//! CSV directory bar source: one `<SYMBOL>.csv` file per symbol with header
//! `date,open,high,low,close,volume`.

use crate::domain::error::MtfError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::BarSource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<CsvRow> for OhlcvBar {
    fn from(row: CsvRow) -> Self {
        OhlcvBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

pub struct CsvBarSource {
    base_path: PathBuf,
}

impl CsvBarSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

/// Parse bars from CSV text, keeping rows dated within `[start, end]`.
pub fn read_bars<R: Read>(
    reader: R,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<OhlcvBar>, MtfError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();

    for result in rdr.deserialize::<CsvRow>() {
        let row = result.map_err(|e| MtfError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;
        if row.date < start_date || row.date > end_date {
            continue;
        }
        bars.push(OhlcvBar::from(row));
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl BarSource for CsvBarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtfError> {
        let path = self.csv_path(symbol);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MtfError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            Err(e) => {
                return Err(MtfError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let bars = read_bars(file, start_date, end_date)?;
        debug!(symbol, bars = bars.len(), path = %path.display(), "loaded csv bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MtfError> {
        let entries = std::fs::read_dir(&self.base_path).map_err(|e| MtfError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MtfError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
