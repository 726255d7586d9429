//! SQLite bar cache.
//!
//! Stores daily bars keyed by (symbol, date) so a CSV directory can be
//! imported once and then served to concurrent batch workers through an
//! r2d2 pool.

use crate::domain::error::MtfError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::BarSource;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn pool_err(e: r2d2::Error) -> MtfError {
    MtfError::DataSource {
        reason: format!("sqlite pool: {e}"),
    }
}

fn query_err(e: rusqlite::Error) -> MtfError {
    MtfError::DataSource {
        reason: format!("sqlite query: {e}"),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, MtfError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| MtfError::DataSource {
        reason: format!("bad stored date '{value}': {e}"),
    })
}

pub struct SqliteBarSource {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteBarSource {
    pub fn from_path(path: &Path, pool_size: u32) -> Result<Self, MtfError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(pool_err)?;
        let source = Self { pool };
        source.initialize_schema()?;
        Ok(source)
    }

    /// Single-connection in-memory database, mainly for tests.
    pub fn in_memory() -> Result<Self, MtfError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_err)?;
        let source = Self { pool };
        source.initialize_schema()?;
        Ok(source)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, MtfError> {
        self.pool.get().map_err(pool_err)
    }

    fn initialize_schema(&self) -> Result<(), MtfError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);",
            )
            .map_err(query_err)
    }

    /// Upsert `bars` for `symbol` in one transaction.
    pub fn insert_bars(&self, symbol: &str, bars: &[OhlcvBar]) -> Result<usize, MtfError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(query_err)?;
            for bar in bars {
                stmt.execute(params![
                    symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ])
                .map_err(query_err)?;
            }
        }
        tx.commit().map_err(query_err)?;
        Ok(bars.len())
    }

    /// First date, last date and bar count stored for `symbol`.
    pub fn data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MtfError> {
        let (min, max, count): (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM ohlcv WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => {
                Ok(Some((parse_date(&min)?, parse_date(&max)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl BarSource for SqliteBarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtfError> {
        let bars = self.query_bars(symbol, start_date, end_date)?;
        // The pooled connection is released before the range lookup.
        if bars.is_empty() && self.data_range(symbol)?.is_none() {
            return Err(MtfError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MtfError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM ohlcv ORDER BY symbol")
            .map_err(query_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_err)?);
        }
        Ok(symbols)
    }
}

impl SqliteBarSource {
    fn query_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtfError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM ohlcv
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, f64>(5)?,
                    ))
                },
            )
            .map_err(query_err)?;

        let mut bars = Vec::new();
        for row in rows {
            let (date, open, high, low, close, volume) = row.map_err(query_err)?;
            bars.push(OhlcvBar {
                date: parse_date(&date)?,
                open,
                high,
                low,
                close,
                volume,
            });
        }
        Ok(bars)
    }
}
