//! SQLite persistence for the daily signal rows.
//!
//! Every entity lives in one `signal_rows` table keyed by
//! `(entity_type, row_date)` with the row itself stored as JSON. A
//! per-entity sort key keeps reads in the order downstream consumers expect:
//! - sectors by rank
//! - momentum scans by score, highest first
//! - picks by rank, insights by priority
//! - movers and pattern alerts in insertion order

use crate::error::{AppError, Result};
use crate::types::{
    DailySnapshot, MarketInsight, MomentumScanRow, PatternAlert, SectorMomentumRow, SmartMover,
    StockPick,
};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kind of row held in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    SmartMover,
    PatternAlert,
    MomentumScan,
    SectorMomentum,
    StockPick,
    MarketInsight,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::SmartMover => "smart_mover",
            EntityType::PatternAlert => "pattern_alert",
            EntityType::MomentumScan => "momentum_scan",
            EntityType::SectorMomentum => "sector_momentum",
            EntityType::StockPick => "stock_pick",
            EntityType::MarketInsight => "market_insight",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row type that can be persisted in `signal_rows`.
pub trait StoredRow: Serialize + DeserializeOwned {
    const ENTITY: EntityType;

    fn symbol(&self) -> Option<&str>;

    /// Ascending sort key used on read; ties fall back to insertion order.
    fn sort_key(&self) -> f64 {
        0.0
    }
}

impl StoredRow for SmartMover {
    const ENTITY: EntityType = EntityType::SmartMover;

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }
}

impl StoredRow for PatternAlert {
    const ENTITY: EntityType = EntityType::PatternAlert;

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }
}

impl StoredRow for MomentumScanRow {
    const ENTITY: EntityType = EntityType::MomentumScan;

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }

    fn sort_key(&self) -> f64 {
        -f64::from(self.score)
    }
}

impl StoredRow for SectorMomentumRow {
    const ENTITY: EntityType = EntityType::SectorMomentum;

    fn symbol(&self) -> Option<&str> {
        None
    }

    fn sort_key(&self) -> f64 {
        self.rank as f64
    }
}

impl StoredRow for StockPick {
    const ENTITY: EntityType = EntityType::StockPick;

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }

    fn sort_key(&self) -> f64 {
        self.rank as f64
    }
}

impl StoredRow for MarketInsight {
    const ENTITY: EntityType = EntityType::MarketInsight;

    fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    fn sort_key(&self) -> f64 {
        self.priority as f64
    }
}

/// SQLite store for per-day signal rows.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("SQLite connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signal_rows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_type TEXT NOT NULL,
                row_date TEXT NOT NULL,
                symbol TEXT,
                sort_key REAL NOT NULL DEFAULT 0,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signal_rows_entity_date
             ON signal_rows(entity_type, row_date)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signal_rows_symbol ON signal_rows(symbol)",
            [],
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    /// Replace the stored batch of `T` for one date.
    ///
    /// Re-running a job for the same date overwrites its previous output.
    pub fn store_rows<T: StoredRow>(&self, date: NaiveDate, rows: &[T]) -> Result<usize> {
        let day = date.format(DATE_FORMAT).to_string();
        let now = Utc::now().timestamp_millis();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let replaced = tx.execute(
            "DELETE FROM signal_rows WHERE entity_type = ?1 AND row_date = ?2",
            params![T::ENTITY.as_str(), day],
        )?;
        if replaced > 0 {
            debug!("Replacing {} {} rows for {}", replaced, T::ENTITY, day);
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO signal_rows (entity_type, row_date, symbol, sort_key, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                let payload = serde_json::to_string(row)?;
                stmt.execute(params![
                    T::ENTITY.as_str(),
                    day,
                    row.symbol(),
                    row.sort_key(),
                    payload,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        debug!("Stored {} {} rows for {}", rows.len(), T::ENTITY, day);
        Ok(rows.len())
    }

    /// Read the batch of `T` for one date in its read order.
    ///
    /// Rows that no longer deserialize are skipped with a warning.
    pub fn fetch_rows<T: StoredRow>(&self, date: NaiveDate) -> Result<Vec<T>> {
        let day = date.format(DATE_FORMAT).to_string();
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT payload FROM signal_rows
             WHERE entity_type = ?1 AND row_date = ?2
             ORDER BY sort_key ASC, id ASC",
        )?;

        let payloads = stmt
            .query_map(params![T::ENTITY.as_str(), day], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match serde_json::from_str(&payload) {
                Ok(row) => rows.push(row),
                Err(e) => warn!("Skipping unreadable {} row for {}: {}", T::ENTITY, day, e),
            }
        }
        Ok(rows)
    }

    /// Everything pick selection and insight synthesis read for one date.
    pub fn load_snapshot(&self, date: NaiveDate) -> Result<DailySnapshot> {
        Ok(DailySnapshot {
            date,
            movers: self.fetch_rows(date)?,
            patterns: self.fetch_rows(date)?,
            sectors: self.fetch_rows(date)?,
            momentum: self.fetch_rows(date)?,
        })
    }

    /// Number of stored rows of one entity type for a date.
    pub fn row_count(&self, entity: EntityType, date: NaiveDate) -> Result<usize> {
        let day = date.format(DATE_FORMAT).to_string();
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM signal_rows WHERE entity_type = ?1 AND row_date = ?2",
            params![entity.as_str(), day],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete every row dated before `date`.
    pub fn cleanup_before(&self, date: NaiveDate) -> Result<usize> {
        let day = date.format(DATE_FORMAT).to_string();
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM signal_rows WHERE row_date < ?1", params![day])?;
        if deleted > 0 {
            info!("Cleaned up {} signal rows before {}", deleted, day);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InsightType, PriceTier, SectorStock};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn scan(symbol: &str, score: u8) -> MomentumScanRow {
        MomentumScanRow {
            symbol: symbol.to_string(),
            score,
            price_score: 0,
            volume_score: 0,
            rsi_score: 0,
            trend_score: 0,
            price: 10.0,
            price_change_5d: 0.0,
            volume_ratio: 1.0,
            rsi_14: None,
            above_sma_20: false,
            price_tier: PriceTier::Small,
        }
    }

    fn sector(name: &str, rank: usize) -> SectorMomentumRow {
        SectorMomentumRow {
            sector: name.to_string(),
            rank,
            avg_change_1w: 0.0,
            avg_change_1m: 0.0,
            top_stocks: vec![SectorStock { symbol: "AAA".into(), change_1w: 0.0, change_1m: 0.0 }],
            bottom_stocks: Vec::new(),
            commentary: String::new(),
        }
    }

    #[test]
    fn test_momentum_read_by_score() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .store_rows(date(1), &[scan("AAA", 40), scan("BBB", 90), scan("CCC", 65)])
            .unwrap();

        let rows: Vec<MomentumScanRow> = store.fetch_rows(date(1)).unwrap();
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBB", "CCC", "AAA"]);
    }

    #[test]
    fn test_sectors_read_by_rank() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .store_rows(date(1), &[sector("Energy", 3), sector("Utilities", 1), sector("Materials", 2)])
            .unwrap();

        let rows: Vec<SectorMomentumRow> = store.fetch_rows(date(1)).unwrap();
        let ranks: Vec<usize> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_store_replaces_same_date() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.store_rows(date(1), &[scan("AAA", 40), scan("BBB", 50)]).unwrap();
        store.store_rows(date(1), &[scan("CCC", 60)]).unwrap();
        store.store_rows(date(2), &[scan("DDD", 70)]).unwrap();

        assert_eq!(store.row_count(EntityType::MomentumScan, date(1)).unwrap(), 1);
        assert_eq!(store.row_count(EntityType::MomentumScan, date(2)).unwrap(), 1);
        assert_eq!(store.row_count(EntityType::SectorMomentum, date(1)).unwrap(), 0);
    }

    #[test]
    fn test_insights_keep_optional_symbol() {
        let store = SqliteStore::new_in_memory().unwrap();
        let insight = MarketInsight {
            insight_type: InsightType::SectorRotation,
            symbol: None,
            title: "Energy leading the market this week".into(),
            body: "Energy is a top performer this week (up 2%).".into(),
            data: Default::default(),
            priority: 1,
        };
        store.store_rows(date(3), std::slice::from_ref(&insight)).unwrap();

        let rows: Vec<MarketInsight> = store.fetch_rows(date(3)).unwrap();
        assert_eq!(rows, vec![insight]);
    }

    #[test]
    fn test_cleanup_before() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.store_rows(date(1), &[scan("AAA", 40)]).unwrap();
        store.store_rows(date(5), &[scan("BBB", 40)]).unwrap();

        assert_eq!(store.cleanup_before(date(3)).unwrap(), 1);
        assert_eq!(store.row_count(EntityType::MomentumScan, date(1)).unwrap(), 0);
        assert_eq!(store.row_count(EntityType::MomentumScan, date(5)).unwrap(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let store = SqliteStore::new_in_memory().unwrap();
        let snapshot = store.load_snapshot(date(9)).unwrap();
        assert!(snapshot.movers.is_empty());
        assert!(snapshot.patterns.is_empty());
        assert!(snapshot.sectors.is_empty());
        assert!(snapshot.momentum.is_empty());
    }
}
