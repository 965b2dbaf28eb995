use crate::clock::{Clock, SystemClock};
use crate::period::DrawPeriod;
use crate::store::{AppendOutcome, HistoryStore, StoreError};
use crate::types::{Entry, NumberSet, PickRow};
use chrono::DateTime;
use rusqlite::{Connection, params};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    // One row per period tag; the UNIQUE constraint makes the append conditional.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS picks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            draw_period TEXT NOT NULL UNIQUE,
            number1 INTEGER NOT NULL,
            number2 INTEGER NOT NULL,
            number3 INTEGER NOT NULL,
            number4 INTEGER NOT NULL,
            number5 INTEGER NOT NULL,
            super_ball INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_picks_created_at ON picks (created_at DESC)",
        [],
    )?;

    Ok(())
}

/// Returns the new row id, or `None` when the period already has a pick.
pub fn insert_pick(
    conn: &Connection,
    numbers: &NumberSet,
    period: DrawPeriod,
    created_at_millis: i64,
) -> rusqlite::Result<Option<i64>> {
    let [n1, n2, n3, n4, n5] = *numbers.numbers();
    conn.execute(
        "INSERT OR IGNORE INTO picks (
            draw_period, number1, number2, number3, number4, number5, super_ball, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            period.tag(),
            n1,
            n2,
            n3,
            n4,
            n5,
            numbers.super_ball(),
            created_at_millis
        ],
    )?;

    if conn.changes() > 0 {
        Ok(Some(conn.last_insert_rowid()))
    } else {
        Ok(None)
    }
}

pub fn pick_exists_for_period(conn: &Connection, period: DrawPeriod) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM picks WHERE draw_period = ?1")?;
    let count: i64 = stmt.query_row([period.tag()], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_all_picks(conn: &Connection) -> rusqlite::Result<Vec<PickRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, draw_period, number1, number2, number3, number4, number5, super_ball, created_at
         FROM picks
         ORDER BY created_at DESC, id DESC",
    )?;
    let pick_iter = stmt.query_map([], |row| {
        Ok(PickRow {
            id: row.get(0)?,
            draw_period: row.get(1)?,
            numbers: [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
            super_ball: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;

    let mut results = Vec::new();
    for pick in pick_iter {
        results.push(pick?);
    }
    Ok(results)
}

impl TryFrom<PickRow> for Entry {
    type Error = StoreError;

    fn try_from(row: PickRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt { id: row.id, reason };

        let period = row
            .draw_period
            .parse::<DrawPeriod>()
            .map_err(|e| corrupt(e.to_string()))?;
        let numbers = NumberSet::new(row.numbers, row.super_ball)
            .ok_or_else(|| corrupt("numbers out of range".to_string()))?;
        let created_at = DateTime::from_timestamp_millis(row.created_at)
            .ok_or_else(|| corrupt(format!("bad timestamp {}", row.created_at)))?;

        Ok(Entry {
            id: row.id,
            numbers,
            period,
            created_at,
        })
    }
}

/// SQLite-backed history. Timestamps come from the store's clock, not the caller.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open (or create) a database file, creating its parent directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!("📁 Opened pick history at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Stamp new picks from `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl HistoryStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Entry>, StoreError> {
        let rows = {
            let conn = self.conn.lock().await;
            get_all_picks(&conn)?
        };
        rows.into_iter().map(Entry::try_from).collect()
    }

    async fn exists(&self, period: DrawPeriod) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        Ok(pick_exists_for_period(&conn, period)?)
    }

    async fn append(
        &self,
        numbers: &NumberSet,
        period: DrawPeriod,
    ) -> Result<AppendOutcome, StoreError> {
        let conn = self.conn.lock().await;
        let created_at = self.clock.now();
        match insert_pick(&conn, numbers, period, created_at.timestamp_millis())? {
            Some(id) => {
                debug!(id, %period, "pick written");
                // Report the stored millisecond precision, not the clock's.
                let created_at = DateTime::from_timestamp_millis(created_at.timestamp_millis())
                    .unwrap_or(created_at);
                Ok(AppendOutcome::Inserted(Entry {
                    id,
                    numbers: *numbers,
                    period,
                    created_at,
                }))
            }
            None => {
                debug!(%period, "pick rejected, period already taken");
                Ok(AppendOutcome::PeriodTaken)
            }
        }
    }
}
