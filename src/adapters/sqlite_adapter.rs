//! SQLite store adapter.
//!
//! Holds positions, additional purchases, the close-out archive, the KR
//! listed-code directory and one `price_<CODE>` table per instrument.

use crate::adapters::price_table_name;
use crate::domain::closeout::ClosedPosition;
use crate::domain::error::RectrackError;
use crate::domain::position::{AdditionalBuy, Country, ListedCode, NewPosition, Position};
use crate::domain::price::PricePoint;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceSeriesPort;
use crate::ports::store_port::{
    AdditionalBuyStore, CloseOutStore, ClosedPositionArchive, CodeDirectory, PositionStore,
};
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> RectrackError {
    RectrackError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> RectrackError {
    RectrackError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date_column(value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn parse_country_column(value: String) -> rusqlite::Result<Country> {
    value.parse::<Country>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn insert_closed(conn: &Connection, record: &ClosedPosition) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO sell_history (name, code, recommender, country, rec_date, sell_date,
             return_lump, return_dca, return_comp, total_invested, final_eval, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.name,
            record.code,
            record.recommender,
            record.country.to_string(),
            record.rec_date.format(DATE_FORMAT).to_string(),
            record.sell_date.format(DATE_FORMAT).to_string(),
            record.return_lump,
            record.return_dca,
            record.return_comp,
            record.total_invested,
            record.final_eval,
            record.note
        ],
    )
}

fn position_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        recommender: row.get(3)?,
        country: parse_country_column(row.get(4)?)?,
        rec_date: parse_date_column(row.get(5)?)?,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RectrackError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| RectrackError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, RectrackError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, RectrackError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), RectrackError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS portfolio (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                code TEXT NOT NULL,
                recommender TEXT NOT NULL,
                country TEXT NOT NULL,
                rec_date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS additional_buys (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                ratio REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_additional_buys_code ON additional_buys(code);
            CREATE TABLE IF NOT EXISTS sell_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                code TEXT NOT NULL,
                recommender TEXT NOT NULL,
                country TEXT NOT NULL,
                rec_date TEXT NOT NULL,
                sell_date TEXT NOT NULL,
                return_lump REAL NOT NULL,
                return_dca REAL NOT NULL,
                return_comp REAL NOT NULL,
                total_invested REAL NOT NULL,
                final_eval REAL NOT NULL,
                note TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sell_history_sell_date ON sell_history(sell_date);
            CREATE TABLE IF NOT EXISTS kr_code (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    /// Upsert daily closes for `code`, creating its price table on first use.
    pub fn insert_prices(&self, code: &str, points: &[PricePoint]) -> Result<(), RectrackError> {
        let table = price_table_name(code)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                date TEXT PRIMARY KEY,
                close_price REAL NOT NULL
            );"
        ))
        .map_err(query_err)?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT OR REPLACE INTO \"{table}\" (date, close_price) VALUES (?1, ?2)"
                ))
                .map_err(query_err)?;
            for point in points {
                stmt.execute(params![
                    point.date.format(DATE_FORMAT).to_string(),
                    point.close_price
                ])
                .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)?;
        info!(code, table = %table, rows = points.len(), "stored prices");
        Ok(())
    }

    /// Upsert listed codes into the `kr_code` directory.
    pub fn insert_codes(&self, codes: &[ListedCode]) -> Result<(), RectrackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        {
            let mut stmt = tx
                .prepare("INSERT OR REPLACE INTO kr_code (code, name) VALUES (?1, ?2)")
                .map_err(query_err)?;
            for listed in codes {
                stmt.execute(params![listed.code.trim(), listed.name.trim()])
                    .map_err(query_err)?;
            }
        }
        tx.commit().map_err(query_err)?;
        info!(rows = codes.len(), "stored listed codes");
        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool, RectrackError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .map_err(query_err)?;
        Ok(count > 0)
    }
}

impl PriceSeriesPort for SqliteAdapter {
    fn fetch_series(&self, code: &str) -> Result<Option<Vec<PricePoint>>, RectrackError> {
        let table = price_table_name(code)?;
        if !self.table_exists(&table)? {
            return Ok(None);
        }

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT date, close_price FROM \"{table}\" ORDER BY date ASC"
            ))
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PricePoint {
                    date: parse_date_column(row.get(0)?)?,
                    close_price: row.get(1)?,
                })
            })
            .map_err(query_err)?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(query_err)?);
        }

        Ok(Some(points))
    }
}

impl PositionStore for SqliteAdapter {
    fn list_positions(&self) -> Result<Vec<Position>, RectrackError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, code, recommender, country, rec_date
                 FROM portfolio
                 ORDER BY rec_date ASC, id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt.query_map([], position_from_row).map_err(query_err)?;

        let mut positions = Vec::new();
        for row in rows {
            positions.push(row.map_err(query_err)?);
        }
        Ok(positions)
    }

    fn find_position(&self, id: i64) -> Result<Option<Position>, RectrackError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, code, recommender, country, rec_date
                 FROM portfolio WHERE id = ?1",
            )
            .map_err(query_err)?;

        let mut rows = stmt.query_map(params![id], position_from_row).map_err(query_err)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(query_err)?)),
            None => Ok(None),
        }
    }

    fn insert_position(&self, position: &NewPosition) -> Result<i64, RectrackError> {
        position.validate()?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO portfolio (name, code, recommender, country, rec_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                position.name.trim(),
                position.code.trim(),
                position.recommender.trim(),
                position.country.to_string(),
                position.rec_date.format(DATE_FORMAT).to_string()
            ],
        )
        .map_err(query_err)?;

        let id = conn.last_insert_rowid();
        info!(id, code = %position.code, "position added");
        Ok(id)
    }

    fn delete_position(&self, id: i64) -> Result<bool, RectrackError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM portfolio WHERE id = ?1", params![id])
            .map_err(query_err)?;
        if removed > 0 {
            info!(id, "position removed");
        }
        Ok(removed > 0)
    }
}

impl AdditionalBuyStore for SqliteAdapter {
    fn list_additional_buys(&self) -> Result<Vec<AdditionalBuy>, RectrackError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT code, date, ratio FROM additional_buys ORDER BY date ASC, id ASC")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AdditionalBuy {
                    code: row.get(0)?,
                    date: parse_date_column(row.get(1)?)?,
                    ratio: row.get(2)?,
                })
            })
            .map_err(query_err)?;

        let mut buys = Vec::new();
        for row in rows {
            buys.push(row.map_err(query_err)?);
        }
        Ok(buys)
    }

    fn insert_additional_buy(&self, buy: &AdditionalBuy) -> Result<(), RectrackError> {
        if !buy.ratio.is_finite() || buy.ratio <= 0.0 {
            return Err(RectrackError::invalid_input("ratio", "must be greater than zero"));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO additional_buys (code, date, ratio) VALUES (?1, ?2, ?3)",
            params![
                buy.code.trim(),
                buy.date.format(DATE_FORMAT).to_string(),
                buy.ratio
            ],
        )
        .map_err(query_err)?;
        info!(code = %buy.code, date = %buy.date, ratio = buy.ratio, "additional buy added");
        Ok(())
    }
}

impl ClosedPositionArchive for SqliteAdapter {
    fn archive(&self, record: &ClosedPosition) -> Result<(), RectrackError> {
        let conn = self.conn()?;
        insert_closed(&conn, record).map_err(query_err)?;
        info!(code = %record.code, sell_date = %record.sell_date, "position archived");
        Ok(())
    }

    fn list_closed(&self) -> Result<Vec<ClosedPosition>, RectrackError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT name, code, recommender, country, rec_date, sell_date,
                        return_lump, return_dca, return_comp, total_invested, final_eval, note
                 FROM sell_history
                 ORDER BY sell_date DESC, id DESC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ClosedPosition {
                    name: row.get(0)?,
                    code: row.get(1)?,
                    recommender: row.get(2)?,
                    country: parse_country_column(row.get(3)?)?,
                    rec_date: parse_date_column(row.get(4)?)?,
                    sell_date: parse_date_column(row.get(5)?)?,
                    return_lump: row.get(6)?,
                    return_dca: row.get(7)?,
                    return_comp: row.get(8)?,
                    total_invested: row.get(9)?,
                    final_eval: row.get(10)?,
                    note: row.get(11)?,
                })
            })
            .map_err(query_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(query_err)?);
        }
        Ok(records)
    }
}

impl CloseOutStore for SqliteAdapter {
    fn close_out(&self, id: i64, record: &ClosedPosition) -> Result<(), RectrackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        insert_closed(&tx, record).map_err(query_err)?;
        let removed = tx
            .execute("DELETE FROM portfolio WHERE id = ?1", params![id])
            .map_err(query_err)?;
        if removed == 0 {
            // Dropping the transaction rolls back the archive insert.
            return Err(RectrackError::PositionNotFound { id });
        }

        tx.commit().map_err(query_err)?;
        info!(id, code = %record.code, sell_date = %record.sell_date, "position closed out");
        Ok(())
    }
}

impl CodeDirectory for SqliteAdapter {
    fn search_codes(&self, query: &str, limit: usize) -> Result<Vec<ListedCode>, RectrackError> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!(
            "%{}%",
            needle
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        );

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT name, code FROM kr_code
                 WHERE name LIKE ?1 ESCAPE '\\'
                 ORDER BY name ASC, code ASC
                 LIMIT ?2",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(ListedCode {
                    name: row.get(0)?,
                    code: row.get(1)?,
                })
            })
            .map_err(query_err)?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row.map_err(query_err)?);
        }
        Ok(codes)
    }
}
