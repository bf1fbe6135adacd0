//! SQLite journal store.
//!
//! Fixed-point fields are stored as TEXT to keep their exact decimal
//! representation; timestamps are RFC 3339 TEXT, which also gives the
//! newest-first ordering a plain ORDER BY.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rust_decimal::Decimal;
use rusqlite::types::Type;
use rusqlite::{Row, params};

use crate::domain::error::JournalError;
use crate::domain::plan::{NewTradingPlan, TradingPlan, TradingPlanPatch};
use crate::domain::trade::{NewTrade, Trade, TradeKind, TradePatch, TradeStatus};
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> JournalError {
    JournalError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> JournalError {
    JournalError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path = config
            .get_string("database", "sqlite_path")
            .ok_or_else(|| JournalError::ConfigMissing {
                section: "database".into(),
                key: "sqlite_path".into(),
            })?;

        let pool_size = config.get_int("database", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    /// Private in-memory database; the pool is capped at one connection so
    /// every caller sees the same store.
    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                instrument TEXT NOT NULL,
                kind TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT,
                size TEXT NOT NULL,
                pnl TEXT,
                status TEXT NOT NULL,
                entry_time TEXT NOT NULL,
                exit_time TEXT,
                notes TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_trades_entry_time ON trades(entry_time);
            CREATE TABLE IF NOT EXISTS trading_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                objectives TEXT,
                strategy TEXT,
                risk_percentage TEXT,
                target_return TEXT,
                is_active INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT,
                name TEXT
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn write_trade(conn: &rusqlite::Connection, trade: &Trade) -> Result<(), JournalError> {
        conn.execute(
            "UPDATE trades
             SET instrument = ?2, kind = ?3, entry_price = ?4, exit_price = ?5,
                 size = ?6, pnl = ?7, status = ?8, entry_time = ?9, exit_time = ?10,
                 notes = ?11
             WHERE id = ?1",
            params![
                trade.id,
                trade.instrument,
                trade.kind.as_str(),
                trade.entry_price.to_string(),
                trade.exit_price.map(|p| p.to_string()),
                trade.size.to_string(),
                trade.pnl.map(|p| p.to_string()),
                trade.status.as_str(),
                trade.entry_time.to_rfc3339(),
                trade.exit_time.map(|t| t.to_rfc3339()),
                trade.notes,
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }
}

fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: rust_decimal::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

fn decimal_column_opt(row: &Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse().map_err(|e: rust_decimal::Error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_column_opt(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn row_to_trade(row: &Row) -> rusqlite::Result<Trade> {
    let kind_raw: String = row.get(2)?;
    let kind = TradeKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown trade kind: {kind_raw}").into(),
        )
    })?;
    let status_raw: String = row.get(7)?;
    let status = TradeStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            format!("unknown trade status: {status_raw}").into(),
        )
    })?;

    Ok(Trade {
        id: row.get(0)?,
        instrument: row.get(1)?,
        kind,
        entry_price: decimal_column(row, 3)?,
        exit_price: decimal_column_opt(row, 4)?,
        size: decimal_column(row, 5)?,
        pnl: decimal_column_opt(row, 6)?,
        status,
        entry_time: time_column(row, 8)?,
        exit_time: time_column_opt(row, 9)?,
        notes: row.get(10)?,
    })
}

fn row_to_plan(row: &Row) -> rusqlite::Result<TradingPlan> {
    Ok(TradingPlan {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        objectives: row.get(3)?,
        strategy: row.get(4)?,
        risk_percentage: decimal_column_opt(row, 5)?,
        target_return: decimal_column_opt(row, 6)?,
        is_active: row.get(7)?,
        created_at: time_column(row, 8)?,
    })
}

const TRADE_COLUMNS: &str =
    "id, instrument, kind, entry_price, exit_price, size, pnl, status, entry_time, exit_time, notes";

const PLAN_COLUMNS: &str =
    "id, name, description, objectives, strategy, risk_percentage, target_return, is_active, created_at";

impl JournalPort for SqliteAdapter {
    fn create_trade(&self, new: NewTrade) -> Result<Trade, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        // Assemble with a placeholder id to run the derivation, then insert.
        let mut trade = Trade::from_new(0, new);
        conn.execute(
            "INSERT INTO trades (instrument, kind, entry_price, exit_price, size, pnl,
                                 status, entry_time, exit_time, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                trade.instrument,
                trade.kind.as_str(),
                trade.entry_price.to_string(),
                trade.exit_price.map(|p| p.to_string()),
                trade.size.to_string(),
                trade.pnl.map(|p| p.to_string()),
                trade.status.as_str(),
                trade.entry_time.to_rfc3339(),
                trade.exit_time.map(|t| t.to_rfc3339()),
                trade.notes,
            ],
        )
        .map_err(query_err)?;

        trade.id = conn.last_insert_rowid();
        Ok(trade)
    }

    fn get_trade(&self, id: i64) -> Result<Option<Trade>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![id], row_to_trade)
            .map_err(query_err)?;

        rows.next().transpose().map_err(query_err)
    }

    fn list_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let query =
            format!("SELECT {TRADE_COLUMNS} FROM trades ORDER BY entry_time DESC, id DESC");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt.query_map([], row_to_trade).map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?);
        }
        Ok(trades)
    }

    fn update_trade(&self, id: i64, patch: TradePatch) -> Result<Option<Trade>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![id], row_to_trade)
            .map_err(query_err)?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let mut trade = row.map_err(query_err)?;
        drop(rows);
        drop(stmt);

        trade.apply_patch(patch);
        Self::write_trade(&conn, &trade)?;
        Ok(Some(trade))
    }

    fn delete_trade(&self, id: i64) -> Result<bool, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let deleted = conn
            .execute("DELETE FROM trades WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(deleted > 0)
    }

    fn create_plan(&self, new: NewTradingPlan) -> Result<TradingPlan, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let mut plan = TradingPlan::from_new(0, new, Utc::now());
        conn.execute(
            "INSERT INTO trading_plans (name, description, objectives, strategy,
                                        risk_percentage, target_return, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                plan.name,
                plan.description,
                plan.objectives,
                plan.strategy,
                plan.risk_percentage.map(|r| r.to_string()),
                plan.target_return.map(|t| t.to_string()),
                plan.is_active,
                plan.created_at.to_rfc3339(),
            ],
        )
        .map_err(query_err)?;

        plan.id = conn.last_insert_rowid();
        Ok(plan)
    }

    fn get_plan(&self, id: i64) -> Result<Option<TradingPlan>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let query = format!("SELECT {PLAN_COLUMNS} FROM trading_plans WHERE id = ?1");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let mut rows = stmt.query_map(params![id], row_to_plan).map_err(query_err)?;

        rows.next().transpose().map_err(query_err)
    }

    fn list_plans(&self) -> Result<Vec<TradingPlan>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let query =
            format!("SELECT {PLAN_COLUMNS} FROM trading_plans ORDER BY created_at DESC, id DESC");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt.query_map([], row_to_plan).map_err(query_err)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row.map_err(query_err)?);
        }
        Ok(plans)
    }

    fn update_plan(
        &self,
        id: i64,
        patch: TradingPlanPatch,
    ) -> Result<Option<TradingPlan>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let query = format!("SELECT {PLAN_COLUMNS} FROM trading_plans WHERE id = ?1");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let mut rows = stmt.query_map(params![id], row_to_plan).map_err(query_err)?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let mut plan = row.map_err(query_err)?;
        drop(rows);
        drop(stmt);

        plan.apply_patch(patch);
        conn.execute(
            "UPDATE trading_plans
             SET name = ?2, description = ?3, objectives = ?4, strategy = ?5,
                 risk_percentage = ?6, target_return = ?7, is_active = ?8
             WHERE id = ?1",
            params![
                plan.id,
                plan.name,
                plan.description,
                plan.objectives,
                plan.strategy,
                plan.risk_percentage.map(|r| r.to_string()),
                plan.target_return.map(|t| t.to_string()),
                plan.is_active,
            ],
        )
        .map_err(query_err)?;

        Ok(Some(plan))
    }

    fn delete_plan(&self, id: i64) -> Result<bool, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let deleted = conn
            .execute("DELETE FROM trading_plans WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(deleted > 0)
    }

    fn upsert_user(&self, user: User) -> Result<User, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        conn.execute(
            "INSERT INTO users (id, email, name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET email = excluded.email, name = excluded.name",
            params![user.id, user.email, user.name],
        )
        .map_err(query_err)?;

        Ok(user)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>, JournalError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let mut stmt = conn
            .prepare("SELECT id, email, name FROM users WHERE id = ?1")
            .map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .map_err(query_err)?;

        rows.next().transpose().map_err(query_err)
    }
}
