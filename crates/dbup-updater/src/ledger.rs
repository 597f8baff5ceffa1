//! Persisted ledger of applied update scripts.
//!
//! The ledger lives in the target database itself, in `applied_updates`.
//! Every mutation is a single statement touching a single record.

use crate::error::{UpdaterError, UpdaterResult};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use dbup_core::sql_utils::string_literal;
use dbup_core::{UpdateRecord, UpdateState};
use dbup_db::{Database, DbError, Row};
use std::time::Duration;

/// Table holding the ledger records
pub const LEDGER_TABLE: &str = "applied_updates";

/// Bookkeeping of which update scripts have been applied.
#[async_trait]
pub trait UpdateLedger: Send + Sync {
    /// All records, ordered by path
    async fn list_all(&self) -> UpdaterResult<Vec<UpdateRecord>>;

    /// Records in the ACTIVE state
    async fn list_active(&self) -> UpdaterResult<Vec<UpdateRecord>> {
        let all = self.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|r| r.state == UpdateState::Active)
            .collect())
    }

    /// Records in the ARCHIVED state
    async fn list_archived(&self) -> UpdaterResult<Vec<UpdateRecord>> {
        let all = self.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|r| r.state == UpdateState::Archived)
            .collect())
    }

    /// Insert or overwrite the record for `path` as ACTIVE
    async fn record_applied(&self, path: &str, hash: &str, duration: Duration)
        -> UpdaterResult<()>;

    /// Move the record for `path` to the ARCHIVED state
    async fn archive(&self, path: &str) -> UpdaterResult<()>;

    /// Delete the record for `path`
    async fn remove(&self, path: &str) -> UpdaterResult<()>;

    /// Re-associate the record for `from` with the path `to`
    async fn rename(&self, from: &str, to: &str) -> UpdaterResult<()>;

    /// Replace the stored hash of `path` without touching anything else
    async fn rehash(&self, path: &str, hash: &str) -> UpdaterResult<()>;

    /// Increment the missing-run counter of `path`, returning the new value
    async fn mark_missing(&self, path: &str) -> UpdaterResult<u32>;

    /// Reset the missing-run counter of `path`
    async fn clear_missing(&self, path: &str) -> UpdaterResult<()>;
}

/// [`UpdateLedger`] stored in a table of the target database
pub struct SqlLedger<'a> {
    db: &'a dyn Database,
}

impl<'a> SqlLedger<'a> {
    /// Wrap `db`, creating the ledger table if needed.
    pub async fn open(db: &'a dyn Database) -> UpdaterResult<Self> {
        let ledger = Self { db };
        ledger.ensure_table().await?;
        Ok(ledger)
    }

    /// Wrap `db` only if the ledger table already exists.
    pub async fn existing(db: &'a dyn Database) -> UpdaterResult<Option<Self>> {
        let tables = db
            .list_tables()
            .await
            .map_err(|e| persistence("list tables", e))?;
        Ok(tables
            .iter()
            .any(|t| t.eq_ignore_ascii_case(LEDGER_TABLE))
            .then_some(Self { db }))
    }

    async fn ensure_table(&self) -> UpdaterResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
                 name         VARCHAR(200) NOT NULL PRIMARY KEY,
                 hash         CHAR(64)     NOT NULL DEFAULT '',
                 state        VARCHAR(8)   NOT NULL DEFAULT 'RELEASED',
                 applied_at   VARCHAR(40)  NOT NULL,
                 speed        BIGINT       NOT NULL DEFAULT 0,
                 missing_runs INTEGER      NOT NULL DEFAULT 0
             )"
        );
        self.db
            .execute(&sql)
            .await
            .map_err(|e| persistence("create ledger table", e))
    }

    /// Upsert keyword for the backend dialect
    fn replace_into(&self) -> &'static str {
        match self.db.db_type() {
            "mysql" => "REPLACE INTO",
            _ => "INSERT OR REPLACE INTO",
        }
    }

    async fn exec(&self, context: String, sql: String) -> UpdaterResult<()> {
        log::debug!("ledger: {context}");
        self.db
            .execute(&sql)
            .await
            .map_err(|e| persistence(&context, e))
    }
}

fn persistence(context: &str, source: DbError) -> UpdaterError {
    UpdaterError::PersistenceError {
        context: context.to_string(),
        source,
    }
}

fn parse_record(row: Row) -> Option<UpdateRecord> {
    let mut cols = row.into_iter();
    let path = cols.next()?;
    let hash = cols.next().unwrap_or_default();
    let state_raw = cols.next().unwrap_or_default();
    let applied_raw = cols.next().unwrap_or_default();
    let speed = cols.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let missing_runs = cols.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    let state = UpdateState::from_sql_str(&state_raw).unwrap_or_else(|| {
        log::warn!("Ledger record '{path}' has unknown state '{state_raw}', treating it as active");
        UpdateState::Active
    });
    let applied_at = DateTime::parse_from_rfc3339(&applied_raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default();

    Some(UpdateRecord {
        path,
        hash,
        applied_at,
        speed_ms: speed,
        state,
        missing_runs,
    })
}

#[async_trait]
impl UpdateLedger for SqlLedger<'_> {
    async fn list_all(&self) -> UpdaterResult<Vec<UpdateRecord>> {
        let rows = self
            .db
            .query_rows(&format!(
                "SELECT name, hash, state, applied_at, speed, missing_runs FROM {LEDGER_TABLE} ORDER BY name"
            ))
            .await
            .map_err(|e| persistence("list ledger records", e))?;
        Ok(rows.into_iter().filter_map(parse_record).collect())
    }

    async fn record_applied(
        &self,
        path: &str,
        hash: &str,
        duration: Duration,
    ) -> UpdaterResult<()> {
        let applied_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.exec(
            format!("record '{path}' as applied"),
            format!(
                "{} {LEDGER_TABLE} (name, hash, state, applied_at, speed, missing_runs) VALUES ({}, {}, 'RELEASED', {}, {}, 0)",
                self.replace_into(),
                string_literal(path),
                string_literal(hash),
                string_literal(&applied_at),
                duration.as_millis()
            ),
        )
        .await
    }

    async fn archive(&self, path: &str) -> UpdaterResult<()> {
        self.exec(
            format!("archive '{path}'"),
            format!(
                "UPDATE {LEDGER_TABLE} SET state = 'ARCHIVED' WHERE name = {}",
                string_literal(path)
            ),
        )
        .await
    }

    async fn remove(&self, path: &str) -> UpdaterResult<()> {
        self.exec(
            format!("remove '{path}'"),
            format!(
                "DELETE FROM {LEDGER_TABLE} WHERE name = {}",
                string_literal(path)
            ),
        )
        .await
    }

    async fn rename(&self, from: &str, to: &str) -> UpdaterResult<()> {
        self.exec(
            format!("rename '{from}' to '{to}'"),
            format!(
                "UPDATE {LEDGER_TABLE} SET name = {}, missing_runs = 0 WHERE name = {}",
                string_literal(to),
                string_literal(from)
            ),
        )
        .await
    }

    async fn rehash(&self, path: &str, hash: &str) -> UpdaterResult<()> {
        self.exec(
            format!("rehash '{path}'"),
            format!(
                "UPDATE {LEDGER_TABLE} SET hash = {} WHERE name = {}",
                string_literal(hash),
                string_literal(path)
            ),
        )
        .await
    }

    async fn mark_missing(&self, path: &str) -> UpdaterResult<u32> {
        self.exec(
            format!("mark '{path}' missing"),
            format!(
                "UPDATE {LEDGER_TABLE} SET missing_runs = missing_runs + 1 WHERE name = {}",
                string_literal(path)
            ),
        )
        .await?;

        let rows = self
            .db
            .query_rows(&format!(
                "SELECT missing_runs FROM {LEDGER_TABLE} WHERE name = {}",
                string_literal(path)
            ))
            .await
            .map_err(|e| persistence(&format!("read missing count of '{path}'"), e))?;
        Ok(rows
            .first()
            .and_then(|r| r.first())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    async fn clear_missing(&self, path: &str) -> UpdaterResult<()> {
        self.exec(
            format!("clear missing count of '{path}'"),
            format!(
                "UPDATE {LEDGER_TABLE} SET missing_runs = 0 WHERE name = {}",
                string_literal(path)
            ),
        )
        .await
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
