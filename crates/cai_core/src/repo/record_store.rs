//! Raw record persistence over the `content_additional_information` table.
//!
//! # Responsibility
//! - Own SQL for loading, inserting, updating and deleting stored rows.
//! - Keep value payloads as opaque text; decoding belongs to the repository.
//!
//! # Invariants
//! - "No rows" is a normal result of `load`, never an error.
//! - Identifier filters are explicit `Option`s; an empty string is a real
//!   identifier, not "all identifiers".
//! - `update`/`delete` on missing keys are silent no-ops.
//! - `purge` binds at most `PURGE_BATCH_SIZE` ids per statement and applies
//!   all batches in one transaction.

use crate::model::info::{ContentId, VersionNo};
use crate::repo::info_repo::RepoResult;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE_NAME: &str = "content_additional_information";

/// Upper bound of content ids bound to one purge statement.
pub const PURGE_BATCH_SIZE: usize = 200;

const ROW_SELECT_SQL: &str = "SELECT
    content_id,
    content_version_no,
    identifier,
    value
FROM content_additional_information
WHERE content_id = ?1
  AND content_version_no = ?2";

/// One persisted row, with the value still in its stored text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub content_id: ContentId,
    pub version_no: VersionNo,
    pub identifier: String,
    pub value: String,
}

/// Durable row storage contract.
pub trait RecordStore {
    /// Loads rows for one content version, optionally narrowed to one identifier.
    fn load(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<Vec<StoredRow>>;
    /// Inserts one row. Duplicate keys are rejected by the store.
    fn insert(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &str,
    ) -> RepoResult<()>;
    /// Replaces the value of an existing row; no-op when absent.
    fn update(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &str,
    ) -> RepoResult<()>;
    /// Deletes one row, or every row of the version when `identifier` is `None`.
    fn delete(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<()>;
    /// Deletes every row of every version for the given content ids.
    fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn load(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<Vec<StoredRow>> {
        let mut rows_out = Vec::new();
        match identifier {
            Some(identifier) => {
                let mut stmt = self.conn.prepare_cached(&format!(
                    "{ROW_SELECT_SQL} AND identifier = ?3 ORDER BY identifier ASC;"
                ))?;
                let mut rows = stmt.query(params![content_id, version_no, identifier])?;
                while let Some(row) = rows.next()? {
                    rows_out.push(parse_row(row)?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare_cached(&format!("{ROW_SELECT_SQL} ORDER BY identifier ASC;"))?;
                let mut rows = stmt.query(params![content_id, version_no])?;
                while let Some(row) = rows.next()? {
                    rows_out.push(parse_row(row)?);
                }
            }
        }

        Ok(rows_out)
    }

    fn insert(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &str,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO content_additional_information (
                content_id,
                content_version_no,
                identifier,
                value
            ) VALUES (?1, ?2, ?3, ?4);",
            params![content_id, version_no, identifier, value],
        )?;
        Ok(())
    }

    fn update(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: &str,
        value: &str,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE content_additional_information
             SET value = ?4
             WHERE content_id = ?1
               AND content_version_no = ?2
               AND identifier = ?3;",
            params![content_id, version_no, identifier, value],
        )?;
        debug!(
            "event=store_update module=repo status=ok content_id={content_id} version_no={version_no} changed={changed}"
        );
        Ok(())
    }

    fn delete(
        &self,
        content_id: ContentId,
        version_no: VersionNo,
        identifier: Option<&str>,
    ) -> RepoResult<()> {
        let changed = match identifier {
            Some(identifier) => self.conn.execute(
                "DELETE FROM content_additional_information
                 WHERE content_id = ?1
                   AND content_version_no = ?2
                   AND identifier = ?3;",
                params![content_id, version_no, identifier],
            )?,
            None => self.conn.execute(
                "DELETE FROM content_additional_information
                 WHERE content_id = ?1
                   AND content_version_no = ?2;",
                params![content_id, version_no],
            )?,
        };
        debug!(
            "event=store_delete module=repo status=ok content_id={content_id} version_no={version_no} changed={changed}"
        );
        Ok(())
    }

    fn purge(&self, content_ids: &[ContentId]) -> RepoResult<()> {
        if content_ids.is_empty() {
            return Ok(());
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut changed = 0;
        for batch in content_ids.chunks(PURGE_BATCH_SIZE) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!("DELETE FROM {TABLE_NAME} WHERE content_id IN ({placeholders});");
            let bind_values = batch.iter().map(|id| Value::Integer(*id));
            changed += tx.execute(&sql, params_from_iter(bind_values))?;
        }
        tx.commit()?;
        debug!(
            "event=store_purge module=repo status=ok content_ids={} changed={changed}",
            content_ids.len()
        );
        Ok(())
    }
}

fn parse_row(row: &Row<'_>) -> RepoResult<StoredRow> {
    Ok(StoredRow {
        content_id: row.get("content_id")?,
        version_no: row.get("content_version_no")?,
        identifier: row.get("identifier")?,
        value: row.get("value")?,
    })
}
