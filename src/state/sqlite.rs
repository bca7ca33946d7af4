//! SQLite-backed [`StateStore`].
//!
//! The database file is shared by every invocation.  SQLite makes each
//! statement atomic; the few operations that touch two tables run inside a
//! transaction.  A busy timeout lets a second invocation wait for a
//! concurrent writer instead of failing outright.

use super::schema::SCHEMA;
use super::StoreError;
use crate::command::{Visibility, WindowKind, RESERVED_NAME};
use crate::traits::{StateStore, TrackedEntry};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How long a write waits for another invocation holding the lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init(conn)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Take the write lock up front, so a concurrent writer makes this wait
    /// out the busy timeout instead of failing on lock upgrade.
    fn write_transaction(&self) -> Result<Transaction<'_>, StoreError> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl StateStore for SqliteStore {
    fn get_id(&self, name: &str) -> Result<Option<String>, StoreError> {
        let id = self
            .conn
            .query_row("SELECT id FROM tracked WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    fn store_id(&self, name: &str, id: &str) -> Result<(), StoreError> {
        debug!("store id {} for {}", id, name);
        self.conn.execute(
            "INSERT INTO tracked (name, id) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET id = excluded.id",
            [name, id],
        )?;
        Ok(())
    }

    fn destroy_id(&self, name: &str) -> Result<(), StoreError> {
        let tx = self.write_transaction()?;
        let id: Option<String> = tx
            .query_row("SELECT id FROM tracked WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;
        tx.execute("DELETE FROM tracked WHERE name = ?1", [name])?;
        if let Some(id) = &id {
            tx.execute("DELETE FROM state WHERE id = ?1", [id])?;
        }
        tx.commit()?;
        debug!("destroyed {} (id {:?})", name, id);
        Ok(())
    }

    fn set_state(&self, name: &str, visibility: Visibility) -> Result<(), StoreError> {
        let id = self
            .get_id(name)?
            .ok_or_else(|| StoreError::NotTracked(name.to_string()))?;
        debug!("set state of {} ({}) to {}", name, id, visibility);
        self.conn.execute(
            "INSERT INTO state (id, visibility) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET visibility = excluded.visibility",
            params![id, visibility.code()],
        )?;
        Ok(())
    }

    fn get_state(&self, id: &str) -> Result<Option<Visibility>, StoreError> {
        let state = self
            .conn
            .query_row("SELECT visibility FROM state WHERE id = ?1", [id], |row| {
                Ok(row
                    .get_ref(0)?
                    .as_i64()
                    .map_or(Visibility::Errored, Visibility::from_code))
            })
            .optional()?;
        Ok(state)
    }

    fn save_current(&self, name: &str, kind: WindowKind, id: &str) -> Result<(), StoreError> {
        if name == RESERVED_NAME || kind == WindowKind::Clean {
            return Err(StoreError::NotTrackable {
                name: name.to_string(),
                kind: kind.to_string(),
            });
        }
        debug!("tracking {} window {} as {}", kind, id, name);
        let tx = self.write_transaction()?;
        tx.execute(
            "INSERT INTO tracked (name, id) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET id = excluded.id",
            [name, id],
        )?;
        tx.execute(
            "INSERT INTO state (id, visibility) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET visibility = excluded.visibility",
            params![id, Visibility::NotVisible.code()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn record_latest_shown(&self, name: &str) -> Result<(), StoreError> {
        if name == RESERVED_NAME {
            return Err(StoreError::NotTrackable {
                name: name.to_string(),
                kind: "recent".to_string(),
            });
        }
        // Scores must strictly increase even for two shows within one
        // millisecond.
        self.conn.execute(
            "INSERT INTO recency (name, score)
             VALUES (?1, MAX(?2, (SELECT COALESCE(MAX(score), 0) + 1 FROM recency)))
             ON CONFLICT(name) DO UPDATE SET score = excluded.score",
            params![name, now_millis()],
        )?;
        Ok(())
    }

    fn latest_shown(&self) -> Result<Option<String>, StoreError> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM recency ORDER BY score DESC, name DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    fn latest_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recency", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn remove_from_latest(&self, name: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM recency WHERE name = ?1", [name])?;
        Ok(())
    }

    fn all_tracked(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT name, id FROM tracked")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<BTreeMap<_, _>, _>>()?)
    }

    fn all_hidden(&self) -> Result<Vec<TrackedEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, t.id FROM tracked t
             JOIN state s ON s.id = t.id
             WHERE s.visibility = ?1 AND t.name != ?2
             ORDER BY t.name",
        )?;
        let rows = stmt.query_map(params![Visibility::NotVisible.code(), RESERVED_NAME], |row| {
            Ok(TrackedEntry {
                name: row.get(0)?,
                id: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn reset_all(&self) -> Result<(), StoreError> {
        let tx = self.write_transaction()?;
        tx.execute("DELETE FROM tracked", [])?;
        tx.execute("DELETE FROM state", [])?;
        tx.execute("DELETE FROM recency", [])?;
        tx.commit()?;
        debug!("reset all tracking state");
        Ok(())
    }
}
