use std::{path::Path, sync::{Arc, Mutex}};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use super::KvStorage;

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up("
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT NOT NULL PRIMARY KEY,
                value TEXT NOT NULL
            );
        "),
    ])
}

/// Key-value storage in a single SQLite table.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations().to_latest(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl KvStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        log::debug!("STORAGE GET: key='{}'", key);
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire connection lock"))?;
        let value: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        log::debug!(
            "STORAGE GET RESULT: {}",
            value.as_ref().map_or("absent".to_string(), |v| format!("{} bytes", v.len()))
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        log::debug!("STORAGE SET: key='{}', size={} bytes", key, value.len());
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire connection lock"))?;
        let affected = conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        log::debug!("STORAGE SET RESULT: {} rows affected", affected);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        log::debug!("STORAGE DELETE: key='{}'", key);
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire connection lock"))?;
        let affected = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        log::debug!("STORAGE DELETE RESULT: {} rows affected", affected);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("STORAGE LIST: prefix='{}'", prefix);
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire connection lock"))?;
        // substr() instead of LIKE so '%' and '_' in prefixes are literal
        let mut stmt = conn.prepare(
            "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        log::debug!("STORAGE LIST RESULT: {} items", keys.len());
        Ok(keys)
    }
}
