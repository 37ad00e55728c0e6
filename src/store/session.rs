use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::error::SpyResult;

/// Persisted address of the last connected wallet; presence triggers auto-connect
pub const WALLET_ADDRESS_KEY: &str = "wallet_address";
/// Contract the operations helpers target by default
pub const CONTRACT_ADDRESS_KEY: &str = "contract_address";

/// Small key/value table that survives restarts
///
/// Cloning shares the underlying connection, so the wallet store, the public
/// store and the operations helpers all see the same values.
#[derive(Debug, Clone)]
pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SessionStore {
    pub fn open(path: &Path) -> SpyResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> SpyResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SpyResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave the table half-written
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> SpyResult<Option<String>> {
        let conn = self.lock();
        let value = conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> SpyResult<()> {
        self.lock().execute(
            "INSERT INTO session(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> SpyResult<()> {
        self.lock()
            .execute("DELETE FROM session WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Drop every persisted key
    pub fn clear(&self) -> SpyResult<()> {
        self.lock().execute("DELETE FROM session", [])?;
        Ok(())
    }

    pub fn keys(&self) -> SpyResult<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT key FROM session ORDER BY key")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.get(0)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite() {
        let store = SessionStore::in_memory().unwrap();
        assert_eq!(store.get(WALLET_ADDRESS_KEY).unwrap(), None);

        store.set(WALLET_ADDRESS_KEY, "juno1first").unwrap();
        store.set(WALLET_ADDRESS_KEY, "juno1second").unwrap();
        assert_eq!(
            store.get(WALLET_ADDRESS_KEY).unwrap().as_deref(),
            Some("juno1second")
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let store = SessionStore::in_memory().unwrap();
        store.set(WALLET_ADDRESS_KEY, "juno1abc").unwrap();
        store.set(CONTRACT_ADDRESS_KEY, "juno1contract").unwrap();

        store.remove(WALLET_ADDRESS_KEY).unwrap();
        assert_eq!(store.keys().unwrap(), vec![CONTRACT_ADDRESS_KEY.to_string()]);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_connection() {
        let store = SessionStore::in_memory().unwrap();
        let other = store.clone();
        other.set(CONTRACT_ADDRESS_KEY, "juno1shared").unwrap();
        assert_eq!(
            store.get(CONTRACT_ADDRESS_KEY).unwrap().as_deref(),
            Some("juno1shared")
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.sqlite3");
        {
            let store = SessionStore::open(&path).unwrap();
            store.set(WALLET_ADDRESS_KEY, "juno1persisted").unwrap();
        }
        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(WALLET_ADDRESS_KEY).unwrap().as_deref(),
            Some("juno1persisted")
        );
    }
}
