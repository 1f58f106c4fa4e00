use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Local persistent key-value capability the history store writes through.
/// Injected so the store owns no ambient global state and tests can run
/// against an in-memory fake.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), String> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        (**self).remove(key)
    }
}

/// Volatile in-memory storage. Clones share the same map, which doubles as
/// a process-restart stand-in for tests.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        let entries = self.entries.lock().map_err(|e| e.to_string())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), String> {
        let mut entries = self.entries.lock().map_err(|e| e.to_string())?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        let mut entries = self.entries.lock().map_err(|e| e.to_string())?;
        entries.remove(key);
        Ok(())
    }
}

/// Durable storage over a single-table SQLite database in the host's data
/// directory.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn new(db_path: PathBuf) -> Result<Self, String> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let conn = Connection::open(&db_path).map_err(|e| e.to_string())?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            );",
        )
        .map_err(|e| e.to_string())?;
        Ok(SqliteStorage {
            conn: Mutex::new(conn),
        })
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare("SELECT value FROM kv WHERE key = ?")
            .map_err(|e| e.to_string())?;
        let mut rows = stmt.query(params![key]).map_err(|e| e.to_string())?;
        match rows.next().map_err(|e| e.to_string())? {
            Some(row) => {
                let value: Vec<u8> = row.get(0).map_err(|e: rusqlite::Error| e.to_string())?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), String> {
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_roundtrips_and_shares_across_clones() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", b"v1").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some(&b"v1"[..]));

        let clone = storage.clone();
        clone.set("k", b"v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some(&b"v2"[..]));

        storage.remove("k").unwrap();
        assert_eq!(clone.get("k").unwrap(), None);
        // Removing a missing key is not an error.
        storage.remove("k").unwrap();
    }

    #[test]
    fn sqlite_storage_roundtrips_on_disk() {
        let dir = std::env::temp_dir().join(format!("receipt_kv_test_{}", std::process::id()));
        let db_path = dir.join("store.db");

        {
            let storage = SqliteStorage::new(db_path.clone()).expect("open storage");
            storage.set("history", b"[1,2,3]").unwrap();
            assert_eq!(
                storage.get("history").unwrap().as_deref(),
                Some(&b"[1,2,3]"[..])
            );
            storage.set("history", b"[]").unwrap();
            assert_eq!(storage.get("history").unwrap().as_deref(), Some(&b"[]"[..]));
        }

        // A fresh connection sees the last write.
        let reopened = SqliteStorage::new(db_path).expect("reopen storage");
        assert_eq!(reopened.get("history").unwrap().as_deref(), Some(&b"[]"[..]));
        reopened.remove("history").unwrap();
        assert_eq!(reopened.get("history").unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
