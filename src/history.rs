use crate::storage::Storage;
use crate::types::{HistoryEntry, ReceiptData};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Single storage key under which the whole collection is persisted.
pub const HISTORY_KEY: &str = "receipt_processing_history";
/// Oldest entries are evicted past this count.
pub const MAX_HISTORY_ITEMS: usize = 50;

/// Budget assumed for the backing store when reporting usage.
const STORAGE_BUDGET_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageUsage {
    pub used: u64,
    pub percentage: f64,
}

fn to_radix36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut s = Vec::new();
    while n > 0 {
        s.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    s.reverse();
    String::from_utf8(s).unwrap_or_default()
}

/// Opaque unique id: creation millis plus a process-local counter, both in
/// radix 36.
fn generate_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}", to_radix36(millis), to_radix36(count))
}

/// Bounded, newest-first history of processing attempts over an injected
/// [`Storage`]. Every mutation persists the full sequence before returning;
/// unreadable persisted state degrades to an empty store, never an error.
pub struct HistoryStore<S: Storage> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: Storage> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        HistoryStore {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Record a completed recognition attempt. Returns the stored entry.
    pub fn record_success(
        &self,
        file_name: &str,
        data: ReceiptData,
        thumbnail: Option<String>,
        processing_time: Option<u64>,
    ) -> Result<HistoryEntry, String> {
        let entry = HistoryEntry {
            id: generate_id(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            file_name: file_name.to_string(),
            data: Some(data),
            error: None,
            thumbnail,
            processing_time,
        };
        self.insert(entry.clone())?;
        Ok(entry)
    }

    /// Record a failed attempt; the entry carries the message instead of a
    /// receipt so failures stay visible in the history.
    pub fn record_failure(
        &self,
        file_name: &str,
        error: &str,
        processing_time: Option<u64>,
    ) -> Result<HistoryEntry, String> {
        let entry = HistoryEntry {
            id: generate_id(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            file_name: file_name.to_string(),
            data: None,
            error: Some(error.to_string()),
            thumbnail: None,
            processing_time,
        };
        self.insert(entry.clone())?;
        Ok(entry)
    }

    /// Prepend an entry, evicting the oldest past [`MAX_HISTORY_ITEMS`].
    pub fn insert(&self, entry: HistoryEntry) -> Result<(), String> {
        let _guard = self.write_lock.lock().map_err(|e| e.to_string())?;
        let mut entries = self.load();
        entries.insert(0, entry);
        entries.truncate(MAX_HISTORY_ITEMS);
        self.persist(&entries)
    }

    /// Full collection, newest first. Filtering or sorting the result never
    /// touches stored state.
    pub fn list_all(&self) -> Vec<HistoryEntry> {
        self.load()
    }

    /// Case-insensitive file-name filter. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<HistoryEntry> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.load();
        }
        self.load()
            .into_iter()
            .filter(|e| e.file_name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<HistoryEntry> {
        self.load().into_iter().find(|e| e.id == id)
    }

    /// Remove the entry with this id. Absent ids are not an error.
    pub fn delete_by_id(&self, id: &str) -> Result<(), String> {
        let _guard = self.write_lock.lock().map_err(|e| e.to_string())?;
        let mut entries = self.load();
        entries.retain(|e| e.id != id);
        self.persist(&entries)
    }

    /// Remove every entry whose id is in `ids`, duplicates included.
    pub fn delete_many(&self, ids: &[String]) -> Result<(), String> {
        let _guard = self.write_lock.lock().map_err(|e| e.to_string())?;
        let doomed: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut entries = self.load();
        entries.retain(|e| !doomed.contains(e.id.as_str()));
        self.persist(&entries)
    }

    pub fn clear(&self) -> Result<(), String> {
        let _guard = self.write_lock.lock().map_err(|e| e.to_string())?;
        self.storage.remove(HISTORY_KEY)
    }

    /// Size of the persisted blob against the assumed storage budget.
    pub fn storage_usage(&self) -> StorageUsage {
        let used = match self.storage.get(HISTORY_KEY) {
            Ok(Some(bytes)) => bytes.len() as u64,
            _ => 0,
        };
        StorageUsage {
            used,
            percentage: used as f64 / STORAGE_BUDGET_BYTES as f64 * 100.0,
        }
    }

    fn load(&self) -> Vec<HistoryEntry> {
        let bytes = match self.storage.get(HISTORY_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                eprintln!("[history] Could not read stored history: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("[history] Could not parse stored history: {}", e);
                Vec::new()
            }
        }
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<(), String> {
        let bytes = serde_json::to_vec(entries).map_err(|e| e.to_string())?;
        self.storage.set(HISTORY_KEY, &bytes)
    }
}
