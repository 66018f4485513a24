use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::RwLock};

/// Per-user cap; the oldest entry is evicted on overflow
pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub user_id: u64,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence port for the search-history list. `add` must perform its
/// count/evict/insert sequence atomically so concurrent submissions from one
/// user cannot exceed the cap.
pub trait HistoryStore: Send + Sync {
    /// Up to [`MAX_ENTRIES`] entries, newest first.
    fn list(&self, user_id: u64) -> Result<Vec<HistoryEntry>>;

    /// Upsert by query text: re-submitting an existing query refreshes its
    /// timestamp instead of duplicating. The query is stored trimmed.
    fn add(&self, user_id: u64, query: &str) -> Result<HistoryEntry>;

    /// Delete one entry, scoped to its owner. Returns false when absent.
    fn delete(&self, user_id: u64, id: u64) -> Result<bool>;

    fn clear(&self, user_id: u64) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryData {
    entries: Vec<HistoryEntry>,
    next_id: u64,
}

const DATA_FILE: &str = "search_history.json";

pub struct BackendJson {
    data: RwLock<HistoryData>,
    path: PathBuf,
}

impl BackendJson {
    pub fn load(base_path: &str) -> Result<Self> {
        let path = PathBuf::from(base_path).join(DATA_FILE);

        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HistoryData {
                next_id: 1,
                ..Default::default()
            }
        };

        Ok(Self {
            data: RwLock::new(data),
            path,
        })
    }

    fn persist(&self, data: &HistoryData) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }
}

/// Age ordering; id breaks ties between entries created in the same instant.
fn age_key(entry: &HistoryEntry) -> (DateTime<Utc>, u64) {
    (entry.created_at, entry.id)
}

impl HistoryStore for BackendJson {
    fn list(&self, user_id: u64) -> Result<Vec<HistoryEntry>> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow!("history lock poisoned"))?;

        let mut entries: Vec<HistoryEntry> = data
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| age_key(b).cmp(&age_key(a)));
        entries.truncate(MAX_ENTRIES);

        Ok(entries)
    }

    fn add(&self, user_id: u64, query: &str) -> Result<HistoryEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Err(anyhow!("query is required"));
        }

        // single critical section: refresh-or-evict-and-insert
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("history lock poisoned"))?;

        if let Some(existing) = data
            .entries
            .iter_mut()
            .find(|e| e.user_id == user_id && e.query == query)
        {
            existing.created_at = Utc::now();
            let entry = existing.clone();
            self.persist(&data)?;
            return Ok(entry);
        }

        let count = data.entries.iter().filter(|e| e.user_id == user_id).count();
        if count >= MAX_ENTRIES {
            let oldest = data
                .entries
                .iter()
                .filter(|e| e.user_id == user_id)
                .min_by_key(|e| age_key(e))
                .map(|e| e.id);
            if let Some(id) = oldest {
                data.entries.retain(|e| e.id != id);
            }
        }

        let entry = HistoryEntry {
            id: data.next_id,
            user_id,
            query: query.to_string(),
            created_at: Utc::now(),
        };
        data.next_id += 1;
        data.entries.push(entry.clone());

        self.persist(&data)?;
        Ok(entry)
    }

    fn delete(&self, user_id: u64, id: u64) -> Result<bool> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("history lock poisoned"))?;

        let before = data.entries.len();
        data.entries.retain(|e| !(e.id == id && e.user_id == user_id));

        if data.entries.len() == before {
            return Ok(false);
        }

        self.persist(&data)?;
        Ok(true)
    }

    fn clear(&self, user_id: u64) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("history lock poisoned"))?;

        data.entries.retain(|e| e.user_id != user_id);

        self.persist(&data)?;
        Ok(())
    }
}
