//! Transaction log
//!
//! Every score or mint request is recorded as pending and filled in when the
//! backend answers. Newest first, capped, persisted to LocalStorage.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::services::{ServiceResponse, describe_failure};

/// Maximum number of entries kept
pub const MAX_TRANSACTIONS: usize = 50;
pub const PENDING: &str = "Pending...";
/// Shown for entries still pending when the page was reloaded
pub const NOT_PROCESSED: &str = "Not processed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    /// "Kill: N", "Death: N" or "Mint: N"
    #[serde(rename = "type")]
    pub label: String,
    /// Explorer link, or a placeholder while unresolved
    pub link: String,
    /// Unix timestamp (ms) of the last update
    pub date: f64,
    #[serde(default)]
    pub error: String,
    #[serde(default, rename = "userAddress")]
    pub user_address: Option<String>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.link == PENDING
    }

    /// Text for the status column
    pub fn status(&self) -> &str {
        if self.error.is_empty() { &self.link } else { &self.error }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
    next_id: u64,
}

impl TransactionLog {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "transactions";

    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a saved log. Anything left pending becomes "Not processed".
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let mut entries: Vec<Transaction> = serde_json::from_str(json)?;
        for tx in &mut entries {
            if tx.link.is_empty() || tx.is_pending() {
                tx.link = NOT_PROCESSED.to_string();
            }
        }
        entries.truncate(MAX_TRANSACTIONS);
        let next_id = entries.iter().map(|t| t.id + 1).max().unwrap_or(0);
        Ok(Self { entries, next_id })
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Newest first
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record a new pending request; returns its id
    pub fn push_pending(&mut self, label: String, now_ms: f64, user_address: Option<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            0,
            Transaction {
                id,
                label,
                link: PENDING.to_string(),
                date: now_ms,
                error: String::new(),
                user_address,
            },
        );
        self.entries.truncate(MAX_TRANSACTIONS);
        id
    }

    /// Fill in a request's outcome. Returns false if the entry was evicted.
    pub fn resolve(&mut self, id: u64, result: Result<ServiceResponse, Error>, now_ms: f64) -> bool {
        let Some(tx) = self.entries.iter_mut().find(|t| t.id == id) else {
            log::warn!("Transaction {id} resolved after eviction");
            return false;
        };
        tx.date = now_ms;
        match result {
            Ok(reply) if reply.is_success() => {
                tx.link = reply.url.unwrap_or_default();
                tx.error.clear();
            }
            Ok(reply) => {
                tx.link = reply.url.unwrap_or_default();
                tx.error = describe_failure(reply.error.as_deref().unwrap_or_default());
            }
            Err(Error::Service(raw)) => {
                tx.link.clear();
                tx.error = describe_failure(&raw);
            }
            Err(Error::NotAuthenticated) => {
                tx.link.clear();
                tx.error = Error::NotAuthenticated.to_string();
            }
            Err(e) => {
                log::warn!("Transaction {id} failed: {e}");
                tx.link.clear();
                tx.error = "Unexpected error".to_string();
            }
        }
        true
    }

    /// Load the log from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(saved) => {
                        log::info!("Loaded {} transactions", saved.len());
                        // Persist the "Not processed" rewrite right away
                        let _ = saved.save();
                        return saved;
                    }
                    Err(e) => log::warn!("Discarding saved transactions: {e}"),
                }
            }
        }
        Self::new()
    }

    /// Save the log to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), Error> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| Error::Storage("LocalStorage unavailable".into()))?;
        let json = self.to_json()?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| Error::Storage("write rejected".into()))
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), Error> {
        Ok(())
    }
}
