//! In-memory catalog store with the same semantics as the Postgres store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pixvault_core::{AppError, CatalogEntry};
use tokio::sync::RwLock;

use super::CatalogStore;

#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    entries: Arc<RwLock<HashMap<String, CatalogEntry>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, sorted by identity key.
    pub async fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.identity_key.cmp(&b.identity_key));
        entries
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn lookup(&self, identity_key: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .entries
            .read()
            .await
            .get(identity_key)
            .map(|entry| entry.remote_url.clone()))
    }

    async fn upsert(&self, identity_key: &str, remote_url: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(identity_key) {
            Some(entry) if entry.remote_url == remote_url => {}
            Some(entry) => {
                entry.remote_url = remote_url.to_string();
                entry.updated_at = now;
            }
            None => {
                entries.insert(
                    identity_key.to_string(),
                    CatalogEntry {
                        identity_key: identity_key.to_string(),
                        remote_url: remote_url.to_string(),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn get(&self, identity_key: &str) -> Result<Option<CatalogEntry>, AppError> {
        Ok(self.entries.read().await.get(identity_key).cloned())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.entries.read().await.len() as u64)
    }
}
