//! Catalog store abstraction and implementations.

mod memory;
mod postgres;

pub use memory::MemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

use async_trait::async_trait;
use pixvault_core::{AppError, CatalogEntry};

/// Durable identity key to remote URL mapping.
///
/// The store is the single source of truth for at-most-one entry per
/// identity key; callers hold no locks of their own.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// URL recorded for `identity_key`. Absence is `Ok(None)`; only a backing
    /// store fault is an error (`StoreUnavailable`).
    async fn lookup(&self, identity_key: &str) -> Result<Option<String>, AppError>;

    /// Insert or overwrite the mapping for `identity_key`.
    ///
    /// The later write wins. Writing the same URL again is a no-op, and a
    /// duplicate-key race with a concurrent writer is not an error.
    async fn upsert(&self, identity_key: &str, remote_url: &str) -> Result<(), AppError>;

    /// Full entry including timestamps.
    async fn get(&self, identity_key: &str) -> Result<Option<CatalogEntry>, AppError>;

    /// Number of entries in the catalog.
    async fn count(&self) -> Result<u64, AppError>;
}
