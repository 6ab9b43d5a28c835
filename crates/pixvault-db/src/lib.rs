//! pixvault Database Library
//!
//! The catalog store: the durable mapping from identity key to remote URL.
//! Postgres is the production backend; an in-memory store with the same
//! semantics backs tests and throwaway runs.

pub mod catalog;
pub mod setup;

pub use catalog::{CatalogStore, MemoryCatalogStore, PostgresCatalogStore};
pub use setup::{run_migrations, setup_database};
