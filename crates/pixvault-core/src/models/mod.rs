//! Domain models shared across the pixvault crates.

pub mod batch;
pub mod catalog;

pub use batch::{BatchResult, BatchSummary, EntryOutcome, EntryStatus};
pub use catalog::CatalogEntry;
