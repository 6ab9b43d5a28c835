//! pixvault Storage Library
//!
//! Storage abstraction for the media store that ingested images are uploaded
//! to, with implementations for S3-compatible object stores and the local
//! filesystem.
//!
//! # Storage key format
//!
//! Keys are `{prefix}/{filename}` where the prefix comes from configuration
//! (default `uploads`). Keys must not contain `..` or a leading `/`. Key
//! generation is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use pixvault_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
