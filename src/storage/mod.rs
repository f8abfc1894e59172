//! Persistent storage tiers.

pub mod disk;
pub mod error;

pub use disk::DiskStore;
pub use error::StorageError;
