//! Persistence Layer
//!
//! The engagement history lives in a single JSON file on local disk.

mod snapshot_store;

pub use snapshot_store::SnapshotStore;
