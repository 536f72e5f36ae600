pub mod error;
pub mod keys;
pub mod locks;
pub mod store;

pub use error::StoreError;
pub use locks::EntityLocks;
pub use store::{MemoryStore, SnapshotStore, load, save};
