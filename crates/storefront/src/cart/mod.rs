//! Cart store: durable storage plus change notifications.

mod bus;
mod storage;
mod store;

pub use bus::{CartBadge, CartBus, CartChange};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::CartStore;
