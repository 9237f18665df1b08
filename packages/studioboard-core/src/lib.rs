pub mod boards;
pub mod config;
pub mod error;
pub mod events;
pub mod ideas;
pub mod ordering;
pub mod quick_add;
pub mod requests;
pub mod search;
pub mod storage;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{BoardError, Resource, Result, ValidationError};
pub use storage::sqlite::SqliteStorage;
pub use storage::{BoardStore, StorageError, StoreTx};
