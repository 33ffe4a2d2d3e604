//! Storage backends for URL mappings and sequence counters.

pub mod memory;
pub mod mysql;
pub mod schema;

pub use burrow_core::error::{ConflictTarget, StorageError};
pub use burrow_core::repository::{ReadRepository, Repository, Result, SequenceCounter};
pub use memory::{InMemoryRepository, InMemorySequenceCounter};
pub use mysql::{MySqlRepository, MySqlSequenceCounter};
