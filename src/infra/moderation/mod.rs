// Filter store implementations for the moderation system.
#![allow(unused_imports)]

pub mod in_memory;
pub mod sqlite_filter_store;

// Re-export for convenience
pub use in_memory::InMemoryFilterStore;
pub use sqlite_filter_store::SqliteFilterStore;
