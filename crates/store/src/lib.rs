//! Record store implementations for agromie.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;
