//! # agromie Core
//!
//! Domain-neutral types, traits, and error definitions for the agromie farm
//! command runtime. Every subsystem boundary (language model, tools, record
//! storage) is a trait here; implementations live in their own crates.
//!
//! This keeps the dependency graph pointing inward and lets tests swap in
//! scripted providers and in-memory stores.

pub mod error;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use message::{Message, MessageToolCall, Role};
pub use outcome::OperationOutcome;
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, ToolDefinition};
pub use store::KvStore;
pub use tool::{Tool, ToolCall, ToolRegistry};
