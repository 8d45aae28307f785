//! Farm domain for agromie.
//!
//! [`OperationExecutor`] runs one named operation (a posting, a sale, a
//! pasture registration, a query...) against a [`KvStore`](agromie_core::KvStore)
//! and always answers with an [`OperationOutcome`](agromie_core::OperationOutcome).
//! The remaining modules are the pieces it is built from.

pub mod args;
pub mod catalog;
pub mod executor;
pub mod format;
pub mod herd;
pub mod ledger;
pub mod operation;
pub mod pasture;
pub mod records;
pub mod repo;

mod ops;

pub use executor::OperationExecutor;
pub use operation::{Operation, OperationKind};
pub use records::keys;
pub use repo::Records;
