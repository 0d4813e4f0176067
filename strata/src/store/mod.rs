//! Storage abstractions.
//!
//! Strata never talks to a database directly. It drives a [`SchemaStore`],
//! which owns the durable schema-version slot, a small metadata area and the
//! queue of files scheduled for removal, and opens [`StoreSession`]s that
//! group every change of a migration run into one atomic unit.
//!
//! # Providers
//!
//! - **In-Memory Store**: [`memory::InMemoryStore`] for tests and temporary data
//! - **SQLite Store**: `strata-sqlite-adapter` for file-backed, optionally
//!   SQLCipher-encrypted databases
//!
//! Stores are handed to [`crate::Strata`] through a [`StoreModule`].

pub mod memory;
mod schema_store;
mod store_module;

pub use schema_store::*;
pub use store_module::*;
