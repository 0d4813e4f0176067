//! # Strata - Versioned Store Opener
//!
//! Strata opens a credentialed, durable store and brings its schema to the
//! version the running code expects. The schema evolves through an ordered
//! ladder of migration steps; every step above the store's current version is
//! applied, in order, inside a single atomic unit of work.
//!
//! ## Key Features
//!
//! - **Ordered Migrations**: Steps are tagged with the version they produce and
//!   run in ascending order
//! - **All or Nothing**: A failed run leaves both version and contents untouched
//! - **No Downgrades**: Opening a newer store with older code is rejected
//! - **Credentials**: The secret is verified against an Argon2 verifier
//! - **Deferred File Cleanup**: Files made obsolete by a migration are removed
//!   only after the run has committed
//! - **Pluggable Storage**: In-memory storage built in, SQLite/SQLCipher through
//!   `strata-sqlite-adapter`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use secure_string::SecureString;
//! use strata::migration::MigrationRegistry;
//! use strata::store::memory::{InMemoryStoreModule, MemorySession};
//! use strata::Strata;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = MigrationRegistry::builder()
//!     .step(1, "contacts", |session: &mut MemorySession| session.create_table("contacts"))
//!     .step(2, "drafts", |session: &mut MemorySession| session.create_table("drafts"))
//!     .build()?;
//!
//! let db = Strata::builder()
//!     .load_module(InMemoryStoreModule::new())
//!     .migrations(registry)
//!     .open_or_create(&SecureString::from("secret"))?;
//!
//! assert_eq!(db.schema_version()?, 2);
//! db.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Constants, locks and shared utilities
//! - [`errors`] - Error types and result definitions
//! - [`metadata`] - Store metadata
//! - [`migration`] - Migration steps, registry, runner and file sweeper
//! - [`store`] - Storage abstractions and the in-memory store
//! - [`strata`] - The opened-store handle
//! - [`strata_builder`] - Builder for opening a store
//! - [`strata_config`] - Handle configuration

pub mod common;
pub mod errors;
pub mod metadata;
pub mod migration;
pub mod store;
pub mod strata;
pub mod strata_builder;
pub mod strata_config;

pub use crate::strata::Strata;
pub use crate::strata_builder::StrataBuilder;
pub use crate::strata_config::StrataConfig;
