//! SQLite storage for Strata.
//!
//! [`SqliteStore`] keeps the schema version in `PRAGMA user_version` and
//! runs every migration inside one `BEGIN IMMEDIATE` transaction. Built with
//! the `sqlcipher` feature, the database file is encrypted with the secret
//! supplied at open.
//!
//! The [`schema`] module carries the messenger database ladder.

mod config;
mod error;
mod module;
pub mod schema;
mod session;
mod store;

pub use config::*;
pub use error::*;
pub use module::*;
pub use schema::{
    messenger_registry, open_messenger_store, DATABASE_NAME, DATABASE_VERSION,
};
pub use session::*;
pub use store::*;
