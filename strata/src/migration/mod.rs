//! Ordered, atomic schema migrations.
//!
//! A store carries a single integer schema version. Code that opens it
//! declares a [`MigrationRegistry`]: an ascending ladder of
//! [`MigrationStep`]s, each tagged with the version it produces. Opening the
//! store at a target version runs every step above the current version, up
//! to and including the target.
//!
//! # Creating Migrations
//!
//! ```rust,ignore
//! use strata::migration::MigrationRegistry;
//!
//! let registry = MigrationRegistry::builder()
//!     .step(1, "baseline", |session| session.execute_batch(BASELINE_SQL))
//!     .step(2, "call ringtones", |session| {
//!         session.execute_batch("ALTER TABLE recipient_preferences ADD COLUMN call_ringtone TEXT DEFAULT NULL;")
//!     })
//!     .build()?;
//!
//! let db = Strata::builder()
//!     .load_module(module)
//!     .migrations(registry)
//!     .open_or_create(&secret)?;
//! ```
//!
//! # Atomicity
//!
//! All steps of a run share one session. The new version is written as the
//! last change of that session. If any step fails, the session is rolled back
//! and the store keeps both its previous version and its previous contents.
//!
//! # Files
//!
//! Steps that make files obsolete queue them with
//! `StoreSession::schedule_removal`. The [`FileSweeper`] deletes them after
//! the run has committed.

mod migrator;
mod registry;
mod report;
mod run;
mod step;
mod sweep;

pub use migrator::*;
pub use registry::*;
pub use report::*;
pub use run::*;
pub use step::*;
pub use sweep::*;
