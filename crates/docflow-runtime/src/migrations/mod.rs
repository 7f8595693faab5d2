//! Versioned schema migrations.
//!
//! Only one node runs migrations at a time; the runner serializes on a
//! PostgreSQL advisory lock.

mod builtin;
mod runner;

pub use builtin::get_builtin_migrations;
pub use runner::{Migration, MigrationRunner};
