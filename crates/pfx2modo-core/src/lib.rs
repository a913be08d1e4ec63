//! Core library for pfx2modo.
//!
//! Migrates a PostfixAdmin database into a Modoboa one: domains, domain
//! aliases, mailboxes and their user accounts, mail aliases and
//! administrators, all inside one destination transaction.

pub mod config;
pub mod db;
pub mod error;
pub mod migration;
pub mod modoboa;
pub mod pfxadmin;
pub mod testing;

pub use config::{ConnectionConfig, Settings};
pub use error::{MigrateError, Result};
pub use migration::{MigrationOptions, MigrationReport};
