//! The migration driver and its helpers.
//!
//! [`run`] walks a PostfixAdmin database in dependency order and recreates
//! every domain, mailbox, alias and administrator on the Modoboa side. It
//! only talks to the [`SourceStore`](crate::pfxadmin::SourceStore) and
//! [`DestStore`](crate::modoboa::DestStore) traits, so the same driver runs
//! against live databases and against the in-memory stores used in tests.

mod address;
mod driver;
mod password;
mod report;

pub use address::{local_part, split_address};
pub use driver::{run, MigrationOptions};
pub use password::format_password;
pub use report::MigrationReport;
