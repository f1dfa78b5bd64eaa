//! PostgreSQL bootstrap for the sparkify schema: recreate the database, then
//! drop and create its tables.

pub mod bootstrap;
pub mod error;
pub mod ident;
pub mod introspect;
pub mod session;
pub mod tables;

pub use bootstrap::{bootstrap_database, recreate_statements};
pub use error::{DbError, ErrorKind};
pub use introspect::list_tables;
pub use session::{DdlExecutor, Session};
pub use tables::{create_tables, drop_tables, Phase};
