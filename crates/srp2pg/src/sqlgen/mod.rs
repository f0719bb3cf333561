//! SQL statement generation for the PostgreSQL target.

pub mod ddl;
pub mod dml;
pub mod escape;
pub mod ident;

pub use ddl::{create_table, foreign_keys, primary_key};
pub use dml::{insert_statement, insert_statements, InsertBatch};
pub use escape::escape;
