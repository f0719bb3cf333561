//! # srp2pg
//!
//! Schema-introspection-driven SQL Server to PostgreSQL transfer.
//!
//! The library introspects a source SQL Server database through its
//! `INFORMATION_SCHEMA` views, generates PostgreSQL `CREATE TABLE` /
//! `ALTER TABLE` / `INSERT ... ON CONFLICT DO NOTHING` statements from the
//! metadata, and either prints them (dry run) or executes them against a
//! target connection:
//!
//! - **Type mapping** over a fixed SQL Server → PostgreSQL table
//! - **DDL generation** for tables, primary keys, and foreign keys
//! - **Row streaming** with per-row INSERT generation and literal escaping
//! - **Per-table error isolation** so one bad table never aborts a batch
//!
//! ## Example
//!
//! ```rust,no_run
//! use srp2pg::{Config, Orchestrator, TransferOptions};
//!
//! #[tokio::main]
//! async fn main() -> srp2pg::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let options = TransferOptions {
//!         dry_run: true,
//!         include_data: true,
//!         ..Default::default()
//!     };
//!     let orchestrator = Orchestrator::connect(config, options).await?;
//!     let report = orchestrator.run().await?;
//!     println!("{} rows", report.rows_inserted());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod sqlgen;
pub mod target;
pub mod typemap;
pub mod value;

// Re-exports for convenient access
pub use config::{Config, SourceConfig, TargetConfig, TransferConfig};
pub use error::{Result, TransferError};
pub use orchestrator::{Orchestrator, RunReport, TableReport, TableStage, TransferOptions};
pub use source::{Column, ForeignKey, MssqlSource, PrimaryKey, SourcePool, TableDef};
pub use target::{PgTarget, TargetPool};
pub use value::SqlValue;
