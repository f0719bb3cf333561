//! Transfer orchestrator - per-table workflow coordinator.

use crate::config::Config;
use crate::error::{Result, TransferError};
use crate::source::{MssqlSource, SourcePool, TableDef};
use crate::sqlgen::{ddl, dml};
use crate::target::{PgTarget, TargetPool};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Per-run options, populated from the CLI at the boundary.
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Print generated SQL instead of executing it. Never opens a target
    /// connection.
    pub dry_run: bool,

    /// Restrict the run to a single table.
    pub table: Option<String>,

    /// Emit row data as well as the table definition.
    pub include_data: bool,

    /// Emit only row data, no table definition.
    pub data_only: bool,
}

impl TransferOptions {
    fn wants_definition(&self) -> bool {
        !self.data_only
    }

    fn wants_data(&self) -> bool {
        self.include_data || self.data_only
    }
}

/// Progress of one table through the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStage {
    NotStarted,
    DefinitionEmitted,
    DataEmitted,
    Done,
    Failed,
}

/// Outcome of one table.
#[derive(Debug)]
pub struct TableReport {
    pub table: String,
    pub stage: TableStage,
    pub rows_inserted: u64,
    pub rows_skipped: u64,
    pub error: Option<String>,
}

impl TableReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            stage: TableStage::NotStarted,
            rows_inserted: 0,
            rows_skipped: 0,
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.stage == TableStage::Failed
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn tables_total(&self) -> usize {
        self.tables.len()
    }

    pub fn tables_failed(&self) -> usize {
        self.tables.iter().filter(|t| t.failed()).count()
    }

    pub fn rows_inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_inserted).sum()
    }

    pub fn rows_skipped(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_skipped).sum()
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.failed())
            .map(|t| t.table.as_str())
            .collect()
    }
}

/// Transfer orchestrator. Owns the source pool and, for non-dry runs, the
/// target pool.
pub struct Orchestrator {
    config: Config,
    options: TransferOptions,
    source: Arc<dyn SourcePool>,
    target: Option<Arc<dyn TargetPool>>,
}

impl Orchestrator {
    /// Connect to the source and, unless this is a dry run, the target.
    ///
    /// A connectivity failure here is fatal for the run.
    pub async fn connect(config: Config, options: TransferOptions) -> Result<Self> {
        let source = MssqlSource::connect(config.source.clone()).await?;

        let target: Option<Arc<dyn TargetPool>> = if options.dry_run {
            debug!("dry run: skipping target connection");
            None
        } else {
            Some(Arc::new(PgTarget::connect(&config.target).await?))
        };

        Ok(Self {
            config,
            options,
            source: Arc::new(source),
            target,
        })
    }

    /// Run the transfer for the selected tables.
    ///
    /// Table-level failures are isolated: they are recorded in the report
    /// and logged, and the batch moves on to the next table. Foreign key
    /// statements are deferred to a second pass after every table's
    /// definition has been emitted, so a constraint never references a
    /// table the batch has not created yet.
    pub async fn run(&self) -> Result<RunReport> {
        let tables = self.select_tables().await?;
        info!("transferring {} table(s)", tables.len());

        let mut report = RunReport::default();
        let mut deferred_fks: Vec<(usize, Vec<String>)> = Vec::new();

        for table in &tables {
            let (table_report, fk_statements) = self.transfer_table(table).await?;

            if !fk_statements.is_empty() && !table_report.failed() {
                deferred_fks.push((report.tables.len(), fk_statements));
            }
            report.tables.push(table_report);
        }

        for (idx, statements) in deferred_fks {
            if let Err(e) = self.emit_all(&statements).await {
                if e.is_fatal() {
                    return Err(e);
                }
                let entry = &mut report.tables[idx];
                entry.stage = TableStage::Failed;
                entry.error = Some(e.to_string());
            }
        }

        for table_report in &report.tables {
            match table_report.stage {
                TableStage::Failed => error!(
                    "{}: failed - {}",
                    table_report.table,
                    table_report.error.as_deref().unwrap_or("unknown error")
                ),
                _ => info!(
                    "{}: done ({} rows inserted, {} skipped)",
                    table_report.table, table_report.rows_inserted, table_report.rows_skipped
                ),
            }
        }

        info!(
            "run complete: {}/{} tables ok, {} rows inserted, {} rows skipped",
            report.tables_total() - report.tables_failed(),
            report.tables_total(),
            report.rows_inserted(),
            report.rows_skipped()
        );

        Ok(report)
    }

    /// Resolve which tables this run covers: the CLI override, then the
    /// configured list, then everything introspection finds.
    async fn select_tables(&self) -> Result<Vec<String>> {
        if let Some(ref table) = self.options.table {
            return Ok(vec![table.clone()]);
        }

        if !self.config.transfer.tables.is_empty() {
            return Ok(self.config.transfer.tables.clone());
        }

        self.source.list_tables().await
    }

    /// Transfer one table, converting any table-level error into a Failed
    /// report entry. Fatal errors (pool exhaustion, lost connectivity) are
    /// propagated so the whole run stops instead of failing every remaining
    /// table the same way. Returns the foreign key statements generated for
    /// the table; the caller runs them once the batch is done.
    async fn transfer_table(&self, table: &str) -> Result<(TableReport, Vec<String>)> {
        let mut report = TableReport::new(table);
        let mut fk_statements = Vec::new();

        if let Err(e) = self
            .transfer_table_inner(table, &mut report, &mut fk_statements)
            .await
        {
            if e.is_fatal() {
                return Err(e);
            }
            report.stage = TableStage::Failed;
            report.error = Some(e.to_string());
        }

        Ok((report, fk_statements))
    }

    async fn transfer_table_inner(
        &self,
        table: &str,
        report: &mut TableReport,
        fk_statements: &mut Vec<String>,
    ) -> Result<()> {
        let def = self.source.describe_table(table).await?;

        if self.options.wants_definition() {
            fk_statements.extend(self.emit_definition(&def).await?);
            report.stage = TableStage::DefinitionEmitted;
        }

        if self.options.wants_data() {
            self.emit_data(&def, report).await?;
            report.stage = TableStage::DataEmitted;
        }

        report.stage = TableStage::Done;
        Ok(())
    }

    /// Generate and emit the CREATE TABLE and primary key statements for one
    /// table. Foreign key statements are generated here but returned instead
    /// of emitted, since the tables they reference may come later in the
    /// batch.
    async fn emit_definition(&self, def: &TableDef) -> Result<Vec<String>> {
        let mut statements = vec![ddl::create_table(def)?];

        if let Some(pk_sql) = ddl::primary_key(&def.name, def.primary_key.as_ref())? {
            statements.push(pk_sql);
        }

        self.emit_all(&statements).await?;

        debug!("{}: emitted {} definition statement(s)", def.name, statements.len());
        ddl::foreign_keys(&def.name, &def.foreign_keys)
    }

    /// Stream rows from the source and emit one INSERT per row.
    ///
    /// Rows flow through a bounded channel: the reader task converts them as
    /// they arrive from the cursor and this side renders and executes each
    /// statement before pulling the next, so memory stays flat for large
    /// tables. A row that cannot be escaped is skipped and counted; an
    /// execution failure fails the table.
    async fn emit_data(&self, def: &TableDef, report: &mut TableReport) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(self.config.transfer.get_row_buffer());

        let source = self.source.clone();
        let table = def.name.clone();
        let columns = def.columns.clone();
        let reader =
            tokio::spawn(async move { source.stream_rows(&table, &columns, tx).await });

        while let Some(row) = rx.recv().await {
            match dml::insert_statement(&def.name, &def.columns, &row, def.primary_key.as_ref()) {
                Ok(sql) => {
                    self.emit(&sql).await?;
                    report.rows_inserted += 1;
                }
                Err(e) => {
                    warn!("{}: skipping row: {}", def.name, e);
                    report.rows_skipped += 1;
                }
            }
        }

        reader
            .await
            .map_err(|e| TransferError::execution(&def.name, format!("reader task failed: {}", e)))??;

        Ok(())
    }

    async fn emit_all(&self, statements: &[String]) -> Result<()> {
        for sql in statements {
            self.emit(sql).await?;
        }
        Ok(())
    }

    /// Print (dry run) or execute one statement.
    async fn emit(&self, sql: &str) -> Result<()> {
        match &self.target {
            None => {
                println!("{}", sql);
                Ok(())
            }
            Some(target) => target.execute(sql).await,
        }
    }
}
