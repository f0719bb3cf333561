//! SQL Server source: connection pooling, schema introspection, row reading.

mod types;

pub use types::*;

use crate::config::SourceConfig;
use crate::error::{Result, TransferError};
use crate::sqlgen::ident::quote_mssql;
use crate::value::SqlValue;
use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, QueryItem, Row};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Source database operations the orchestrator needs.
#[async_trait]
pub trait SourcePool: Send + Sync {
    /// Enumerate all user tables in the source database.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Full table descriptor: columns, primary key, foreign keys.
    async fn describe_table(&self, table: &str) -> Result<TableDef>;

    /// Stream all rows of a table into a bounded channel, one converted row
    /// at a time. Returns the number of rows sent.
    async fn stream_rows(
        &self,
        table: &str,
        columns: &[Column],
        tx: mpsc::Sender<Vec<SqlValue>>,
    ) -> Result<u64>;
}

/// Connection manager for bb8 pool with tiberius.
#[derive(Clone)]
struct TiberiusConnectionManager {
    config: SourceConfig,
}

impl TiberiusConnectionManager {
    fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port);
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(&self.config.user, &self.config.password));

        match self.config.encrypt.to_lowercase().as_str() {
            "false" | "no" | "0" | "disable" => {
                config.encryption(EncryptionLevel::NotSupported);
            }
            _ => {
                if self.config.trust_server_cert {
                    config.trust_cert();
                }
                config.encryption(EncryptionLevel::Required);
            }
        }

        config
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let config = self.build_config();
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;

        tcp.set_nodelay(true).ok();

        Client::connect(config, tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Pooled SQL Server source with information-schema introspection.
pub struct MssqlSource {
    pool: Pool<TiberiusConnectionManager>,
}

impl MssqlSource {
    /// Connect and verify the source is reachable.
    pub async fn connect(config: SourceConfig) -> Result<Self> {
        let manager = TiberiusConnectionManager::new(config.clone());
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .await
            .map_err(|e| TransferError::Pool(format!("Failed to create source pool: {}", e)))?;

        {
            let mut conn = pool
                .get()
                .await
                .map_err(|e| TransferError::Pool(format!("Failed to get source connection: {}", e)))?;

            conn.simple_query("SELECT 1").await?.into_row().await?;
        }

        info!(
            "Connected to SQL Server: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool })
    }

    async fn get_client(&self) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| TransferError::Pool(format!("Failed to get source connection: {}", e)))
    }

    /// Query column metadata for one table, in natural column order.
    pub async fn describe_columns(&self, table: &str) -> Result<Vec<Column>> {
        let mut client = self.get_client().await?;

        let query = r#"
            SELECT
                COLUMN_NAME,
                DATA_TYPE,
                CAST(ISNULL(CHARACTER_MAXIMUM_LENGTH, 0) AS INT),
                CASE WHEN IS_NULLABLE = 'YES' THEN 1 ELSE 0 END
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_NAME = @P1
            ORDER BY ORDINAL_POSITION
        "#;

        let mut query = Query::new(query);
        query.bind(table);

        let stream = query.query(&mut client).await?;
        let rows = stream.into_first_result().await?;

        let columns: Vec<Column> = rows
            .iter()
            .map(|row| Column {
                name: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                data_type: row.get::<&str, _>(1).unwrap_or_default().to_string(),
                max_length: row.get::<i32, _>(2).unwrap_or(0),
                is_nullable: row.get::<i32, _>(3).unwrap_or(0) == 1,
            })
            .collect();

        if columns.is_empty() {
            return Err(TransferError::introspection(
                table,
                "no columns found (table missing or empty metadata)",
            ));
        }

        debug!("describe_columns({}) -> {} columns", table, columns.len());
        Ok(columns)
    }
}

#[async_trait]
impl SourcePool for MssqlSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut client = self.get_client().await?;

        let query = r#"
            SELECT TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let stream = client.simple_query(query).await?;
        let rows = stream.into_first_result().await?;

        let tables: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get::<&str, _>(0).map(String::from))
            .collect();

        debug!("list_tables found {} tables", tables.len());
        Ok(tables)
    }

    async fn describe_table(&self, table: &str) -> Result<TableDef> {
        let columns = self.describe_columns(table).await?;
        let primary_key = self.find_primary_key(table).await?;
        let foreign_keys = self.find_foreign_keys(table).await?;

        Ok(TableDef {
            name: table.to_string(),
            columns,
            primary_key,
            foreign_keys,
        })
    }

    async fn stream_rows(
        &self,
        table: &str,
        columns: &[Column],
        tx: mpsc::Sender<Vec<SqlValue>>,
    ) -> Result<u64> {
        let mut client = self.get_client().await?;

        let col_list = columns
            .iter()
            .map(|c| quote_mssql(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let sql = format!("SELECT {} FROM {}", col_list, quote_mssql(table)?);

        let mut stream = client.simple_query(sql).await?;

        let mut count = 0u64;
        while let Some(item) = stream.try_next().await? {
            let row = match item {
                QueryItem::Row(row) => row,
                QueryItem::Metadata(_) => continue,
            };

            let values: Vec<SqlValue> = columns
                .iter()
                .enumerate()
                .map(|(idx, col)| convert_row_value(&row, idx, &col.data_type))
                .collect();

            if tx.send(values).await.is_err() {
                warn!("row consumer for {} went away after {} rows", table, count);
                break;
            }
            count += 1;
        }

        debug!("stream_rows({}) sent {} rows", table, count);
        Ok(count)
    }
}

impl MssqlSource {
    /// Find the primary key for a table.
    ///
    /// Only the first key column is returned; composite keys are reduced to
    /// their first column with a warning. No key at all is `Ok(None)`, also
    /// warned, never an error.
    pub async fn find_primary_key(&self, table: &str) -> Result<Option<PrimaryKey>> {
        let mut client = self.get_client().await?;

        let query = r#"
            SELECT
                KCU.CONSTRAINT_NAME,
                KCU.COLUMN_NAME
            FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS AS TC
            INNER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS KCU
                ON KCU.CONSTRAINT_NAME = TC.CONSTRAINT_NAME
            WHERE TC.CONSTRAINT_TYPE = 'PRIMARY KEY'
              AND KCU.TABLE_NAME = @P1
            ORDER BY KCU.ORDINAL_POSITION
        "#;

        let mut query = Query::new(query);
        query.bind(table);

        let stream = query.query(&mut client).await?;
        let rows = stream.into_first_result().await?;

        if rows.is_empty() {
            warn!("no primary key found for table {}", table);
            return Ok(None);
        }

        if rows.len() > 1 {
            warn!(
                "table {} has a composite primary key ({} columns); only the first is used",
                table,
                rows.len()
            );
        }

        let pk = PrimaryKey {
            constraint_name: rows[0].get::<&str, _>(0).unwrap_or_default().to_string(),
            column: rows[0].get::<&str, _>(1).unwrap_or_default().to_string(),
        };

        debug!("find_primary_key({}) -> {}", table, pk.column);
        Ok(Some(pk))
    }

    /// Enumerate foreign key constraints whose local table matches.
    pub async fn find_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let mut client = self.get_client().await?;

        let query = r#"
            SELECT
                KCU1.CONSTRAINT_NAME,
                KCU1.COLUMN_NAME,
                KCU2.TABLE_NAME,
                KCU2.COLUMN_NAME
            FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS AS RC
            INNER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS KCU1
                ON KCU1.CONSTRAINT_CATALOG = RC.CONSTRAINT_CATALOG
                AND KCU1.CONSTRAINT_SCHEMA = RC.CONSTRAINT_SCHEMA
                AND KCU1.CONSTRAINT_NAME = RC.CONSTRAINT_NAME
            INNER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS KCU2
                ON KCU2.CONSTRAINT_CATALOG = RC.UNIQUE_CONSTRAINT_CATALOG
                AND KCU2.CONSTRAINT_SCHEMA = RC.UNIQUE_CONSTRAINT_SCHEMA
                AND KCU2.CONSTRAINT_NAME = RC.UNIQUE_CONSTRAINT_NAME
                AND KCU2.ORDINAL_POSITION = KCU1.ORDINAL_POSITION
            WHERE KCU1.TABLE_NAME = @P1
            ORDER BY KCU1.CONSTRAINT_NAME, KCU1.ORDINAL_POSITION
        "#;

        let mut query = Query::new(query);
        query.bind(table);

        let stream = query.query(&mut client).await?;
        let rows = stream.into_first_result().await?;

        let fks: Vec<ForeignKey> = rows
            .iter()
            .map(|row| ForeignKey {
                constraint_name: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                column: row.get::<&str, _>(1).unwrap_or_default().to_string(),
                ref_table: row.get::<&str, _>(2).unwrap_or_default().to_string(),
                ref_column: row.get::<&str, _>(3).unwrap_or_default().to_string(),
            })
            .collect();

        debug!("find_foreign_keys({}) -> {} constraints", table, fks.len());
        Ok(fks)
    }
}

/// Convert one cell to a SqlValue based on the column's declared type.
///
/// A NULL cell becomes `SqlValue::Null`; a cell whose driver representation
/// does not match the declared type, or whose type this model does not
/// cover, becomes `SqlValue::Unsupported` so the escaper can skip the row
/// explicitly instead of guessing.
fn convert_row_value(row: &Row, idx: usize, data_type: &str) -> SqlValue {
    let dt = data_type.to_lowercase();

    match dt.as_str() {
        "bit" => match row.try_get::<bool, _>(idx) {
            Ok(Some(v)) => SqlValue::Bool(v),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "tinyint" => match row.try_get::<u8, _>(idx) {
            Ok(Some(v)) => SqlValue::I16(v as i16),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "smallint" => match row.try_get::<i16, _>(idx) {
            Ok(Some(v)) => SqlValue::I16(v),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "int" | "integer" => match row.try_get::<i32, _>(idx) {
            Ok(Some(v)) => SqlValue::I32(v),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "bigint" => match row.try_get::<i64, _>(idx) {
            Ok(Some(v)) => SqlValue::I64(v),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "uniqueidentifier" => match row.try_get::<Uuid, _>(idx) {
            Ok(Some(v)) => SqlValue::Uuid(v),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "datetime" => match row.try_get::<NaiveDateTime, _>(idx) {
            Ok(Some(v)) => SqlValue::DateTime(v),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        "varchar" | "nvarchar" => match row.try_get::<&str, _>(idx) {
            Ok(Some(v)) => SqlValue::Text(v.to_string()),
            Ok(None) => SqlValue::Null,
            Err(_) => SqlValue::Unsupported(dt),
        },
        _ => SqlValue::Unsupported(dt),
    }
}
