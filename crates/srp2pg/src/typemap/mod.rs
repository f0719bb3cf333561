//! Type mapping between SQL Server and PostgreSQL.
//!
//! The mapping table is deliberately small: it covers exactly the types the
//! SRP database uses. An unknown type is an explicit error so DDL generation
//! can abort the table instead of emitting invalid SQL.

use crate::error::{Result, TransferError};

/// Sentinel used by `INFORMATION_SCHEMA.COLUMNS` for unbounded text types.
pub const UNBOUNDED: i32 = -1;

/// Map an SQL Server data type to its PostgreSQL equivalent.
///
/// `max_length` is only consulted for variable-length text types, where
/// [`UNBOUNDED`] selects `TEXT` over a parameterized `VARCHAR`.
pub fn mssql_to_postgres(data_type: &str, max_length: i32) -> Result<String> {
    let mapped = match data_type.to_lowercase().as_str() {
        "bigint" => "BIGINT".to_string(),
        "int" | "integer" => "INT".to_string(),
        "smallint" | "tinyint" => "SMALLINT".to_string(),
        "bit" => "BOOLEAN".to_string(),
        "uniqueidentifier" => "UUID".to_string(),
        "datetime" => "TIMESTAMP(3)".to_string(),
        "varchar" | "nvarchar" => {
            if max_length == UNBOUNDED {
                "TEXT".to_string()
            } else {
                format!("VARCHAR({})", max_length)
            }
        }
        _ => {
            return Err(TransferError::TypeMapping {
                data_type: data_type.to_string(),
            })
        }
    };

    Ok(mapped)
}
