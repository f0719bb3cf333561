//! Schema descriptors produced by introspection.

use serde::{Deserialize, Serialize};

/// Table metadata: ordered columns plus key constraints.
///
/// Constructed fresh per run by querying the source; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name.
    pub name: String,

    /// Column definitions, in the table's natural order.
    pub columns: Vec<Column>,

    /// Primary key, if the table has one. Composite keys are reduced to
    /// the first column (a documented limitation, warned at introspection).
    pub primary_key: Option<PrimaryKey>,

    /// Foreign key constraints whose local table is this one.
    pub foreign_keys: Vec<ForeignKey>,
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Source data type (e.g. "int", "nvarchar", "datetime").
    pub data_type: String,

    /// Maximum length for text types (-1 for unbounded).
    pub max_length: i32,

    /// Whether the column allows NULL.
    pub is_nullable: bool,
}

/// Primary key metadata. Only the first key column is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryKey {
    /// Constraint name.
    pub constraint_name: String,

    /// First key column name.
    pub column: String,
}

/// Foreign key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub constraint_name: String,

    /// Local column name.
    pub column: String,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column name.
    pub ref_column: String,
}
