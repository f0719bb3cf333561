//! Error types for the transfer library.

use thiserror::Error;

/// Main error type for transfer operations.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// Target database connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Schema introspection failed or returned unusable metadata
    #[error("Introspection failed for table {table}: {message}")]
    Introspection { table: String, message: String },

    /// Source type has no PostgreSQL equivalent
    #[error("No PostgreSQL mapping for source type '{data_type}'")]
    TypeMapping { data_type: String },

    /// A value of a type the escaper does not cover
    #[error("Cannot escape value of unsupported type '{type_name}'")]
    UnsupportedValue { type_name: String },

    /// Target rejected a generated statement
    #[error("Execution failed for table {table}: {message}")]
    Execution { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TransferError {
    /// Create an Introspection error.
    pub fn introspection(table: impl Into<String>, message: impl Into<String>) -> Self {
        TransferError::Introspection {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an Execution error.
    pub fn execution(table: impl Into<String>, message: impl Into<String>) -> Self {
        TransferError::Execution {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Whether this error is fatal for the whole run (connectivity class).
    /// Per-table and per-row errors are isolated and keep the batch going.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransferError::Config(_)
                | TransferError::Pool(_)
                | TransferError::Io(_)
                | TransferError::Yaml(_)
        )
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            TransferError::Config(_) | TransferError::Yaml(_) => 2,
            TransferError::Source(_) | TransferError::Target(_) | TransferError::Pool(_) => 3,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
