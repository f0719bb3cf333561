//! Configuration validation.

use super::Config;
use crate::error::{Result, TransferError};

/// Validate a loaded configuration before any connection is attempted.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.host.is_empty() {
        return Err(TransferError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(TransferError::Config("source.database is required".into()));
    }
    if config.source.port == 0 {
        return Err(TransferError::Config("source.port must be non-zero".into()));
    }

    if config.target.host.is_empty() {
        return Err(TransferError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(TransferError::Config("target.database is required".into()));
    }
    if config.target.port == 0 {
        return Err(TransferError::Config("target.port must be non-zero".into()));
    }

    for table in &config.transfer.tables {
        crate::sqlgen::ident::validate_identifier(table)?;
    }

    Ok(())
}
