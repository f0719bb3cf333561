//! Identifier validation and quoting.
//!
//! Identifiers cannot be passed as parameters in prepared statements, so
//! every table or column name interpolated into generated SQL goes through
//! validation plus dialect quoting here. Names come from introspection of
//! the source catalog, which is the allow-list; validation is a backstop.

use crate::error::{Result, TransferError};

/// Maximum identifier length (SQL Server limit; PostgreSQL truncates at 63).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// PostgreSQL reserved words that must be quoted when used as column or
/// table names. Covers the words that actually occur in source schemas
/// (the SRP database has a column literally named "Order") plus the common
/// collision set.
const PG_RESERVED: &[&str] = &[
    "all", "and", "any", "array", "as", "asc", "both", "case", "cast", "check", "collate",
    "column", "constraint", "create", "current_date", "current_time", "current_timestamp",
    "default", "desc", "distinct", "do", "else", "end", "except", "false", "for", "foreign",
    "from", "grant", "group", "having", "in", "initially", "intersect", "into", "leading",
    "limit", "localtime", "localtimestamp", "not", "null", "offset", "on", "only", "or",
    "order", "placing", "primary", "references", "returning", "select", "some", "symmetric",
    "table", "then", "to", "trailing", "true", "union", "unique", "user", "using", "when",
    "where", "window", "with",
];

/// Validate an identifier before it is interpolated into SQL.
///
/// Rejects empty names, names containing null bytes, and names exceeding
/// the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TransferError::Config("identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(TransferError::Config(format!(
            "identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(TransferError::Config(format!(
            "identifier exceeds {} bytes: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier unconditionally.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a PostgreSQL identifier only when it needs it: reserved words and
/// names that are not plain identifiers. Leaves ordinary names bare so the
/// generated DDL stays readable.
pub fn quote_pg_if_needed(name: &str) -> Result<String> {
    validate_identifier(name)?;

    let reserved = PG_RESERVED.contains(&name.to_lowercase().as_str());
    let plain = !name.is_empty()
        && !name.chars().next().unwrap().is_ascii_digit()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if reserved || !plain {
        quote_pg(name)
    } else {
        Ok(name.to_string())
    }
}

/// Quote a SQL Server identifier using brackets.
///
/// Escapes closing brackets by doubling them and wraps in brackets.
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_and_null_byte() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("table\0name").is_err());
        assert!(validate_identifier("users").is_ok());
    }

    #[test]
    fn validate_rejects_too_long() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long).is_err());
        let max = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(validate_identifier(&max).is_ok());
    }

    #[test]
    fn quote_pg_escapes_double_quote() {
        assert_eq!(quote_pg("users").unwrap(), "\"users\"");
        assert_eq!(quote_pg("a\"b").unwrap(), "\"a\"\"b\"");
    }

    #[test]
    fn reserved_words_are_quoted() {
        assert_eq!(quote_pg_if_needed("Order").unwrap(), "\"Order\"");
        assert_eq!(quote_pg_if_needed("user").unwrap(), "\"user\"");
        assert_eq!(quote_pg_if_needed("GROUP").unwrap(), "\"GROUP\"");
    }

    #[test]
    fn plain_names_stay_bare() {
        assert_eq!(quote_pg_if_needed("StudyItems").unwrap(), "StudyItems");
        assert_eq!(quote_pg_if_needed("name").unwrap(), "name");
        assert_eq!(quote_pg_if_needed("Id").unwrap(), "Id");
    }

    #[test]
    fn odd_names_are_quoted() {
        assert_eq!(quote_pg_if_needed("with space").unwrap(), "\"with space\"");
        assert_eq!(quote_pg_if_needed("1starts_digit").unwrap(), "\"1starts_digit\"");
        assert_eq!(
            quote_pg_if_needed("semi;colon").unwrap(),
            "\"semi;colon\""
        );
    }

    #[test]
    fn quote_mssql_escapes_bracket() {
        assert_eq!(quote_mssql("users").unwrap(), "[users]");
        assert_eq!(quote_mssql("a]b").unwrap(), "[a]]b]");
    }

    #[test]
    fn injection_attempts_end_up_inert() {
        let quoted = quote_pg_if_needed("Robert\"); DROP TABLE Students;--").unwrap();
        assert_eq!(quoted, "\"Robert\"\"); DROP TABLE Students;--\"");
    }
}
