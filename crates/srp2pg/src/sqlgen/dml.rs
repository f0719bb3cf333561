//! DML generation: one INSERT statement per source row.

use crate::error::Result;
use crate::source::{Column, PrimaryKey};
use crate::sqlgen::escape::escape;
use crate::sqlgen::ident::quote_pg_if_needed;
use crate::value::SqlValue;
use tracing::warn;

/// Statements generated for a set of rows, plus how many rows were dropped
/// because a value could not be escaped.
#[derive(Debug, Default)]
pub struct InsertBatch {
    pub statements: Vec<String>,
    pub rows_skipped: u64,
}

/// Build one INSERT statement for a single row.
///
/// Column order in the statement matches `columns`, which must be the same
/// ordered list the row was read with; values are rendered positionally.
/// The `ON CONFLICT ... DO NOTHING` clause is only present when the table
/// has a primary key.
pub fn insert_statement(
    table: &str,
    columns: &[Column],
    row: &[SqlValue],
    pk: Option<&PrimaryKey>,
) -> Result<String> {
    let col_list = columns
        .iter()
        .map(|c| quote_pg_if_needed(&c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let values = row
        .iter()
        .map(escape)
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let conflict = match pk {
        Some(pk) => format!(" ON CONFLICT ({}) DO NOTHING", quote_pg_if_needed(&pk.column)?),
        None => String::new(),
    };

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({}){};",
        quote_pg_if_needed(table)?,
        col_list,
        values,
        conflict
    ))
}

/// Build INSERT statements for a set of rows.
///
/// A row that cannot be escaped is logged and skipped; it never aborts the
/// rest of the table.
pub fn insert_statements(
    table: &str,
    columns: &[Column],
    rows: &[Vec<SqlValue>],
    pk: Option<&PrimaryKey>,
) -> Result<InsertBatch> {
    let mut batch = InsertBatch::default();

    for (i, row) in rows.iter().enumerate() {
        match insert_statement(table, columns, row, pk) {
            Ok(sql) => batch.statements.push(sql),
            Err(e) => {
                warn!("skipping row {} of {}: {}", i, table, e);
                batch.rows_skipped += 1;
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols() -> Vec<Column> {
        vec![
            Column {
                name: "Id".to_string(),
                data_type: "int".to_string(),
                max_length: 0,
                is_nullable: false,
            },
            Column {
                name: "Title".to_string(),
                data_type: "nvarchar".to_string(),
                max_length: 50,
                is_nullable: true,
            },
        ]
    }

    fn pk() -> PrimaryKey {
        PrimaryKey {
            constraint_name: "PK_StudyItems".to_string(),
            column: "Id".to_string(),
        }
    }

    #[test]
    fn insert_with_conflict_clause() {
        let row = vec![SqlValue::I32(1), SqlValue::from("Book 1")];
        let sql = insert_statement("StudyItems", &cols(), &row, Some(&pk())).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO StudyItems (Id, Title) VALUES (1, 'Book 1') \
             ON CONFLICT (Id) DO NOTHING;"
        );
    }

    #[test]
    fn no_primary_key_omits_conflict_clause() {
        let row = vec![SqlValue::I32(1), SqlValue::Null];
        let sql = insert_statement("StudyItems", &cols(), &row, None).unwrap();
        assert_eq!(sql, "INSERT INTO StudyItems (Id, Title) VALUES (1, NULL);");
        assert!(!sql.contains("ON CONFLICT"));
    }

    #[test]
    fn quotes_in_values_are_doubled() {
        let row = vec![SqlValue::I32(2), SqlValue::from("Ruhi's Book")];
        let sql = insert_statement("StudyItems", &cols(), &row, Some(&pk())).unwrap();
        assert!(sql.contains("'Ruhi''s Book'"));
    }

    #[test]
    fn bad_row_is_skipped_not_fatal() {
        let rows = vec![
            vec![SqlValue::I32(1), SqlValue::from("a")],
            vec![SqlValue::I32(2), SqlValue::Unsupported("geography".into())],
            vec![SqlValue::I32(3), SqlValue::from("c")],
        ];

        let batch = insert_statements("StudyItems", &cols(), &rows, Some(&pk())).unwrap();
        assert_eq!(batch.statements.len(), 2);
        assert_eq!(batch.rows_skipped, 1);
        assert!(batch.statements[0].contains("VALUES (1, 'a')"));
        assert!(batch.statements[1].contains("VALUES (3, 'c')"));
    }

    #[test]
    fn reserved_column_names_are_quoted() {
        let columns = vec![Column {
            name: "Order".to_string(),
            data_type: "int".to_string(),
            max_length: 0,
            is_nullable: true,
        }];
        let row = vec![SqlValue::I32(5)];
        let sql = insert_statement("Lists", &columns, &row, None).unwrap();
        assert_eq!(sql, "INSERT INTO Lists (\"Order\") VALUES (5);");
    }
}
