//! DDL generation: CREATE TABLE, PRIMARY KEY, FOREIGN KEY statements.

use crate::error::Result;
use crate::source::{ForeignKey, PrimaryKey, TableDef};
use crate::sqlgen::ident::quote_pg_if_needed;
use crate::typemap::mssql_to_postgres;

/// Generate a `CREATE TABLE IF NOT EXISTS` statement for a table descriptor.
///
/// A column whose type has no PostgreSQL mapping aborts generation for the
/// whole table; the caller skips the table and reports the error. Emitting a
/// partial table here would let data transfer silently drop columns.
pub fn create_table(table: &TableDef) -> Result<String> {
    let mut ddl = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n",
        quote_pg_if_needed(&table.name)?
    );

    for (i, col) in table.columns.iter().enumerate() {
        let pg_type = mssql_to_postgres(&col.data_type, col.max_length)?;
        let nullable = if col.is_nullable { "" } else { " NOT NULL" };

        ddl.push_str(&format!(
            "    {} {}{}",
            quote_pg_if_needed(&col.name)?,
            pg_type,
            nullable
        ));

        if i < table.columns.len() - 1 {
            ddl.push_str(",\n");
        } else {
            ddl.push('\n');
        }
    }

    ddl.push_str(");");
    Ok(ddl)
}

/// Generate an `ALTER TABLE ... ADD CONSTRAINT ... PRIMARY KEY` statement.
///
/// Returns `None` when the table has no primary key.
pub fn primary_key(table: &str, pk: Option<&PrimaryKey>) -> Result<Option<String>> {
    let pk = match pk {
        Some(pk) => pk,
        None => return Ok(None),
    };

    let sql = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({});",
        quote_pg_if_needed(table)?,
        quote_pg_if_needed(&pk.constraint_name)?,
        quote_pg_if_needed(&pk.column)?
    );

    Ok(Some(sql))
}

/// Generate one `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY` statement
/// per descriptor.
pub fn foreign_keys(table: &str, fks: &[ForeignKey]) -> Result<Vec<String>> {
    fks.iter()
        .map(|fk| {
            Ok(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({});",
                quote_pg_if_needed(table)?,
                quote_pg_if_needed(&fk.constraint_name)?,
                quote_pg_if_needed(&fk.column)?,
                quote_pg_if_needed(&fk.ref_table)?,
                quote_pg_if_needed(&fk.ref_column)?
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Column;

    fn col(name: &str, data_type: &str, max_length: i32, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            max_length,
            is_nullable: nullable,
        }
    }

    #[test]
    fn create_table_quotes_reserved_column() {
        let table = TableDef {
            name: "T".to_string(),
            columns: vec![
                col("id", "int", 0, false),
                col("name", "nvarchar", 50, true),
                col("Order", "int", 0, true),
            ],
            primary_key: None,
            foreign_keys: vec![],
        };

        let ddl = create_table(&table).unwrap();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS T ("));
        assert!(ddl.contains("id INT NOT NULL"));
        assert!(ddl.contains("name VARCHAR(50)"));
        assert!(!ddl.contains("name VARCHAR(50) NOT NULL"));
        assert!(ddl.contains("\"Order\" INT"));
        assert!(ddl.ends_with(");"));
    }

    #[test]
    fn create_table_is_rerunnable() {
        // IF NOT EXISTS makes a second run a no-op instead of a
        // duplicate-table error.
        let table = TableDef {
            name: "StudyItems".to_string(),
            columns: vec![col("Id", "bigint", 0, false)],
            primary_key: None,
            foreign_keys: vec![],
        };
        let ddl = create_table(&table).unwrap();
        assert!(ddl.contains("IF NOT EXISTS"));
    }

    #[test]
    fn unmapped_type_aborts_table() {
        let table = TableDef {
            name: "Spatial".to_string(),
            columns: vec![col("Id", "int", 0, false), col("Shape", "geography", 0, true)],
            primary_key: None,
            foreign_keys: vec![],
        };

        let err = create_table(&table).unwrap_err();
        assert!(err.to_string().contains("geography"));
    }

    #[test]
    fn primary_key_statement() {
        let pk = PrimaryKey {
            constraint_name: "PK_StudyItems".to_string(),
            column: "Id".to_string(),
        };
        let sql = primary_key("StudyItems", Some(&pk)).unwrap().unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE StudyItems ADD CONSTRAINT PK_StudyItems PRIMARY KEY (Id);"
        );
    }

    #[test]
    fn no_primary_key_emits_nothing() {
        assert!(primary_key("StudyItems", None).unwrap().is_none());
    }

    #[test]
    fn one_statement_per_foreign_key() {
        let fks = vec![ForeignKey {
            constraint_name: "FK_Activities_StudyItems".to_string(),
            column: "StudyItemId".to_string(),
            ref_table: "StudyItems".to_string(),
            ref_column: "Id".to_string(),
        }];

        let stmts = foreign_keys("Activities", &fks).unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0],
            "ALTER TABLE Activities ADD CONSTRAINT FK_Activities_StudyItems \
             FOREIGN KEY (StudyItemId) REFERENCES StudyItems(Id);"
        );
    }

    #[test]
    fn no_foreign_keys_emits_nothing() {
        assert!(foreign_keys("Activities", &[]).unwrap().is_empty());
    }
}
