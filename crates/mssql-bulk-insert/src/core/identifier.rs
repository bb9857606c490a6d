//! Identifier validation and SQL Server quoting.
//!
//! Table, schema and column names end up inside dynamic SQL (the catalog
//! query binds them as parameters, but `INSERT BULK` and the oversized-row
//! fallback `INSERT` need them quoted inline). Every name therefore passes
//! through [`validate_identifier`] when a mapping is declared and through
//! [`quote_mssql`] when SQL is built.

use crate::error::{BulkInsertError, Result};

/// Maximum identifier length in SQL Server (`sysname`).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier.
///
/// Rejects empty names, names containing null bytes and names longer than
/// 128 characters.
///
/// # Errors
///
/// Returns `BulkInsertError::Validation` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BulkInsertError::Validation(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(BulkInsertError::Validation(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(BulkInsertError::Validation(format!(
            "Identifier exceeds maximum length of {} characters (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH, length, name
        )));
    }

    Ok(())
}

/// Quote a SQL Server identifier using brackets.
///
/// Escapes closing brackets by doubling them and wraps in brackets.
///
/// ```
/// use mssql_bulk_insert::core::identifier::quote_mssql;
///
/// assert_eq!(quote_mssql("users").unwrap(), "[users]");
/// assert_eq!(quote_mssql("table]name").unwrap(), "[table]]name]");
/// ```
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// Qualify a table name with its schema. An empty schema yields the bare
/// quoted table name, which SQL Server resolves against the login's default
/// schema.
pub fn qualify_mssql(schema: &str, table: &str) -> Result<String> {
    if schema.is_empty() {
        return quote_mssql(table);
    }
    Ok(format!("{}.{}", quote_mssql(schema)?, quote_mssql(table)?))
}

/// Fold a column name for case-insensitive comparison.
///
/// ASCII-only folding: SQL Server's default collations compare ASCII
/// letters case-insensitively, and folding beyond ASCII would merge names a
/// case-sensitive collation keeps apart.
pub fn fold_column_name(name: &str) -> String {
    name.to_ascii_uppercase()
}
