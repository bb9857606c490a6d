//! Core traits for converting, streaming and loading rows.
//!
//! - [`Converter`]: turns one typed property value into a [`SqlValue`]
//! - [`RowCursor`]: pull-based, forward-only row source consumed by a sink
//! - [`CatalogReader`]: reads column ordinals from the destination catalog
//! - [`BulkConnection`]: the bulk-load sink plus statement execution
//!
//! The database-facing traits are implemented by `drivers::mssql` for a live
//! SQL Server and by in-memory doubles in tests.

use async_trait::async_trait;

use crate::config::BulkCopyOptions;
use crate::error::{ConvertError, Result};

use super::schema::{CatalogColumn, ColumnMetadata, TableIdentifier};
use super::value::{SqlNullType, SqlValue};

/// Transform from a property value to a wire value.
///
/// Implementors provide [`convert_value`](Converter::convert_value) for the
/// non-null case only. [`convert`](Converter::convert) handles NULL before
/// any type-specific logic runs, and should not be overridden.
pub trait Converter<P>: Send + Sync {
    /// Type hint for NULLs produced by this converter.
    fn null_type(&self) -> SqlNullType;

    /// Convert a present value.
    fn convert_value(&self, value: P) -> std::result::Result<SqlValue<'static>, ConvertError>;

    /// Convert an optional value, passing NULL through untouched.
    fn convert(&self, value: Option<P>) -> std::result::Result<SqlValue<'static>, ConvertError> {
        match value {
            Some(v) => self.convert_value(v),
            None => Ok(SqlValue::Null(self.null_type())),
        }
    }
}

/// Forward-only row source handed to a bulk-load sink.
///
/// Column indices are 0-based. A cursor is single-use: once
/// [`advance`](RowCursor::advance) has returned `Ok(false)` it keeps returning
/// `Ok(false)`.
pub trait RowCursor: Send {
    /// Number of columns in every row.
    fn column_count(&self) -> usize;

    /// Metadata of the column at `index`.
    fn column(&self, index: usize) -> Option<&ColumnMetadata>;

    /// Move to the next row. Returns `Ok(false)` when exhausted.
    ///
    /// # Errors
    ///
    /// `BulkInsertError::Conversion` when a value of the next row fails its
    /// converter. The cursor is exhausted afterwards.
    fn advance(&mut self) -> Result<bool>;

    /// Values of the row produced by the last successful `advance`.
    fn current_row(&self) -> Option<&[SqlValue<'static>]>;

    /// Number of rows produced so far.
    fn rows_read(&self) -> u64;

    fn column_name(&self, index: usize) -> Option<&str> {
        self.column(index).map(ColumnMetadata::name)
    }

    fn precision(&self, index: usize) -> Option<u32> {
        self.column(index).map(ColumnMetadata::precision)
    }

    fn scale(&self, index: usize) -> Option<u32> {
        self.column(index).map(ColumnMetadata::scale)
    }

    fn is_auto_increment(&self, index: usize) -> bool {
        self.column(index)
            .map(ColumnMetadata::is_auto_increment)
            .unwrap_or(false)
    }
}

/// Read access to the destination's catalog metadata.
#[async_trait]
pub trait CatalogReader: Send {
    /// Non-computed columns of `table` with their ordinal positions, ordered
    /// ascending by ordinal. An empty vector means the table is not visible.
    async fn catalog_columns(&mut self, table: &TableIdentifier) -> Result<Vec<CatalogColumn>>;
}

/// A connection able to run statements and accept bulk loads.
#[async_trait]
pub trait BulkConnection: CatalogReader {
    /// Identity of the destination database (server and database name).
    ///
    /// Reconciled column orders are memoised per target, so two connections
    /// to the same database must report the same value.
    fn target(&self) -> &str;

    /// Execute a statement and return the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Stream every row of `rows` into `table`. Returns the number of rows
    /// written.
    async fn write_all(
        &mut self,
        table: &TableIdentifier,
        rows: &mut dyn RowCursor,
        options: &BulkCopyOptions,
    ) -> Result<u64>;
}
