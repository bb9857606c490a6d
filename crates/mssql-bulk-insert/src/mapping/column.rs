//! Column definitions and the immutable mapping.

use std::fmt;

use crate::core::{ColumnMetadata, Converter, SqlValue, TableIdentifier};
use crate::error::ConvertError;

use super::builder::MappingBuilder;

type ValueFn<E> = Box<dyn Fn(&E) -> Result<SqlValue<'static>, ConvertError> + Send + Sync>;

/// One destination column: its metadata plus how to read and convert the
/// matching entity property.
pub struct ColumnDefinition<E> {
    metadata: ColumnMetadata,
    value: ValueFn<E>,
}

impl<E: 'static> ColumnDefinition<E> {
    /// Pair an accessor with a converter.
    ///
    /// The accessor may return either `P` or `Option<P>`.
    pub fn new<P, V, F, C>(metadata: ColumnMetadata, accessor: F, converter: C) -> Self
    where
        P: 'static,
        V: Into<Option<P>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
        C: Converter<P> + 'static,
    {
        Self {
            metadata,
            value: Box::new(move |entity: &E| converter.convert(accessor(entity).into())),
        }
    }

    /// Column whose value is produced by the server. Always NULL on the
    /// client side.
    pub fn server_generated(metadata: ColumnMetadata) -> Self {
        let null_type = metadata.sql_type().null_type();
        Self {
            metadata: metadata.as_server_generated(),
            value: Box::new(move |_: &E| Ok(SqlValue::Null(null_type))),
        }
    }
}

impl<E> ColumnDefinition<E> {
    pub fn metadata(&self) -> &ColumnMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    /// Read and convert this column's value from `entity`.
    pub fn value(&self, entity: &E) -> Result<SqlValue<'static>, ConvertError> {
        (self.value)(entity)
    }
}

impl<E> fmt::Debug for ColumnDefinition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Destination table plus its columns in declaration order.
///
/// Declaration order is not necessarily the table's physical order; the
/// reconciler maps one onto the other. Built once through
/// [`Mapping::builder`] and read-only afterwards.
pub struct Mapping<E> {
    table: TableIdentifier,
    columns: Vec<ColumnDefinition<E>>,
}

impl<E> Mapping<E> {
    /// Start declaring a mapping for `schema.table`.
    pub fn builder(schema: impl Into<String>, table: impl Into<String>) -> MappingBuilder<E> {
        MappingBuilder::new(TableIdentifier::new(schema, table))
    }

    pub(crate) fn from_parts(table: TableIdentifier, columns: Vec<ColumnDefinition<E>>) -> Self {
        Self { table, columns }
    }

    pub fn table(&self) -> &TableIdentifier {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDefinition<E>] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl<E> fmt::Debug for Mapping<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .finish()
    }
}
