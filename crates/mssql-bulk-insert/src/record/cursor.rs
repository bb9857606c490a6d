//! Streaming row cursor over an entity iterator.

use std::borrow::Borrow;
use std::marker::PhantomData;

use crate::core::{ColumnMetadata, Row, RowCursor, SqlValue};
use crate::error::Result;
use crate::mapping::Mapping;
use crate::reconcile::ReconciledColumns;

use super::builder::RowBuilder;

/// Forward-only [`RowCursor`] that converts one entity per `advance`.
///
/// Only the current row is held in memory. After the iterator is exhausted
/// or a row fails to convert, the cursor stays exhausted.
pub struct SqlServerRecord<'m, E, I> {
    builder: RowBuilder<'m, E>,
    metadata: Vec<ColumnMetadata>,
    entities: I,
    current: Option<Row>,
    rows_read: u64,
    finished: bool,
    _entity: PhantomData<fn(&E)>,
}

impl<'m, E, I> SqlServerRecord<'m, E, I> {
    /// Cursor producing columns in reconciled order.
    pub fn new(mapping: &'m Mapping<E>, reconciled: &ReconciledColumns, entities: I) -> Self {
        Self {
            builder: RowBuilder::reconciled(mapping, reconciled),
            metadata: reconciled.metadata(mapping),
            entities,
            current: None,
            rows_read: 0,
            finished: false,
            _entity: PhantomData,
        }
    }
}

impl<'m, E, I> RowCursor for SqlServerRecord<'m, E, I>
where
    I: Iterator + Send,
    I::Item: Borrow<E>,
{
    fn column_count(&self) -> usize {
        self.builder.column_count()
    }

    fn column(&self, index: usize) -> Option<&ColumnMetadata> {
        self.metadata.get(index)
    }

    fn advance(&mut self) -> Result<bool> {
        self.current = None;
        if self.finished {
            return Ok(false);
        }

        let Some(entity) = self.entities.next() else {
            self.finished = true;
            return Ok(false);
        };

        match self.builder.build(entity.borrow(), self.rows_read + 1) {
            Ok(row) => {
                self.rows_read += 1;
                self.current = Some(row);
                Ok(true)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn current_row(&self) -> Option<&[SqlValue<'static>]> {
        self.current.as_deref()
    }

    fn rows_read(&self) -> u64 {
        self.rows_read
    }
}
