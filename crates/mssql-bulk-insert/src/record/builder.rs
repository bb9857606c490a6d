//! One row from one entity.

use crate::core::Row;
use crate::error::{BulkInsertError, Result};
use crate::mapping::{ColumnDefinition, Mapping};
use crate::reconcile::ReconciledColumns;

/// Builds rows by running every column's accessor and converter in a fixed
/// column order.
pub struct RowBuilder<'m, E> {
    columns: Vec<&'m ColumnDefinition<E>>,
}

impl<'m, E> RowBuilder<'m, E> {
    /// Rows in declaration order.
    pub fn new(mapping: &'m Mapping<E>) -> Self {
        Self {
            columns: mapping.columns().iter().collect(),
        }
    }

    /// Rows in reconciled order.
    pub fn reconciled(mapping: &'m Mapping<E>, reconciled: &ReconciledColumns) -> Self {
        Self {
            columns: reconciled
                .order()
                .iter()
                .map(|&index| &mapping.columns()[index])
                .collect(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Convert `entity` into a row. `row_number` (1-based) only labels errors.
    ///
    /// # Errors
    ///
    /// `BulkInsertError::Conversion` for the first column whose converter
    /// fails. No partial row is returned.
    pub fn build(&self, entity: &E, row_number: u64) -> Result<Row> {
        self.columns
            .iter()
            .map(|column| {
                column
                    .value(entity)
                    .map_err(|source| BulkInsertError::Conversion {
                        column: column.name().to_string(),
                        row: row_number,
                        source,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CatalogColumn, SqlValue};
    use crate::error::ConvertError;
    use crate::reconcile::reconcile;
    use num_bigint::BigInt;

    struct Measurement {
        label: String,
        value: BigInt,
    }

    fn mapping() -> Mapping<Measurement> {
        Mapping::builder("dbo", "Measurement")
            .map_big_integer("Value", |m: &Measurement| Some(m.value.clone()))
            .map_nvarchar("Label", |m: &Measurement| m.label.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_row_has_one_value_per_column() {
        let mapping = mapping();
        let builder = RowBuilder::new(&mapping);
        let row = builder
            .build(
                &Measurement {
                    label: "a".into(),
                    value: BigInt::from(3),
                },
                1,
            )
            .unwrap();
        assert_eq!(row.len(), mapping.column_count());
        assert_eq!(row[0], SqlValue::I64(3));
    }

    #[test]
    fn test_reconciled_order() {
        let mapping = mapping();
        let reconciled = reconcile(
            &mapping,
            Ok(vec![
                CatalogColumn::new("Label", 1),
                CatalogColumn::new("Value", 2),
            ]),
        )
        .unwrap();
        let row = RowBuilder::reconciled(&mapping, &reconciled)
            .build(
                &Measurement {
                    label: "a".into(),
                    value: BigInt::from(3),
                },
                1,
            )
            .unwrap();
        assert_eq!(row, vec![SqlValue::text_owned("a".into()), SqlValue::I64(3)]);
    }

    #[test]
    fn test_conversion_failure_names_column_and_row() {
        let mapping = mapping();
        let entity = Measurement {
            label: "overflow".into(),
            value: BigInt::from(i64::MAX) + BigInt::from(1),
        };
        match RowBuilder::new(&mapping).build(&entity, 7) {
            Err(BulkInsertError::Conversion {
                column,
                row,
                source,
            }) => {
                assert_eq!(column, "Value");
                assert_eq!(row, 7);
                assert!(matches!(source, ConvertError::Overflow { .. }));
            }
            other => panic!("expected conversion error, got {other:?}"),
        }
    }
}
