//! Aligning declared columns with the table's physical column order.
//!
//! `INSERT BULK` binds row values by position, so a mapping declared out of
//! physical order would shift every value into the wrong column. The
//! reconciler reads the table's ordinals from the catalog and permutes the
//! declared columns to match, comparing names case-insensitively.
//!
//! When the catalog cannot be read (missing permission, table not visible)
//! the declared order is used unchanged and the reason is kept on the
//! result. A readable catalog that disagrees with the mapping is an error.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::identifier::fold_column_name;
use crate::core::{CatalogColumn, CatalogReader, ColumnMetadata};
use crate::error::{BulkInsertError, Result};
use crate::mapping::Mapping;

/// Where a reconciled column order came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOrderSource {
    /// Permuted to the catalog's ordinal order.
    Catalog,
    /// Declaration order kept because the catalog was unavailable.
    Declaration { reason: String },
}

/// Column order to use for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledColumns {
    /// `order[i]` is the declaration index of the column at position `i`.
    order: Vec<usize>,
    /// Positions the catalog reports as identity columns.
    server_generated: Vec<bool>,
    source: ColumnOrderSource,
}

impl ReconciledColumns {
    /// Declaration order, used when the catalog gives no answer.
    pub fn declaration(column_count: usize, reason: impl Into<String>) -> Self {
        Self {
            order: (0..column_count).collect(),
            server_generated: vec![false; column_count],
            source: ColumnOrderSource::Declaration {
                reason: reason.into(),
            },
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn source(&self) -> &ColumnOrderSource {
        &self.source
    }

    pub fn is_from_catalog(&self) -> bool {
        self.source == ColumnOrderSource::Catalog
    }

    /// Whether the catalog reports the column at `position` as an identity.
    pub fn is_server_generated(&self, position: usize) -> bool {
        self.server_generated.get(position).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Metadata of every column in reconciled order. Catalog identity
    /// columns are reported as auto-increment even when the mapping did not
    /// declare them so.
    pub fn metadata<E>(&self, mapping: &Mapping<E>) -> Vec<ColumnMetadata> {
        self.order
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let metadata = mapping.columns()[index].metadata();
                if self.is_server_generated(position) && !metadata.is_auto_increment() {
                    metadata.as_server_generated()
                } else {
                    metadata.clone()
                }
            })
            .collect()
    }

    /// Column names in reconciled order.
    pub fn column_names<'m, E>(&self, mapping: &'m Mapping<E>) -> Vec<&'m str> {
        self.order
            .iter()
            .map(|&index| mapping.columns()[index].name())
            .collect()
    }
}

/// Reconcile `mapping` against the outcome of a catalog query.
///
/// # Errors
///
/// `BulkInsertError::SchemaMismatch` when the catalog lists a different
/// number of columns, a column the mapping lacks, or two columns that match
/// the same mapped name. A failed or empty catalog query is not an error.
pub fn reconcile<E>(
    mapping: &Mapping<E>,
    catalog: Result<Vec<CatalogColumn>>,
) -> Result<ReconciledColumns> {
    let table = mapping.table();
    let declared = mapping.column_count();

    let mut catalog = match catalog {
        Ok(columns) if columns.is_empty() => {
            let reason = format!("table {} not found in catalog", table);
            warn!("Using declared column order for {}: {}", table, reason);
            return Ok(ReconciledColumns::declaration(declared, reason));
        }
        Ok(columns) => columns,
        Err(e) => {
            warn!(
                "Could not read column ordinals for {}, using declared column order: {}",
                table, e
            );
            return Ok(ReconciledColumns::declaration(declared, e.to_string()));
        }
    };

    if catalog.len() != declared {
        let difference = catalog.len() as i64 - declared as i64;
        return Err(BulkInsertError::schema_mismatch(
            table.full_name(),
            format!(
                "mapping declares {} columns but the table has {} (difference {:+})",
                declared,
                catalog.len(),
                difference
            ),
        ));
    }

    catalog.sort_by_key(|c| c.ordinal);

    let by_name: HashMap<String, usize> = mapping
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| (fold_column_name(column.name()), index))
        .collect();

    let mut used = vec![false; declared];
    let mut order = Vec::with_capacity(declared);
    let mut server_generated = Vec::with_capacity(declared);

    for column in &catalog {
        let index = *by_name.get(&fold_column_name(&column.name)).ok_or_else(|| {
            BulkInsertError::schema_mismatch(
                table.full_name(),
                format!("column {} is not mapped", column.name),
            )
        })?;
        if std::mem::replace(&mut used[index], true) {
            return Err(BulkInsertError::schema_mismatch(
                table.full_name(),
                format!(
                    "column {} matches mapped column {} more than once",
                    column.name,
                    mapping.columns()[index].name()
                ),
            ));
        }
        order.push(index);
        server_generated.push(column.is_identity);
    }

    let reconciled = ReconciledColumns {
        order,
        server_generated,
        source: ColumnOrderSource::Catalog,
    };
    debug!(
        "Reconciled column order for {}: {:?}",
        table,
        reconciled.column_names(mapping)
    );
    Ok(reconciled)
}

/// Query the catalog through `reader` and reconcile `mapping` against it.
pub async fn reconcile_with_catalog<E, R>(
    mapping: &Mapping<E>,
    reader: &mut R,
) -> Result<ReconciledColumns>
where
    R: CatalogReader + ?Sized,
{
    let catalog = reader.catalog_columns(mapping.table()).await;
    reconcile(mapping, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Person {
        first_name: String,
        last_name: String,
        birth_date: NaiveDate,
    }

    fn declared_out_of_order() -> Mapping<Person> {
        Mapping::builder("sample", "unit_test")
            .map_nvarchar("FirstName", |p: &Person| p.first_name.clone())
            .map_date("BirthDate", |p: &Person| p.birth_date)
            .map_nvarchar("LastName", |p: &Person| p.last_name.clone())
            .build()
            .unwrap()
    }

    fn physical_catalog() -> Vec<CatalogColumn> {
        vec![
            CatalogColumn::new("FirstName", 1),
            CatalogColumn::new("LastName", 2),
            CatalogColumn::new("BirthDate", 3),
        ]
    }

    #[test]
    fn test_permutes_to_catalog_order() {
        let mapping = declared_out_of_order();
        let reconciled = reconcile(&mapping, Ok(physical_catalog())).unwrap();

        assert!(reconciled.is_from_catalog());
        assert_eq!(reconciled.order(), &[0, 2, 1]);
        assert_eq!(
            reconciled.column_names(&mapping),
            vec!["FirstName", "LastName", "BirthDate"]
        );
    }

    #[test]
    fn test_catalog_ordinals_need_not_be_sorted() {
        let mapping = declared_out_of_order();
        let mut catalog = physical_catalog();
        catalog.reverse();
        let reconciled = reconcile(&mapping, Ok(catalog)).unwrap();
        assert_eq!(reconciled.order(), &[0, 2, 1]);
    }

    #[test]
    fn test_name_matching_ignores_case() {
        let mapping = declared_out_of_order();
        let catalog = vec![
            CatalogColumn::new("FIRSTNAME", 1),
            CatalogColumn::new("lastname", 2),
            CatalogColumn::new("birthDate", 3),
        ];
        let reconciled = reconcile(&mapping, Ok(catalog)).unwrap();
        assert_eq!(reconciled.order(), &[0, 2, 1]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mapping = declared_out_of_order();
        let first = reconcile(&mapping, Ok(physical_catalog())).unwrap();
        let second = reconcile(&mapping, Ok(physical_catalog())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_catalog_query_keeps_declaration_order() {
        let mapping = declared_out_of_order();
        let failure = Err(BulkInsertError::catalog(
            "sample.unit_test",
            "The SELECT permission was denied",
        ));
        let reconciled = reconcile(&mapping, failure).unwrap();

        assert_eq!(reconciled.order(), &[0, 1, 2]);
        match reconciled.source() {
            ColumnOrderSource::Declaration { reason } => {
                assert!(reason.contains("permission was denied"))
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_empty_catalog_keeps_declaration_order() {
        let mapping = declared_out_of_order();
        let reconciled = reconcile(&mapping, Ok(Vec::new())).unwrap();
        assert!(!reconciled.is_from_catalog());
        assert_eq!(reconciled.order(), &[0, 1, 2]);
    }

    #[test]
    fn test_column_count_mismatch() {
        let mapping = declared_out_of_order();
        let mut catalog = physical_catalog();
        catalog.push(CatalogColumn::new("Nickname", 4));

        let err = reconcile(&mapping, Ok(catalog)).unwrap_err();
        match err {
            BulkInsertError::SchemaMismatch { table, message } => {
                assert_eq!(table, "sample.unit_test");
                assert!(message.contains("declares 3 columns"));
                assert!(message.contains("has 4"));
                assert!(message.contains("+1"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unmapped_catalog_column() {
        let mapping = declared_out_of_order();
        let catalog = vec![
            CatalogColumn::new("FirstName", 1),
            CatalogColumn::new("Surname", 2),
            CatalogColumn::new("BirthDate", 3),
        ];
        let err = reconcile(&mapping, Ok(catalog)).unwrap_err();
        assert!(err.to_string().contains("Surname is not mapped"));
    }

    #[test]
    fn test_catalog_column_matching_twice() {
        let mapping = declared_out_of_order();
        let catalog = vec![
            CatalogColumn::new("FirstName", 1),
            CatalogColumn::new("FIRSTNAME", 2),
            CatalogColumn::new("BirthDate", 3),
        ];
        let err = reconcile(&mapping, Ok(catalog)).unwrap_err();
        assert!(matches!(err, BulkInsertError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_catalog_identity_marks_metadata() {
        struct Row {
            value: i32,
        }
        let mapping = Mapping::<Row>::builder("sample", "unit_test")
            .map_integer("PK_ID", |_: &Row| None::<i32>)
            .map_integer("Value", |r: &Row| r.value)
            .build()
            .unwrap();
        let catalog = vec![
            CatalogColumn::identity("PK_ID", 1),
            CatalogColumn::new("Value", 2),
        ];

        let reconciled = reconcile(&mapping, Ok(catalog)).unwrap();
        let metadata = reconciled.metadata(&mapping);
        assert!(metadata[0].is_auto_increment());
        assert!(!metadata[1].is_auto_increment());
    }
}
