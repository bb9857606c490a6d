//! Bulk insert facade.
//!
//! [`SqlServerBulkInsert`] ties a [`Mapping`] to any [`BulkConnection`]:
//! it reconciles the mapping against the destination once per target,
//! streams the entities through a [`SqlServerRecord`] cursor, and
//! normalises every failure to a [`BulkInsertError`].
//!
//! ```rust,no_run
//! use mssql_bulk_insert::{Config, Mapping, MssqlConnection, SqlServerBulkInsert};
//!
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! # async fn run() -> mssql_bulk_insert::Result<()> {
//! let config = Config::load("config.yaml")?;
//! let mut conn = MssqlConnection::connect(&config.connection).await?;
//!
//! let mapping = Mapping::<Person>::builder("sample", "unit_test")
//!     .map_nvarchar("FirstName", |p: &Person| p.first_name.clone())
//!     .map_nvarchar("LastName", |p: &Person| p.last_name.clone())
//!     .build()?;
//! let bulk = SqlServerBulkInsert::new(mapping);
//!
//! let people = vec![Person {
//!     first_name: "Philipp".into(),
//!     last_name: "Wagner".into(),
//! }];
//! let summary = bulk
//!     .save_all_with_options(&mut conn, &people, &config.bulk)
//!     .await?;
//! println!("{} rows written", summary.rows_written);
//! # Ok(())
//! # }
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::BulkCopyOptions;
use crate::core::{BulkConnection, RowCursor, TableIdentifier};
use crate::error::{BulkInsertError, Result};
use crate::mapping::Mapping;
use crate::reconcile::{reconcile_with_catalog, ColumnOrderSource, ReconciledColumns};
use crate::record::SqlServerRecord;

type ReconciledCell = Arc<OnceCell<Arc<ReconciledColumns>>>;

/// Outcome of one successful [`SqlServerBulkInsert::save_all`] call.
#[derive(Debug, Clone)]
pub struct BulkInsertSummary {
    /// Destination table.
    pub table: TableIdentifier,
    /// Rows accepted by the sink.
    pub rows_written: u64,
    /// Column order the rows were sent in.
    pub column_order: Arc<ReconciledColumns>,
    /// Wall-clock duration of the call.
    pub elapsed: Duration,
}

/// Saves entity sequences into the table described by a [`Mapping`].
///
/// Safe to share between tasks. The reconciled column order is computed at
/// most once per connection target; concurrent first calls for the same
/// target wait for a single catalog query.
pub struct SqlServerBulkInsert<E> {
    mapping: Arc<Mapping<E>>,
    /// One entry per distinct connection target, never evicted. Long-lived
    /// facades that see many targets grow this map without bound.
    reconciled: Mutex<HashMap<String, ReconciledCell>>,
}

impl<E> SqlServerBulkInsert<E> {
    pub fn new(mapping: Mapping<E>) -> Self {
        Self::from_shared(Arc::new(mapping))
    }

    /// Facade over a mapping shared with other facades.
    pub fn from_shared(mapping: Arc<Mapping<E>>) -> Self {
        Self {
            mapping,
            reconciled: Mutex::new(HashMap::new()),
        }
    }

    pub fn mapping(&self) -> &Mapping<E> {
        &self.mapping
    }

    fn cell_for(&self, target: &str) -> ReconciledCell {
        let mut cells = self
            .reconciled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(target.to_string()).or_default())
    }

    /// Column order for `conn`'s target, querying the catalog on first use.
    ///
    /// A schema mismatch is returned but not remembered, so a later call
    /// re-reads the catalog.
    pub async fn column_order<C>(&self, conn: &mut C) -> Result<Arc<ReconciledColumns>>
    where
        C: BulkConnection + ?Sized,
    {
        let cell = self.cell_for(conn.target());
        let mapping = &*self.mapping;
        let reader = &mut *conn;
        let reconciled = cell
            .get_or_try_init(move || async move {
                reconcile_with_catalog(mapping, reader).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(reconciled))
    }

    /// Save `entities` with default bulk-copy options.
    pub async fn save_all<C, I>(&self, conn: &mut C, entities: I) -> Result<BulkInsertSummary>
    where
        C: BulkConnection + ?Sized,
        I: IntoIterator,
        I::IntoIter: Send,
        I::Item: Borrow<E>,
    {
        self.save_all_with_options(conn, entities, &BulkCopyOptions::default())
            .await
    }

    /// Save `entities` into the mapped table.
    ///
    /// # Errors
    ///
    /// - `SchemaMismatch` when the catalog disagrees with the mapping; no row
    ///   is sent
    /// - `Conversion` when an entity fails to convert
    /// - `Validation` for unusable options
    /// - `BulkTransfer` for everything the sink or transport reports
    pub async fn save_all_with_options<C, I>(
        &self,
        conn: &mut C,
        entities: I,
        options: &BulkCopyOptions,
    ) -> Result<BulkInsertSummary>
    where
        C: BulkConnection + ?Sized,
        I: IntoIterator,
        I::IntoIter: Send,
        I::Item: Borrow<E>,
    {
        let started = Instant::now();
        let table = self.mapping.table();
        let entities = entities.into_iter();

        if options.batch_size == Some(0) {
            return Err(BulkInsertError::Validation(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let order = self.column_order(conn).await?;
        if let ColumnOrderSource::Declaration { reason } = order.source() {
            info!("{}: sending columns in declared order ({})", table, reason);
        }

        info!(
            "{}: starting bulk insert ({} columns, batch size {:?})",
            table,
            order.len(),
            options.batch_size
        );

        let mut cursor = SqlServerRecord::new(&self.mapping, &order, entities);
        let transfer = conn.write_all(table, &mut cursor, options);
        let result = if options.timeout_seconds > 0 {
            let limit = Duration::from_secs(options.timeout_seconds);
            match tokio::time::timeout(limit, transfer).await {
                Ok(result) => result,
                Err(elapsed) => Err(BulkInsertError::transfer_with_source(
                    table.full_name(),
                    format!("timed out after {}s", options.timeout_seconds),
                    elapsed,
                )),
            }
        } else {
            transfer.await
        };

        let rows_written = match result {
            Ok(rows) => rows,
            Err(e) => {
                let err = e.into_transfer_error(&table.full_name());
                warn!(
                    "{}: bulk insert failed after {} rows: {}",
                    table,
                    cursor.rows_read(),
                    err
                );
                return Err(err);
            }
        };

        let elapsed = started.elapsed();
        info!("{}: inserted {} rows in {:?}", table, rows_written, elapsed);

        Ok(BulkInsertSummary {
            table: table.clone(),
            rows_written,
            column_order: order,
            elapsed,
        })
    }
}
