//! In-memory bulk-load sink shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mssql_bulk_insert::{
    BulkConnection, BulkCopyOptions, BulkInsertError, CatalogColumn, CatalogReader, Result,
    RowCursor, SqlValue, TableIdentifier,
};

/// Sink that stores rows the way the server would: auto-increment columns
/// receive the next identity value instead of the supplied one.
pub struct MemoryConnection {
    target: String,
    catalog: std::result::Result<Vec<CatalogColumn>, String>,
    catalog_queries: Arc<AtomicUsize>,
    next_identity: i64,
    fail_after: Option<usize>,
    write_delay: Option<Duration>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl MemoryConnection {
    pub fn new(catalog: Vec<CatalogColumn>) -> Self {
        Self {
            target: "memory:1433/test".to_string(),
            catalog: Ok(catalog),
            catalog_queries: Arc::new(AtomicUsize::new(0)),
            next_identity: 1,
            fail_after: None,
            write_delay: None,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Catalog query that fails with `message`.
    pub fn denied(message: &str) -> Self {
        Self {
            catalog: Err(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Count catalog queries into a counter shared with other connections.
    pub fn with_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.catalog_queries = counter;
        self
    }

    /// Reject the transfer once `rows` rows have been accepted.
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn catalog_queries(&self) -> usize {
        self.catalog_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogReader for MemoryConnection {
    async fn catalog_columns(&mut self, table: &TableIdentifier) -> Result<Vec<CatalogColumn>> {
        self.catalog_queries.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.catalog
            .clone()
            .map_err(|message| BulkInsertError::catalog(table.full_name(), message))
    }
}

#[async_trait]
impl BulkConnection for MemoryConnection {
    fn target(&self) -> &str {
        &self.target
    }

    async fn execute(&mut self, _sql: &str) -> Result<u64> {
        Ok(0)
    }

    async fn write_all(
        &mut self,
        table: &TableIdentifier,
        rows: &mut dyn RowCursor,
        _options: &BulkCopyOptions,
    ) -> Result<u64> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }

        self.columns = (0..rows.column_count())
            .filter_map(|i| rows.column_name(i).map(str::to_string))
            .collect();

        let mut written = 0u64;
        while rows.advance()? {
            if self.fail_after == Some(self.rows.len()) {
                return Err(BulkInsertError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    format!("connection reset while loading {}", table),
                )));
            }

            let values = rows.current_row().unwrap_or_default();
            let stored = values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    if rows.is_auto_increment(i) {
                        SqlValue::I64(self.next_identity)
                    } else {
                        value.clone()
                    }
                })
                .collect();
            self.next_identity += 1;
            self.rows.push(stored);
            written += 1;
        }
        Ok(written)
    }
}
