//! # mssql-bulk-insert
//!
//! Typed object-to-table mapping for SQL Server bulk copy.
//!
//! A [`Mapping`] declares, once per entity type, which destination column
//! each property feeds and how the value is converted. [`SqlServerBulkInsert`]
//! reconciles that declaration with the live table, streams entities through
//! a forward-only row cursor and hands the rows to a bulk-load sink such as
//! [`MssqlConnection`].
//!
//! - **Converters** for integers, fixed-point, text, binary and temporal
//!   values, with explicit overflow and range errors
//! - **Schema reconciliation** against the catalog: case-insensitive column
//!   matching, fail-open when the catalog cannot be read
//! - **Streaming**: only the current row is materialised
//!
//! ## Example
//!
//! ```rust,no_run
//! use mssql_bulk_insert::{Config, Mapping, MssqlConnection, SqlServerBulkInsert};
//!
//! struct Measurement {
//!     sensor: String,
//!     value: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> mssql_bulk_insert::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut conn = MssqlConnection::connect(&config.connection).await?;
//!
//!     let mapping = Mapping::<Measurement>::builder("dbo", "Measurement")
//!         .map_identity_integer("Id")
//!         .map_nvarchar("Sensor", |m: &Measurement| m.sensor.clone())
//!         .map_double("Value", |m: &Measurement| m.value)
//!         .build()?;
//!
//!     let rows = vec![Measurement { sensor: "t1".into(), value: 21.5 }];
//!     let summary = SqlServerBulkInsert::new(mapping)
//!         .save_all_with_options(&mut conn, &rows, &config.bulk)
//!         .await?;
//!     println!("Inserted {} rows", summary.rows_written);
//!     Ok(())
//! }
//! ```

pub mod bulk;
pub mod config;
pub mod convert;
pub mod core;
pub mod drivers;
pub mod error;
pub mod mapping;
pub mod reconcile;
pub mod record;

// Re-exports for convenient access
pub use bulk::{BulkInsertSummary, SqlServerBulkInsert};
pub use config::{BulkCopyOptions, Config, ConnectionConfig};
pub use convert::OffsetPolicy;
pub use crate::core::{
    BulkConnection, CatalogColumn, CatalogReader, ColumnMetadata, Converter, Row, RowCursor,
    SqlNullType, SqlType, SqlValue, TableIdentifier,
};
pub use drivers::MssqlConnection;
pub use error::{BulkInsertError, ConvertError, Result};
pub use mapping::{ColumnDefinition, Mapping, MappingBuilder};
pub use reconcile::{ColumnOrderSource, ReconciledColumns};
pub use record::{RowBuilder, SqlServerRecord};
