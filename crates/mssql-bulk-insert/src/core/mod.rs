//! Core abstractions shared by the mapping layer and the drivers.
//!
//! - [`schema`]: column type tags, column metadata, table identifiers
//! - [`value`]: the wire value a converter produces
//! - [`traits`]: converter, row cursor and connection seams
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{CatalogColumn, ColumnMetadata, SqlType, TableIdentifier};
pub use traits::{BulkConnection, CatalogReader, Converter, RowCursor};
pub use value::{Row, SqlNullType, SqlValue};
