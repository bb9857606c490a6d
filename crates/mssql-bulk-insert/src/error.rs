//! Error types for mapping, reconciliation and bulk transfer.

use thiserror::Error;

/// Boxed transport fault carried by [`BulkInsertError::BulkTransfer`].
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single converter on a single value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Value does not fit exactly into the narrower target type.
    #[error("value {value} overflows {target}")]
    Overflow { value: String, target: &'static str },

    /// Value lies outside the range the destination type can represent.
    #[error("value {value} is outside the range of {target}")]
    OutOfRange { value: String, target: &'static str },

    /// Value cannot be represented at all (NaN, malformed text, ...).
    #[error("invalid value for {target}: {message}")]
    Invalid {
        target: &'static str,
        message: String,
    },
}

impl ConvertError {
    pub fn overflow(value: impl ToString, target: &'static str) -> Self {
        ConvertError::Overflow {
            value: value.to_string(),
            target,
        }
    }

    pub fn out_of_range(value: impl ToString, target: &'static str) -> Self {
        ConvertError::OutOfRange {
            value: value.to_string(),
            target,
        }
    }

    pub fn invalid(target: &'static str, message: impl Into<String>) -> Self {
        ConvertError::Invalid {
            target,
            message: message.into(),
        }
    }
}

/// Main error type for bulk insert operations.
#[derive(Error, Debug)]
pub enum BulkInsertError {
    /// Malformed mapping declaration (bad identifier, duplicate column, bad precision/scale).
    #[error("Invalid mapping: {0}")]
    Validation(String),

    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Live catalog disagrees with the mapping.
    #[error("Schema mismatch for table {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    /// A single column value failed its converter.
    #[error("Conversion failed for column {column} in row {row}: {source}")]
    Conversion {
        column: String,
        row: u64,
        #[source]
        source: ConvertError,
    },

    /// Catalog metadata could not be read. Recovered locally by the reconciler.
    #[error("Catalog query failed for table {table}: {message}")]
    Catalog { table: String, message: String },

    /// Connection could not be opened.
    #[error("Connection error: {0}")]
    Connection(#[source] tiberius::error::Error),

    /// Statement execution failed.
    #[error("SQL Server error: {0}")]
    Sql(#[from] tiberius::error::Error),

    /// The bulk-load sink rejected the transfer.
    #[error("Bulk transfer into {table} failed: {message}")]
    BulkTransfer {
        table: String,
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BulkInsertError {
    /// Create a SchemaMismatch error
    pub fn schema_mismatch(table: impl Into<String>, message: impl Into<String>) -> Self {
        BulkInsertError::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Catalog error
    pub fn catalog(table: impl Into<String>, message: impl ToString) -> Self {
        BulkInsertError::Catalog {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a BulkTransfer error without an underlying transport fault.
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        BulkInsertError::BulkTransfer {
            table: table.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a BulkTransfer error wrapping the transport's native fault.
    pub fn transfer_with_source<E>(
        table: impl Into<String>,
        message: impl Into<String>,
        source: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BulkInsertError::BulkTransfer {
            table: table.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Normalize an error raised inside a transfer to one of the kinds the
    /// facade exposes. Conversion, schema and validation failures keep their
    /// kind; everything else becomes `BulkTransfer`.
    pub fn into_transfer_error(self, table: &str) -> Self {
        match self {
            e @ (BulkInsertError::Conversion { .. }
            | BulkInsertError::SchemaMismatch { .. }
            | BulkInsertError::Validation(_)
            | BulkInsertError::BulkTransfer { .. }) => e,
            other => BulkInsertError::BulkTransfer {
                table: table.to_string(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for bulk insert operations.
pub type Result<T> = std::result::Result<T, BulkInsertError>;
