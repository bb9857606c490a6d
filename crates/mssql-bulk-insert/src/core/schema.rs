//! Column and table metadata.
//!
//! [`ColumnMetadata`] is what a mapping declares about a destination column;
//! [`CatalogColumn`] is what the live database reports about it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::qualify_mssql;
use super::value::SqlNullType;
use crate::error::Result;

/// Destination column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Real,
    Float,
    Decimal,
    Numeric,
    Date,
    Time,
    /// Wall-clock time carrying an offset; stored as UTC `time`.
    TimeWithOffset,
    DateTime2,
    DateTimeOffset,
    Char,
    NChar,
    VarChar,
    NVarChar,
    Text,
    NText,
    VarBinary,
    UniqueIdentifier,
    /// Column that always receives NULL.
    Null,
}

impl SqlType {
    /// SQL Server type name.
    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Bit => "bit",
            SqlType::TinyInt => "tinyint",
            SqlType::SmallInt => "smallint",
            SqlType::Int => "int",
            SqlType::BigInt => "bigint",
            SqlType::Real => "real",
            SqlType::Float => "float",
            SqlType::Decimal => "decimal",
            SqlType::Numeric => "numeric",
            SqlType::Date => "date",
            SqlType::Time | SqlType::TimeWithOffset => "time",
            SqlType::DateTime2 => "datetime2",
            SqlType::DateTimeOffset => "datetimeoffset",
            SqlType::Char => "char",
            SqlType::NChar => "nchar",
            SqlType::VarChar => "varchar",
            SqlType::NVarChar => "nvarchar",
            SqlType::Text => "text",
            SqlType::NText => "ntext",
            SqlType::VarBinary => "varbinary",
            SqlType::UniqueIdentifier => "uniqueidentifier",
            SqlType::Null => "null",
        }
    }

    /// Type hint used when a value of this column is NULL.
    pub fn null_type(&self) -> SqlNullType {
        match self {
            SqlType::Bit => SqlNullType::Bool,
            SqlType::TinyInt => SqlNullType::U8,
            SqlType::SmallInt => SqlNullType::I16,
            SqlType::Int => SqlNullType::I32,
            SqlType::BigInt => SqlNullType::I64,
            SqlType::Real => SqlNullType::F32,
            SqlType::Float => SqlNullType::F64,
            SqlType::Decimal | SqlType::Numeric => SqlNullType::Decimal,
            SqlType::Date => SqlNullType::Date,
            SqlType::Time | SqlType::TimeWithOffset => SqlNullType::Time,
            SqlType::DateTime2 => SqlNullType::DateTime,
            SqlType::DateTimeOffset => SqlNullType::DateTimeOffset,
            SqlType::Char
            | SqlType::NChar
            | SqlType::VarChar
            | SqlType::NVarChar
            | SqlType::Text
            | SqlType::NText
            | SqlType::Null => SqlNullType::String,
            SqlType::VarBinary => SqlNullType::Bytes,
            SqlType::UniqueIdentifier => SqlNullType::Uuid,
        }
    }

    /// Whether precision and scale are meaningful for this type.
    pub fn is_fixed_point(&self) -> bool {
        matches!(self, SqlType::Decimal | SqlType::Numeric)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of one destination column.
///
/// `precision` carries the maximum length for variable-length binary columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    name: String,
    sql_type: SqlType,
    precision: u32,
    scale: u32,
    is_auto_increment: bool,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self::with_details(name, sql_type, 0, 0, false)
    }

    pub fn with_details(
        name: impl Into<String>,
        sql_type: SqlType,
        precision: u32,
        scale: u32,
        is_auto_increment: bool,
    ) -> Self {
        Self {
            name: name.into(),
            sql_type,
            precision,
            scale,
            is_auto_increment,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Whether the server generates this column's value.
    pub fn is_auto_increment(&self) -> bool {
        self.is_auto_increment
    }

    /// Copy of this metadata with the auto-increment flag set.
    pub(crate) fn as_server_generated(&self) -> Self {
        Self {
            is_auto_increment: true,
            ..self.clone()
        }
    }
}

impl fmt::Display for ColumnMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.sql_type)?;
        if self.sql_type.is_fixed_point() {
            write!(f, "({}, {})", self.precision, self.scale)?;
        } else if self.sql_type == SqlType::VarBinary {
            write!(f, "({})", self.precision)?;
        }
        if self.is_auto_increment {
            f.write_str(" IDENTITY")?;
        }
        Ok(())
    }
}

/// Destination table: schema plus table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Schema name. Empty means the login's default schema.
    pub schema: String,

    /// Table name.
    pub name: String,
}

impl TableIdentifier {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Get the fully qualified, unquoted table name.
    pub fn full_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    /// Bracket-quoted name for use in SQL text.
    pub fn quoted(&self) -> Result<String> {
        qualify_mssql(&self.schema, &self.name)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// A column as reported by the destination's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    /// Column name.
    pub name: String,

    /// Ordinal position (1-based).
    pub ordinal: i32,

    /// Whether the column is an identity column.
    #[serde(default)]
    pub is_identity: bool,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, ordinal: i32) -> Self {
        Self {
            name: name.into(),
            ordinal,
            is_identity: false,
        }
    }

    pub fn identity(name: impl Into<String>, ordinal: i32) -> Self {
        Self {
            is_identity: true,
            ..Self::new(name, ordinal)
        }
    }
}
