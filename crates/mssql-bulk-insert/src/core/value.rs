//! Converted property values.
//!
//! Converters emit [`SqlValue`]s; a [`Row`] holds one per cursor column.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Which TDS type a NULL is encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Uuid,
    Decimal,
    DateTime,
    DateTimeOffset,
    Date,
    Time,
}

/// A value ready for the bulk-load sink.
///
/// ```rust
/// use mssql_bulk_insert::core::{SqlNullType, SqlValue};
///
/// let name = SqlValue::text_owned("Philipp".to_string());
/// assert!(!name.is_null());
/// assert!(SqlValue::Null(SqlNullType::String).is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// Typed NULL.
    Null(SqlNullType),
    Bool(bool),
    /// tinyint
    U8(u8),
    /// smallint
    I16(i16),
    /// int
    I32(i32),
    /// bigint
    I64(i64),
    /// real
    F32(f32),
    /// float
    F64(f64),
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Uuid(Uuid),
    /// Already rescaled to the column scale.
    Decimal(Decimal),
    /// `datetime2`, truncated to 100 ns.
    DateTime(NaiveDateTime),
    /// `datetimeoffset`, truncated to 100 ns.
    DateTimeOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    /// `time`, truncated to 100 ns.
    Time(NaiveTime),
}

impl SqlValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }
}

impl SqlValue<'static> {
    pub fn text_owned(s: String) -> Self {
        SqlValue::Text(Cow::Owned(s))
    }

    pub fn bytes_owned(b: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(b))
    }
}

/// One converted row, position `i` belonging to column `i` of the cursor.
pub type Row = Vec<SqlValue<'static>>;

macro_rules! value_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for SqlValue<'static> {
                fn from(v: $source) -> Self {
                    SqlValue::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Uuid => Uuid,
    Decimal => Decimal,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    NaiveDate => Date,
    NaiveTime => Time,
}

impl From<String> for SqlValue<'static> {
    fn from(s: String) -> Self {
        SqlValue::text_owned(s)
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(b: Vec<u8>) -> Self {
        SqlValue::bytes_owned(b)
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(s: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_pick_matching_variant() {
        assert_eq!(SqlValue::from(7u8), SqlValue::U8(7));
        assert_eq!(SqlValue::from(-3i16), SqlValue::I16(-3));
        assert_eq!(
            SqlValue::from("Wagner".to_string()),
            SqlValue::text_owned("Wagner".to_string())
        );
        assert_eq!(SqlValue::from("Wagner"), SqlValue::text_owned("Wagner".to_string()));

        let date = NaiveDate::from_ymd_opt(1986, 5, 12).unwrap();
        assert_eq!(SqlValue::from(date), SqlValue::Date(date));
    }

    #[test]
    fn test_typed_null() {
        assert!(SqlValue::Null(SqlNullType::Date).is_null());
        assert!(!SqlValue::bytes_owned(Vec::new()).is_null());
    }
}
