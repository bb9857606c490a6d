//! Fluent mapping declaration.
//!
//! Each `map_*` call appends one column in declaration order, pairing the
//! column's metadata with an accessor and the default converter for its
//! type. Accessors return either the property type or an `Option` of it.
//!
//! ```
//! use chrono::NaiveDate;
//! use mssql_bulk_insert::Mapping;
//!
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//!     birth_date: Option<NaiveDate>,
//! }
//!
//! let mapping = Mapping::<Person>::builder("sample", "unit_test")
//!     .map_nvarchar("FirstName", |p: &Person| p.first_name.clone())
//!     .map_nvarchar("LastName", |p: &Person| p.last_name.clone())
//!     .map_date("BirthDate", |p: &Person| p.birth_date)
//!     .build()
//!     .unwrap();
//! assert_eq!(mapping.column_count(), 3);
//! ```
//!
//! Declaration mistakes (bad names, duplicates, impossible precision or
//! scale) are recorded where they happen and returned by
//! [`build`](MappingBuilder::build).

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::convert::{
    BigIntConverter, CharConverter, DateConverter, DateTimeConverter, DateTimeOffsetConverter,
    DecimalConverter, IdentityConverter, InstantConverter, NarrowToI64, NullConverter,
    OffsetPolicy, OffsetTime, TimeConverter, TimeWithOffsetConverter, UtcNanosConverter,
    UtcNanosDateConverter, UtcNanosTimeConverter, WireType,
};
use crate::core::identifier::{fold_column_name, validate_identifier};
use crate::core::{ColumnMetadata, Converter, SqlType, TableIdentifier};
use crate::error::{BulkInsertError, Result};

use super::column::{ColumnDefinition, Mapping};

/// Largest precision SQL Server accepts for `decimal`/`numeric`.
const MAX_DECIMAL_PRECISION: u32 = 38;

/// Largest scale a `rust_decimal::Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Fractional digits of `time`, `datetime2` and `datetimeoffset`.
const TEMPORAL_SCALE: u32 = 7;

/// `decimal` precision SQL Server assumes when none is given.
const DEFAULT_DECIMAL_PRECISION: u32 = 18;

/// Length recorded for `varbinary(max)`.
const VARBINARY_MAX_LENGTH: u32 = i32::MAX as u32;

/// Builder for [`Mapping`].
pub struct MappingBuilder<E> {
    table: TableIdentifier,
    columns: Vec<ColumnDefinition<E>>,
    error: Option<BulkInsertError>,
}

impl<E> MappingBuilder<E> {
    pub(crate) fn new(table: TableIdentifier) -> Self {
        Self {
            table,
            columns: Vec::new(),
            error: None,
        }
    }

    /// Finish the declaration.
    ///
    /// # Errors
    ///
    /// `BulkInsertError::Validation` for the first invalid declaration, an
    /// invalid table name, or a mapping without columns.
    pub fn build(self) -> Result<Mapping<E>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.table.quoted()?;
        if self.columns.is_empty() {
            return Err(BulkInsertError::Validation(format!(
                "mapping for {} declares no columns",
                self.table
            )));
        }
        Ok(Mapping::from_parts(self.table, self.columns))
    }

    /// Append a fully built column.
    pub fn add_column(mut self, column: ColumnDefinition<E>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.check_column(column.metadata()) {
            Ok(()) => self.columns.push(column),
            Err(err) => self.error = Some(err),
        }
        self
    }

    fn check_column(&self, metadata: &ColumnMetadata) -> Result<()> {
        let name = metadata.name();
        validate_identifier(name)?;

        let folded = fold_column_name(name);
        if let Some(existing) = self
            .columns
            .iter()
            .find(|c| fold_column_name(c.name()) == folded)
        {
            return Err(BulkInsertError::Validation(format!(
                "column {} is declared twice in {} (already mapped as {})",
                name,
                self.table,
                existing.name()
            )));
        }

        if metadata.sql_type().is_fixed_point() {
            let (precision, scale) = (metadata.precision(), metadata.scale());
            if precision == 0 || precision > MAX_DECIMAL_PRECISION {
                return Err(BulkInsertError::Validation(format!(
                    "column {}: precision must be between 1 and {}, got {}",
                    name, MAX_DECIMAL_PRECISION, precision
                )));
            }
            if scale > precision || scale > MAX_DECIMAL_SCALE {
                return Err(BulkInsertError::Validation(format!(
                    "column {}: scale {} exceeds precision {} or the maximum of {}",
                    name, scale, precision, MAX_DECIMAL_SCALE
                )));
            }
        }

        if metadata.sql_type() == SqlType::VarBinary && metadata.precision() == 0 {
            return Err(BulkInsertError::Validation(format!(
                "column {}: varbinary length must be greater than 0",
                name
            )));
        }

        Ok(())
    }
}

impl<E: 'static> MappingBuilder<E> {
    /// Append a column with an explicit converter.
    pub fn map_property<P, V, F, C>(
        self,
        metadata: ColumnMetadata,
        accessor: F,
        converter: C,
    ) -> Self
    where
        P: 'static,
        V: Into<Option<P>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
        C: Converter<P> + 'static,
    {
        self.add_column(ColumnDefinition::new(metadata, accessor, converter))
    }

    fn map_native<P, V, F>(self, name: &str, sql_type: SqlType, accessor: F) -> Self
    where
        P: WireType,
        V: Into<Option<P>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::new(name, sql_type),
            accessor,
            IdentityConverter::<P>::new(),
        )
    }

    pub fn map_boolean<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<bool>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<bool, V, F>(name, SqlType::Bit, accessor)
    }

    pub fn map_tinyint<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<u8>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<u8, V, F>(name, SqlType::TinyInt, accessor)
    }

    pub fn map_smallint<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<i16>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<i16, V, F>(name, SqlType::SmallInt, accessor)
    }

    pub fn map_integer<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<i32>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<i32, V, F>(name, SqlType::Int, accessor)
    }

    pub fn map_bigint<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<i64>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<i64, V, F>(name, SqlType::BigInt, accessor)
    }

    /// `bigint` column fed from a wider integer. Values outside the `i64`
    /// range fail the row instead of being truncated.
    ///
    /// The accessor returns `Option<P>` so `P` is never ambiguous.
    pub fn map_big_integer<P, F>(self, name: &str, accessor: F) -> Self
    where
        P: NarrowToI64,
        F: Fn(&E) -> Option<P> + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::new(name, SqlType::BigInt),
            accessor,
            BigIntConverter::<P>::new(),
        )
    }

    pub fn map_real<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<f32>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<f32, V, F>(name, SqlType::Real, accessor)
    }

    pub fn map_double<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<f64>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<f64, V, F>(name, SqlType::Float, accessor)
    }

    /// `decimal(precision, scale)`; values are rounded half up to `scale`.
    pub fn map_decimal<V, F>(self, name: &str, precision: u32, scale: u32, accessor: F) -> Self
    where
        V: Into<Option<Decimal>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::Decimal, precision, scale, false),
            accessor,
            DecimalConverter::new(scale),
        )
    }

    /// `numeric(precision, scale)`; values are rounded half up to `scale`.
    pub fn map_numeric<V, F>(self, name: &str, precision: u32, scale: u32, accessor: F) -> Self
    where
        V: Into<Option<Decimal>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_numeric_with_rounding(
            name,
            precision,
            scale,
            RoundingStrategy::MidpointAwayFromZero,
            accessor,
        )
    }

    pub fn map_numeric_with_rounding<V, F>(
        self,
        name: &str,
        precision: u32,
        scale: u32,
        strategy: RoundingStrategy,
        accessor: F,
    ) -> Self
    where
        V: Into<Option<Decimal>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::Numeric, precision, scale, false),
            accessor,
            DecimalConverter::with_strategy(scale, strategy),
        )
    }

    pub fn map_char<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<char>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(ColumnMetadata::new(name, SqlType::Char), accessor, CharConverter)
    }

    pub fn map_nchar<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<char>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(ColumnMetadata::new(name, SqlType::NChar), accessor, CharConverter)
    }

    pub fn map_varchar<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<String>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<String, V, F>(name, SqlType::VarChar, accessor)
    }

    pub fn map_nvarchar<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<String>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<String, V, F>(name, SqlType::NVarChar, accessor)
    }

    pub fn map_text<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<String>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<String, V, F>(name, SqlType::Text, accessor)
    }

    pub fn map_ntext<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<String>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<String, V, F>(name, SqlType::NText, accessor)
    }

    /// `varbinary(max_length)`.
    pub fn map_varbinary<V, F>(self, name: &str, max_length: u32, accessor: F) -> Self
    where
        V: Into<Option<Vec<u8>>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::VarBinary, max_length, 0, false),
            accessor,
            IdentityConverter::<Vec<u8>>::new(),
        )
    }

    pub fn map_uniqueidentifier<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<Uuid>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_native::<Uuid, V, F>(name, SqlType::UniqueIdentifier, accessor)
    }

    pub fn map_date<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<NaiveDate>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(ColumnMetadata::new(name, SqlType::Date), accessor, DateConverter)
    }

    pub fn map_time<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<NaiveTime>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::Time, 0, TEMPORAL_SCALE, false),
            accessor,
            TimeConverter,
        )
    }

    /// `time` column holding the UTC equivalent of an offset time.
    pub fn map_time_with_offset<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<OffsetTime>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::TimeWithOffset, 0, TEMPORAL_SCALE, false),
            accessor,
            TimeWithOffsetConverter,
        )
    }

    pub fn map_datetime<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<NaiveDateTime>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::DateTime2, 0, TEMPORAL_SCALE, false),
            accessor,
            DateTimeConverter,
        )
    }

    /// `datetime2` column holding an instant as wall-clock time under `policy`.
    pub fn map_instant<V, F>(self, name: &str, policy: OffsetPolicy, accessor: F) -> Self
    where
        V: Into<Option<DateTime<Utc>>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::DateTime2, 0, TEMPORAL_SCALE, false),
            accessor,
            InstantConverter::new(policy),
        )
    }

    pub fn map_datetimeoffset<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Into<Option<DateTime<FixedOffset>>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::DateTimeOffset, 0, TEMPORAL_SCALE, false),
            accessor,
            DateTimeOffsetConverter,
        )
    }

    /// `datetime2` column fed from nanoseconds since the Unix epoch.
    pub fn map_utc_nanos<V, F>(self, name: &str, policy: OffsetPolicy, accessor: F) -> Self
    where
        V: Into<Option<i64>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.map_property(
            ColumnMetadata::with_details(name, SqlType::DateTime2, 0, TEMPORAL_SCALE, false),
            accessor,
            UtcNanosConverter::new(policy),
        )
    }

    /// A `date` column and a `time` column fed from the same nanosecond
    /// epoch value. The time is sent as `HH:MM:SS.fffffff` text.
    pub fn map_utc_nanos_split<V, F>(
        self,
        date_name: &str,
        time_name: &str,
        policy: OffsetPolicy,
        accessor: F,
    ) -> Self
    where
        V: Into<Option<i64>> + 'static,
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        let accessor = Arc::new(accessor);
        let time_accessor = Arc::clone(&accessor);
        self.map_property(
            ColumnMetadata::new(date_name, SqlType::Date),
            move |entity: &E| (*accessor)(entity),
            UtcNanosDateConverter::new(policy),
        )
        .map_property(
            ColumnMetadata::with_details(time_name, SqlType::Time, 0, TEMPORAL_SCALE, false),
            move |entity: &E| (*time_accessor)(entity),
            UtcNanosTimeConverter::new(policy),
        )
    }

    /// Column that always receives a typed NULL.
    ///
    /// Fixed-point columns are declared as `decimal(18, 0)` and `varbinary`
    /// as `varbinary(max)`.
    pub fn map_null(self, name: &str, sql_type: SqlType) -> Self {
        let metadata = match sql_type {
            t if t.is_fixed_point() => {
                ColumnMetadata::with_details(name, t, DEFAULT_DECIMAL_PRECISION, 0, false)
            }
            SqlType::VarBinary => {
                ColumnMetadata::with_details(name, sql_type, VARBINARY_MAX_LENGTH, 0, false)
            }
            _ => ColumnMetadata::new(name, sql_type),
        };
        self.map_property(
            metadata,
            |_: &E| None::<()>,
            NullConverter::new(sql_type.null_type()),
        )
    }

    /// Server-generated `smallint IDENTITY` column.
    pub fn map_identity_smallint(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::server_generated(ColumnMetadata::new(
            name,
            SqlType::SmallInt,
        )))
    }

    /// Server-generated `int IDENTITY` column.
    pub fn map_identity_integer(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::server_generated(ColumnMetadata::new(
            name,
            SqlType::Int,
        )))
    }

    /// Server-generated `bigint IDENTITY` column.
    pub fn map_identity_bigint(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::server_generated(ColumnMetadata::new(
            name,
            SqlType::BigInt,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SqlNullType, SqlValue};
    use num_bigint::BigInt;

    #[derive(Default)]
    struct Sample {
        flag: bool,
        small: i16,
        count: Option<i32>,
        total: i64,
        huge: Option<BigInt>,
        amount: Option<Decimal>,
        initial: char,
        name: String,
        payload: Vec<u8>,
        stamp: i64,
    }

    fn values(mapping: &Mapping<Sample>, entity: &Sample) -> Vec<SqlValue<'static>> {
        mapping
            .columns()
            .iter()
            .map(|c| c.value(entity).unwrap())
            .collect()
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let mapping = Mapping::<Sample>::builder("dbo", "Sample")
            .map_nvarchar("Name", |s: &Sample| s.name.clone())
            .map_boolean("Flag", |s: &Sample| s.flag)
            .map_integer("Count", |s: &Sample| s.count)
            .build()
            .unwrap();

        let names: Vec<&str> = mapping.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Name", "Flag", "Count"]);
        assert_eq!(mapping.table(), &TableIdentifier::new("dbo", "Sample"));
    }

    #[test]
    fn test_default_converters() {
        let mapping = Mapping::<Sample>::builder("dbo", "Sample")
            .map_boolean("Flag", |s: &Sample| s.flag)
            .map_smallint("Small", |s: &Sample| s.small)
            .map_integer("Count", |s: &Sample| s.count)
            .map_bigint("Total", |s: &Sample| s.total)
            .map_big_integer("Huge", |s: &Sample| s.huge.clone())
            .map_decimal("Amount", 10, 2, |s: &Sample| s.amount)
            .map_char("Initial", |s: &Sample| s.initial)
            .map_varbinary("Payload", 16, |s: &Sample| s.payload.clone())
            .build()
            .unwrap();

        let entity = Sample {
            flag: true,
            small: 7,
            count: None,
            total: 42,
            huge: Some(BigInt::from(5)),
            amount: Some(Decimal::new(12345, 3)),
            initial: 'P',
            payload: vec![1, 2],
            ..Default::default()
        };

        assert_eq!(
            values(&mapping, &entity),
            vec![
                SqlValue::Bool(true),
                SqlValue::I16(7),
                SqlValue::Null(SqlNullType::I32),
                SqlValue::I64(42),
                SqlValue::I64(5),
                SqlValue::Decimal(Decimal::new(1235, 2)),
                SqlValue::text_owned("P".to_string()),
                SqlValue::bytes_owned(vec![1, 2]),
            ]
        );
    }

    #[test]
    fn test_utc_nanos_split_declares_two_columns() {
        let mapping = Mapping::<Sample>::builder("dbo", "Sample")
            .map_utc_nanos_split("StampDate", "StampTime", OffsetPolicy::Utc, |s: &Sample| {
                s.stamp
            })
            .build()
            .unwrap();

        let entity = Sample {
            stamp: 1_494_850_147_161_013_648,
            ..Default::default()
        };
        assert_eq!(mapping.column_count(), 2);
        assert_eq!(mapping.columns()[1].metadata().sql_type(), SqlType::Time);
        assert_eq!(
            values(&mapping, &entity),
            vec![
                SqlValue::Date(NaiveDate::from_ymd_opt(2017, 5, 15).unwrap()),
                SqlValue::text_owned("12:09:07.1610136".to_string()),
            ]
        );
    }

    #[test]
    fn test_identity_and_null_columns() {
        let mapping = Mapping::<Sample>::builder("dbo", "Sample")
            .map_identity_integer("Id")
            .map_null("Unused", SqlType::NVarChar)
            .map_integer("Count", |s: &Sample| s.count)
            .build()
            .unwrap();

        let id = mapping.columns()[0].metadata();
        assert!(id.is_auto_increment());
        assert_eq!(id.sql_type(), SqlType::Int);

        let entity = Sample {
            count: Some(11),
            ..Default::default()
        };
        assert_eq!(
            values(&mapping, &entity),
            vec![
                SqlValue::Null(SqlNullType::I32),
                SqlValue::Null(SqlNullType::String),
                SqlValue::I32(11),
            ]
        );
    }

    #[test]
    fn test_duplicate_column_is_rejected_case_insensitively() {
        let err = Mapping::<Sample>::builder("dbo", "Sample")
            .map_integer("Count", |s: &Sample| s.count)
            .map_bigint("COUNT", |s: &Sample| s.total)
            .build()
            .unwrap_err();
        assert!(matches!(err, BulkInsertError::Validation(_)));
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_invalid_decimal_declarations() {
        for (precision, scale) in [(0, 0), (39, 2), (5, 6), (38, 30)] {
            let result = Mapping::<Sample>::builder("dbo", "Sample")
                .map_decimal("Amount", precision, scale, |s: &Sample| s.amount)
                .build();
            assert!(
                matches!(result, Err(BulkInsertError::Validation(_))),
                "decimal({precision}, {scale}) should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_names_and_lengths() {
        assert!(Mapping::<Sample>::builder("dbo", "Sample")
            .map_integer("", |s: &Sample| s.count)
            .build()
            .is_err());
        assert!(Mapping::<Sample>::builder("dbo", "Sample")
            .map_varbinary("Payload", 0, |s: &Sample| s.payload.clone())
            .build()
            .is_err());
        assert!(Mapping::<Sample>::builder("dbo", "")
            .map_integer("Count", |s: &Sample| s.count)
            .build()
            .is_err());
    }

    #[test]
    fn test_null_columns_accept_every_type() {
        for sql_type in [
            SqlType::Decimal,
            SqlType::Numeric,
            SqlType::VarBinary,
            SqlType::Int,
            SqlType::NVarChar,
        ] {
            let mapping = Mapping::<Sample>::builder("dbo", "Sample")
                .map_null("Unused", sql_type)
                .build()
                .unwrap_or_else(|e| panic!("null {} column rejected: {e}", sql_type.name()));
            let column = &mapping.columns()[0];
            assert_eq!(column.metadata().sql_type(), sql_type);
            assert_eq!(
                column.value(&Sample::default()).unwrap(),
                SqlValue::Null(sql_type.null_type())
            );
        }

        let mapping = Mapping::<Sample>::builder("dbo", "Sample")
            .map_null("Amount", SqlType::Decimal)
            .map_null("Payload", SqlType::VarBinary)
            .build()
            .unwrap();
        assert_eq!(mapping.columns()[0].metadata().precision(), 18);
        assert_eq!(mapping.columns()[0].metadata().scale(), 0);
        assert!(mapping.columns()[1].metadata().precision() > 8000);
    }

    #[test]
    fn test_first_error_wins() {
        let err = Mapping::<Sample>::builder("dbo", "Sample")
            .map_integer("", |s: &Sample| s.count)
            .map_decimal("Amount", 0, 0, |s: &Sample| s.amount)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_empty_mapping_is_rejected() {
        let err = Mapping::<Sample>::builder("dbo", "Sample").build().unwrap_err();
        assert!(err.to_string().contains("no columns"));
    }
}
