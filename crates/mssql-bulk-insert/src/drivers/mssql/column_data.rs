//! `SqlValue` to TDS encoding.
//!
//! Bulk rows are sent as [`ColumnData`]; the single-row fallback `INSERT`
//! binds [`ToSql`] parameters. Both honour the declared column type, so a
//! text value in a `time` column is parsed into a real `time`.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tiberius::numeric::Numeric;
use tiberius::time::{Date, DateTime2, DateTimeOffset, Time};
use tiberius::{ColumnData, ToSql};

use crate::core::{ColumnMetadata, SqlNullType, SqlType, SqlValue};
use crate::error::ConvertError;

/// Maximum string length (in bytes, UTF-16) for TDS bulk insert.
pub(crate) const BULK_INSERT_STRING_LIMIT: usize = 65535;

/// Scale used for every time component sent over TDS.
const TIME_SCALE: u8 = 7;

/// Whether a row holds a string too large for the bulk protocol.
pub(crate) fn row_has_oversized_strings(row: &[SqlValue<'_>]) -> bool {
    row.iter().any(|value| match value {
        SqlValue::Text(s) => {
            let utf16_len: usize = s.chars().map(|c| c.len_utf16() * 2).sum();
            utf16_len > BULK_INSERT_STRING_LIMIT
        }
        _ => false,
    })
}

fn days_since_year_one(date: NaiveDate, target: &'static str) -> Result<u32, ConvertError> {
    let epoch = NaiveDate::from_ymd_opt(1, 1, 1)
        .ok_or_else(|| ConvertError::invalid(target, "calendar epoch unavailable"))?;
    let days = (date - epoch).num_days();
    u32::try_from(days).map_err(|_| ConvertError::out_of_range(date, target))
}

fn tds_time(time: NaiveTime) -> Time {
    let nanos =
        u64::from(time.num_seconds_from_midnight()) * 1_000_000_000 + u64::from(time.nanosecond());
    Time::new(nanos / 100, TIME_SCALE)
}

fn tds_datetime2(value: NaiveDateTime, target: &'static str) -> Result<DateTime2, ConvertError> {
    let date = Date::new(days_since_year_one(value.date(), target)?);
    Ok(DateTime2::new(date, tds_time(value.time())))
}

fn parse_time_text(text: &str) -> Result<NaiveTime, ConvertError> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .map_err(|e| ConvertError::invalid("time", format!("{:?}: {}", text, e)))
}

fn check_finite(value: f64, target: &'static str) -> Result<(), ConvertError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConvertError::invalid(target, format!("{} is not a finite number", value)))
    }
}

fn null_column_data(null_type: SqlNullType) -> ColumnData<'static> {
    match null_type {
        SqlNullType::Bool => ColumnData::Bit(None),
        SqlNullType::U8 => ColumnData::U8(None),
        SqlNullType::I16 => ColumnData::I16(None),
        SqlNullType::I32 => ColumnData::I32(None),
        SqlNullType::I64 => ColumnData::I64(None),
        SqlNullType::F32 => ColumnData::F32(None),
        SqlNullType::F64 => ColumnData::F64(None),
        SqlNullType::String => ColumnData::String(None),
        SqlNullType::Bytes => ColumnData::Binary(None),
        SqlNullType::Uuid => ColumnData::Guid(None),
        SqlNullType::Decimal => ColumnData::Numeric(None),
        SqlNullType::DateTime => ColumnData::DateTime2(None),
        SqlNullType::DateTimeOffset => ColumnData::DateTimeOffset(None),
        SqlNullType::Date => ColumnData::Date(None),
        SqlNullType::Time => ColumnData::Time(None),
    }
}

/// Encode one value for a bulk row.
pub(crate) fn to_column_data(
    value: &SqlValue<'_>,
    column: &ColumnMetadata,
) -> Result<ColumnData<'static>, ConvertError> {
    let data = match value {
        SqlValue::Null(null_type) => null_column_data(*null_type),
        SqlValue::Bool(b) => ColumnData::Bit(Some(*b)),
        SqlValue::U8(i) => ColumnData::U8(Some(*i)),
        SqlValue::I16(i) => ColumnData::I16(Some(*i)),
        SqlValue::I32(i) => ColumnData::I32(Some(*i)),
        SqlValue::I64(i) => ColumnData::I64(Some(*i)),
        SqlValue::F32(f) => {
            check_finite(f64::from(*f), "real")?;
            ColumnData::F32(Some(*f))
        }
        SqlValue::F64(f) => {
            check_finite(*f, "float")?;
            ColumnData::F64(Some(*f))
        }
        SqlValue::Text(s) if column.sql_type() == SqlType::Time => {
            ColumnData::Time(Some(tds_time(parse_time_text(s)?)))
        }
        SqlValue::Text(s) => ColumnData::String(Some(Cow::Owned(s.to_string()))),
        SqlValue::Bytes(b) => ColumnData::Binary(Some(Cow::Owned(b.to_vec()))),
        SqlValue::Uuid(u) => ColumnData::Guid(Some(*u)),
        SqlValue::Decimal(d) => {
            let scale = u8::try_from(d.scale())
                .map_err(|_| ConvertError::out_of_range(d, "decimal"))?;
            ColumnData::Numeric(Some(Numeric::new_with_scale(d.mantissa(), scale)))
        }
        SqlValue::DateTime(dt) => ColumnData::DateTime2(Some(tds_datetime2(*dt, "datetime2")?)),
        SqlValue::DateTimeOffset(dto) => {
            let utc = tds_datetime2(dto.naive_utc(), "datetimeoffset")?;
            let offset_minutes = (dto.offset().local_minus_utc() / 60) as i16;
            ColumnData::DateTimeOffset(Some(DateTimeOffset::new(utc, offset_minutes)))
        }
        SqlValue::Date(d) => ColumnData::Date(Some(Date::new(days_since_year_one(*d, "date")?))),
        SqlValue::Time(t) => ColumnData::Time(Some(tds_time(*t))),
    };
    Ok(data)
}

fn null_param(null_type: SqlNullType) -> Box<dyn ToSql> {
    match null_type {
        SqlNullType::Bool => Box::new(Option::<bool>::None),
        SqlNullType::U8 => Box::new(Option::<u8>::None),
        SqlNullType::I16 => Box::new(Option::<i16>::None),
        SqlNullType::I32 => Box::new(Option::<i32>::None),
        SqlNullType::I64 => Box::new(Option::<i64>::None),
        SqlNullType::F32 => Box::new(Option::<f32>::None),
        SqlNullType::F64 => Box::new(Option::<f64>::None),
        SqlNullType::String => Box::new(Option::<String>::None),
        SqlNullType::Bytes => Box::new(Option::<Vec<u8>>::None),
        SqlNullType::Uuid => Box::new(Option::<uuid::Uuid>::None),
        SqlNullType::Decimal => Box::new(Option::<rust_decimal::Decimal>::None),
        SqlNullType::DateTime => Box::new(Option::<NaiveDateTime>::None),
        SqlNullType::DateTimeOffset => {
            Box::new(Option::<chrono::DateTime<chrono::FixedOffset>>::None)
        }
        SqlNullType::Date => Box::new(Option::<NaiveDate>::None),
        SqlNullType::Time => Box::new(Option::<NaiveTime>::None),
    }
}

/// Bind one value as a parameter of the fallback `INSERT`.
pub(crate) fn to_sql_param(
    value: &SqlValue<'_>,
    column: &ColumnMetadata,
) -> Result<Box<dyn ToSql>, ConvertError> {
    let param: Box<dyn ToSql> = match value {
        SqlValue::Null(null_type) => null_param(*null_type),
        SqlValue::Bool(b) => Box::new(*b),
        SqlValue::U8(i) => Box::new(*i),
        SqlValue::I16(i) => Box::new(*i),
        SqlValue::I32(i) => Box::new(*i),
        SqlValue::I64(i) => Box::new(*i),
        SqlValue::F32(f) => {
            check_finite(f64::from(*f), "real")?;
            Box::new(*f)
        }
        SqlValue::F64(f) => {
            check_finite(*f, "float")?;
            Box::new(*f)
        }
        SqlValue::Text(s) if column.sql_type() == SqlType::Time => {
            Box::new(parse_time_text(s)?)
        }
        SqlValue::Text(s) => Box::new(s.to_string()),
        SqlValue::Bytes(b) => Box::new(b.to_vec()),
        SqlValue::Uuid(u) => Box::new(*u),
        SqlValue::Decimal(d) => Box::new(*d),
        SqlValue::DateTime(dt) => Box::new(*dt),
        SqlValue::DateTimeOffset(dto) => Box::new(*dto),
        SqlValue::Date(d) => Box::new(*d),
        SqlValue::Time(t) => Box::new(*t),
    };
    Ok(param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn column(sql_type: SqlType) -> ColumnMetadata {
        ColumnMetadata::new("Col", sql_type)
    }

    #[test]
    fn test_oversized_strings() {
        let small = vec![SqlValue::text_owned("x".repeat(100))];
        assert!(!row_has_oversized_strings(&small));

        // 32768 chars * 2 bytes = 65536 bytes
        let large = vec![SqlValue::I32(1), SqlValue::text_owned("x".repeat(32768))];
        assert!(row_has_oversized_strings(&large));
    }

    #[test]
    fn test_text_in_time_column_is_parsed() {
        let value = SqlValue::text_owned("12:09:07.1610136".to_string());
        match to_column_data(&value, &column(SqlType::Time)).unwrap() {
            ColumnData::Time(Some(time)) => {
                assert_eq!(time.increments(), (12 * 3600 + 9 * 60 + 7) * 10_000_000 + 1_610_136);
                assert_eq!(time.scale(), 7);
            }
            other => panic!("unexpected {other:?}"),
        }

        let text = to_column_data(&value, &column(SqlType::NVarChar)).unwrap();
        assert!(matches!(text, ColumnData::String(Some(_))));
    }

    #[test]
    fn test_malformed_time_text() {
        let value = SqlValue::text_owned("25:99".to_string());
        assert!(matches!(
            to_column_data(&value, &column(SqlType::Time)),
            Err(ConvertError::Invalid { .. })
        ));
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        assert!(to_column_data(&SqlValue::F64(f64::NAN), &column(SqlType::Float)).is_err());
        assert!(to_column_data(&SqlValue::F32(f32::INFINITY), &column(SqlType::Real)).is_err());
        assert!(to_sql_param(&SqlValue::F64(f64::NEG_INFINITY), &column(SqlType::Float)).is_err());
        assert!(to_column_data(&SqlValue::F64(1.5), &column(SqlType::Float)).is_ok());
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let value = SqlValue::Decimal(Decimal::new(12345, 2));
        match to_column_data(&value, &column(SqlType::Decimal)).unwrap() {
            ColumnData::Numeric(Some(n)) => {
                assert_eq!(n.value(), 12345);
                assert_eq!(n.scale(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dates_count_days_from_year_one() {
        let date = NaiveDate::from_ymd_opt(1, 1, 2).unwrap();
        match to_column_data(&SqlValue::Date(date), &column(SqlType::Date)).unwrap() {
            ColumnData::Date(Some(d)) => assert_eq!(d.days(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_typed_nulls() {
        assert!(matches!(
            to_column_data(&SqlValue::Null(SqlNullType::U8), &column(SqlType::TinyInt)).unwrap(),
            ColumnData::U8(None)
        ));
        assert!(matches!(
            to_column_data(&SqlValue::Null(SqlNullType::Date), &column(SqlType::Date)).unwrap(),
            ColumnData::Date(None)
        ));
    }
}
