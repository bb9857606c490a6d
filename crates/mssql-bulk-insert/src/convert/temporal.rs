//! Temporal converters.
//!
//! SQL Server's `datetime2`, `datetimeoffset` and `time` store at most seven
//! fractional digits. Every converter here truncates (never rounds) to
//! 100-nanosecond units through [`truncate_to_100ns`], and rejects values
//! outside `0001-01-01..=9999-12-31`.
//!
//! Instants have no wall-clock representation of their own, so converters
//! that produce a `datetime2` from one take an [`OffsetPolicy`]. The local
//! policy looks the offset up on every call.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeDelta, Timelike, Utc,
};

use crate::core::{Converter, SqlNullType, SqlValue};
use crate::error::ConvertError;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_TICK: u32 = 100;

/// Truncate the sub-second part to whole 100 ns ticks.
pub fn truncate_to_100ns<T: Timelike>(value: T) -> T {
    let nanos = value.nanosecond();
    let truncated = nanos - nanos % NANOS_PER_TICK;
    if truncated == nanos {
        return value;
    }
    value.with_nanosecond(truncated).unwrap_or(value)
}

/// Split nanoseconds since the Unix epoch into whole seconds and a
/// sub-second remainder truncated to 100 ns.
///
/// Uses Euclidean division, so instants before 1970 keep a non-negative
/// remainder: `-1` becomes `(-1, 999_999_900)`.
pub fn split_utc_nanos(nanos_since_epoch: i64) -> (i64, u32) {
    let seconds = nanos_since_epoch.div_euclid(NANOS_PER_SECOND);
    let nanos = nanos_since_epoch.rem_euclid(NANOS_PER_SECOND) as u32;
    (seconds, nanos - nanos % NANOS_PER_TICK)
}

fn instant_from_utc_nanos(nanos_since_epoch: i64) -> Result<DateTime<Utc>, ConvertError> {
    let (seconds, nanos) = split_utc_nanos(nanos_since_epoch);
    DateTime::from_timestamp(seconds, nanos)
        .ok_or_else(|| ConvertError::out_of_range(nanos_since_epoch, "datetime2"))
}

pub(crate) fn check_date_range(date: NaiveDate, target: &'static str) -> Result<(), ConvertError> {
    if (1..=9999).contains(&date.year()) {
        Ok(())
    } else {
        Err(ConvertError::out_of_range(date, target))
    }
}

/// Seven-digit `HH:MM:SS.fffffff` rendering.
fn format_time_100ns(time: NaiveTime) -> String {
    format!(
        "{}.{:07}",
        time.format("%H:%M:%S"),
        time.nanosecond() / NANOS_PER_TICK
    )
}

/// How an instant is turned into a wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetPolicy {
    /// Store the UTC wall clock.
    #[default]
    Utc,
    /// Store the wall clock at a fixed offset.
    Fixed(FixedOffset),
    /// Store the wall clock of the host's time zone at that instant.
    Local,
}

impl OffsetPolicy {
    /// Offset in effect at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            OffsetPolicy::Utc => Utc.fix(),
            OffsetPolicy::Fixed(offset) => *offset,
            OffsetPolicy::Local => instant.with_timezone(&Local).offset().fix(),
        }
    }

    /// Wall-clock representation of `instant` under this policy.
    pub fn localize(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        instant
            .with_timezone(&self.offset_at(instant))
            .naive_local()
    }
}

/// A wall-clock time with a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl OffsetTime {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }

    /// Same instant of the day as UTC wall-clock time, wrapping at midnight.
    pub fn to_utc(&self) -> NaiveTime {
        let shift = TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        self.time.overflowing_sub_signed(shift).0
    }
}

/// `NaiveDate` to `date`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter;

impl Converter<NaiveDate> for DateConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::Date
    }

    fn convert_value(&self, value: NaiveDate) -> Result<SqlValue<'static>, ConvertError> {
        check_date_range(value, "date")?;
        Ok(SqlValue::Date(value))
    }
}

/// `NaiveTime` to `time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeConverter;

impl Converter<NaiveTime> for TimeConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::Time
    }

    fn convert_value(&self, value: NaiveTime) -> Result<SqlValue<'static>, ConvertError> {
        Ok(SqlValue::Time(truncate_to_100ns(value)))
    }
}

/// [`OffsetTime`] to `time`, normalised to UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWithOffsetConverter;

impl Converter<OffsetTime> for TimeWithOffsetConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::Time
    }

    fn convert_value(&self, value: OffsetTime) -> Result<SqlValue<'static>, ConvertError> {
        Ok(SqlValue::Time(truncate_to_100ns(value.to_utc())))
    }
}

/// `NaiveDateTime` to `datetime2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeConverter;

impl Converter<NaiveDateTime> for DateTimeConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::DateTime
    }

    fn convert_value(&self, value: NaiveDateTime) -> Result<SqlValue<'static>, ConvertError> {
        check_date_range(value.date(), "datetime2")?;
        Ok(SqlValue::DateTime(truncate_to_100ns(value)))
    }
}

/// `DateTime<FixedOffset>` to `datetimeoffset`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeOffsetConverter;

impl Converter<DateTime<FixedOffset>> for DateTimeOffsetConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::DateTimeOffset
    }

    fn convert_value(
        &self,
        value: DateTime<FixedOffset>,
    ) -> Result<SqlValue<'static>, ConvertError> {
        // datetimeoffset stores the UTC part, so both sides must be in range
        check_date_range(value.naive_utc().date(), "datetimeoffset")?;
        check_date_range(value.naive_local().date(), "datetimeoffset")?;
        Ok(SqlValue::DateTimeOffset(truncate_to_100ns(value)))
    }
}

/// `DateTime<Utc>` to `datetime2` under an [`OffsetPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantConverter {
    policy: OffsetPolicy,
}

impl InstantConverter {
    pub fn new(policy: OffsetPolicy) -> Self {
        Self { policy }
    }

    fn wall_clock(&self, instant: &DateTime<Utc>) -> Result<NaiveDateTime, ConvertError> {
        let local = truncate_to_100ns(self.policy.localize(instant));
        check_date_range(local.date(), "datetime2")?;
        Ok(local)
    }
}

impl Converter<DateTime<Utc>> for InstantConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::DateTime
    }

    fn convert_value(&self, value: DateTime<Utc>) -> Result<SqlValue<'static>, ConvertError> {
        Ok(SqlValue::DateTime(self.wall_clock(&value)?))
    }
}

/// Nanoseconds since the Unix epoch (UTC) to `datetime2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcNanosConverter {
    instant: InstantConverter,
}

impl UtcNanosConverter {
    pub fn new(policy: OffsetPolicy) -> Self {
        Self {
            instant: InstantConverter::new(policy),
        }
    }
}

impl Converter<i64> for UtcNanosConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::DateTime
    }

    fn convert_value(&self, value: i64) -> Result<SqlValue<'static>, ConvertError> {
        let instant = instant_from_utc_nanos(value)?;
        Ok(SqlValue::DateTime(self.instant.wall_clock(&instant)?))
    }
}

/// Date projection of a nanosecond epoch value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcNanosDateConverter {
    instant: InstantConverter,
}

impl UtcNanosDateConverter {
    pub fn new(policy: OffsetPolicy) -> Self {
        Self {
            instant: InstantConverter::new(policy),
        }
    }
}

impl Converter<i64> for UtcNanosDateConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::Date
    }

    fn convert_value(&self, value: i64) -> Result<SqlValue<'static>, ConvertError> {
        let instant = instant_from_utc_nanos(value)?;
        Ok(SqlValue::Date(self.instant.wall_clock(&instant)?.date()))
    }
}

/// Time projection of a nanosecond epoch value, as `HH:MM:SS.fffffff` text.
///
/// The text form keeps all seven fractional digits when the sink parses it
/// into a `time(7)` column.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcNanosTimeConverter {
    instant: InstantConverter,
}

impl UtcNanosTimeConverter {
    pub fn new(policy: OffsetPolicy) -> Self {
        Self {
            instant: InstantConverter::new(policy),
        }
    }
}

impl Converter<i64> for UtcNanosTimeConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::String
    }

    fn convert_value(&self, value: i64) -> Result<SqlValue<'static>, ConvertError> {
        let instant = instant_from_utc_nanos(value)?;
        let time = self.instant.wall_clock(&instant)?.time();
        Ok(SqlValue::text_owned(format_time_100ns(time)))
    }
}
