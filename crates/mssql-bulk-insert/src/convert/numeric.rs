//! Fixed-point and big-integer converters.

use std::fmt::Display;
use std::marker::PhantomData;

use num_bigint::BigInt;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{Converter, SqlNullType, SqlValue};
use crate::error::ConvertError;

/// Rescales a decimal to a fixed scale.
///
/// The scale is applied on every call, rounding half away from zero unless
/// another strategy is given. Precision is carried for the column metadata
/// only; the server enforces it.
#[derive(Debug, Clone, Copy)]
pub struct DecimalConverter {
    scale: u32,
    strategy: RoundingStrategy,
}

impl DecimalConverter {
    pub fn new(scale: u32) -> Self {
        Self::with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn with_strategy(scale: u32, strategy: RoundingStrategy) -> Self {
        Self { scale, strategy }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl Converter<Decimal> for DecimalConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::Decimal
    }

    fn convert_value(&self, value: Decimal) -> Result<SqlValue<'static>, ConvertError> {
        let mut rounded = value.round_dp_with_strategy(self.scale, self.strategy);
        rounded.rescale(self.scale);
        // rescale stops early when the mantissa cannot hold the extra digits
        if rounded.scale() != self.scale {
            return Err(ConvertError::overflow(value, "decimal"));
        }
        Ok(SqlValue::Decimal(rounded))
    }
}

/// Exact narrowing to a 64-bit signed integer.
pub trait NarrowToI64: Display + Send + 'static {
    /// `None` when the value does not fit.
    fn narrow_to_i64(&self) -> Option<i64>;
}

impl NarrowToI64 for BigInt {
    fn narrow_to_i64(&self) -> Option<i64> {
        i64::try_from(self).ok()
    }
}

impl NarrowToI64 for i128 {
    fn narrow_to_i64(&self) -> Option<i64> {
        i64::try_from(*self).ok()
    }
}

impl NarrowToI64 for u64 {
    fn narrow_to_i64(&self) -> Option<i64> {
        i64::try_from(*self).ok()
    }
}

/// Narrows arbitrary-precision integers to `bigint`. Never truncates.
pub struct BigIntConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BigIntConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BigIntConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NarrowToI64> Converter<T> for BigIntConverter<T> {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::I64
    }

    fn convert_value(&self, value: T) -> Result<SqlValue<'static>, ConvertError> {
        value
            .narrow_to_i64()
            .map(SqlValue::I64)
            .ok_or_else(|| ConvertError::overflow(&value, "bigint"))
    }
}
