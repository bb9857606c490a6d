//! Converter registry.
//!
//! Every converter turns one typed property value into a [`SqlValue`] the
//! bulk-load sink accepts. NULL handling lives in
//! [`Converter::convert`](crate::core::Converter::convert), so the types here
//! only implement the present-value case.
//!
//! - identity converters for values the sink takes as-is ([`IdentityConverter`])
//! - fixed-point and big-integer narrowing ([`numeric`])
//! - temporal values truncated to 100 ns ([`temporal`])

pub mod numeric;
pub mod temporal;

use std::marker::PhantomData;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::{Converter, SqlNullType, SqlValue};
use crate::error::ConvertError;

pub use numeric::{BigIntConverter, DecimalConverter, NarrowToI64};
pub use temporal::{
    split_utc_nanos, truncate_to_100ns, DateConverter, DateTimeConverter,
    DateTimeOffsetConverter, InstantConverter, OffsetPolicy, OffsetTime, TimeConverter,
    TimeWithOffsetConverter, UtcNanosConverter, UtcNanosDateConverter, UtcNanosTimeConverter,
};

/// A property type the sink accepts without transformation.
pub trait WireType: Into<SqlValue<'static>> + Send + 'static {
    /// Type hint for NULLs of this type.
    const NULL_TYPE: SqlNullType;
}

macro_rules! wire_type {
    ($($ty:ty => $null:ident),* $(,)?) => {
        $(
            impl WireType for $ty {
                const NULL_TYPE: SqlNullType = SqlNullType::$null;
            }
        )*
    };
}

wire_type! {
    bool => Bool,
    u8 => U8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    Decimal => Decimal,
}

/// Passes a [`WireType`] through unchanged.
pub struct IdentityConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> IdentityConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for IdentityConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WireType> Converter<T> for IdentityConverter<T> {
    fn null_type(&self) -> SqlNullType {
        T::NULL_TYPE
    }

    fn convert_value(&self, value: T) -> Result<SqlValue<'static>, ConvertError> {
        Ok(value.into())
    }
}

/// Single character to a one-character string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharConverter;

impl Converter<char> for CharConverter {
    fn null_type(&self) -> SqlNullType {
        SqlNullType::String
    }

    fn convert_value(&self, value: char) -> Result<SqlValue<'static>, ConvertError> {
        Ok(SqlValue::text_owned(value.to_string()))
    }
}

/// Always emits a typed NULL.
#[derive(Debug, Clone, Copy)]
pub struct NullConverter {
    null_type: SqlNullType,
}

impl NullConverter {
    pub fn new(null_type: SqlNullType) -> Self {
        Self { null_type }
    }
}

impl Converter<()> for NullConverter {
    fn null_type(&self) -> SqlNullType {
        self.null_type
    }

    fn convert_value(&self, _value: ()) -> Result<SqlValue<'static>, ConvertError> {
        Ok(SqlValue::Null(self.null_type))
    }
}
