//! Random scalar generators.
//!
//! Every generator takes an explicit [`rand::Rng`] and optional inclusive
//! bounds. Omitted bounds fall back to small, readable defaults so generated
//! fixtures stay easy to eyeball in test failures.

mod boolean;
mod bytes;
#[cfg(feature = "chrono")]
mod date;
mod enumeration;
mod number;
mod string;

use std::fmt;

use rand::Rng;
use serde_json::Value;

pub use boolean::{boolean, boolean_for, is_always_true};
pub use bytes::{bytes, DEFAULT_BYTES_LEN};
#[cfg(feature = "chrono")]
pub use date::{date, date_time, naive_date_time, safe_floor, DEFAULT_DATE_SPAN_MONTHS};
pub use enumeration::{enum_member, random_enum};
pub use number::{
    double, int, integer, long, unsigned, wide_integer, DEFAULT_FLOAT_RANGE, DEFAULT_INT_RANGE,
};
#[cfg(feature = "decimal")]
pub use number::decimal;
pub use string::{character, digits, email, string, url, StringHint, ALPHANUMERIC, DEFAULT_STRING_LEN};

use crate::error::GenerateError;
use crate::reflect::Primitive;

/// Resolve optional inclusive bounds against a default range.
///
/// A lone `min` keeps the default upper bound when it still fits, otherwise
/// the range collapses to `min`; a lone `max` mirrors that.
pub(crate) fn resolve_range<T>(
    min: Option<T>,
    max: Option<T>,
    default: (T, T),
) -> Result<(T, T), GenerateError>
where
    T: PartialOrd + Copy + fmt::Display,
{
    let (lo, hi) = match (min, max) {
        (None, None) => default,
        (Some(lo), None) => (lo, if lo <= default.1 { default.1 } else { lo }),
        (None, Some(hi)) => (if hi >= default.0 { default.0 } else { hi }, hi),
        (Some(lo), Some(hi)) => (lo, hi),
    };
    if lo > hi {
        return Err(GenerateError::InvalidRange {
            min: lo.to_string(),
            max: hi.to_string(),
        });
    }
    Ok((lo, hi))
}

/// Generate a JSON value for `primitive` using the default ranges.
pub fn value_for<R: Rng + ?Sized>(
    rng: &mut R,
    primitive: Primitive,
    hint: StringHint,
) -> Result<Value, GenerateError> {
    let value = match primitive {
        Primitive::Bool => Value::Bool(boolean(rng)),
        Primitive::F32 | Primitive::F64 => Value::from(double(rng, None, None)?),
        Primitive::Char => Value::String(character(rng).to_string()),
        Primitive::String => Value::String(hint.generate(rng)),
        Primitive::Bytes => Value::from(bytes(rng, None, None)?),
        #[cfg(feature = "chrono")]
        Primitive::Date => Value::String(date(rng, None, None)?.format("%Y-%m-%d").to_string()),
        #[cfg(feature = "chrono")]
        Primitive::NaiveDateTime => Value::String(
            naive_date_time(rng, None, None)?
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        ),
        #[cfg(feature = "chrono")]
        Primitive::DateTime => Value::String(date_time(rng, None, None)?.to_rfc3339()),
        #[cfg(feature = "decimal")]
        Primitive::Decimal => Value::String(decimal(rng, None, None)?.to_string()),
        #[cfg(feature = "uuid")]
        Primitive::Uuid => Value::String(uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()),
        integer_kind => integer_value(integer(rng, integer_kind, None, None)?),
    };
    Ok(value)
}

/// Like [`value_for`], but integers are drawn from `1..=` the smaller of the
/// type maximum and `i32::MAX`, which leaves room for uniqueness.
pub fn wide_value_for<R: Rng + ?Sized>(
    rng: &mut R,
    primitive: Primitive,
    hint: StringHint,
) -> Result<Value, GenerateError> {
    if primitive.is_integer() {
        return Ok(integer_value(wide_integer(rng, primitive)));
    }
    value_for(rng, primitive, hint)
}

pub(crate) fn integer_value(n: i128) -> Value {
    if let Ok(v) = i64::try_from(n) {
        Value::from(v)
    } else if let Ok(v) = u64::try_from(n) {
        Value::from(v)
    } else {
        Value::String(n.to_string())
    }
}
