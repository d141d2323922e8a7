use rand::Rng;

use super::resolve_range;
use crate::error::GenerateError;
use crate::reflect::Primitive;

/// Default inclusive range for integers.
pub const DEFAULT_INT_RANGE: (i64, i64) = (0, 10);

/// Default inclusive range for floating point and decimal values.
pub const DEFAULT_FLOAT_RANGE: (f64, f64) = (0.0, 10.0);

/// Random `i32` in `min..=max` (default `0..=10`).
pub fn int<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<i32>,
    max: Option<i32>,
) -> Result<i32, GenerateError> {
    let default = (DEFAULT_INT_RANGE.0 as i32, DEFAULT_INT_RANGE.1 as i32);
    let (lo, hi) = resolve_range(min, max, default)?;
    Ok(rng.gen_range(lo..=hi))
}

/// Random `i64` in `min..=max` (default `0..=10`).
pub fn long<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<i64, GenerateError> {
    let (lo, hi) = resolve_range(min, max, DEFAULT_INT_RANGE)?;
    Ok(rng.gen_range(lo..=hi))
}

/// Random `u64` in `min..=max` (default `0..=10`).
pub fn unsigned<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<u64>,
    max: Option<u64>,
) -> Result<u64, GenerateError> {
    let default = (DEFAULT_INT_RANGE.0 as u64, DEFAULT_INT_RANGE.1 as u64);
    let (lo, hi) = resolve_range(min, max, default)?;
    Ok(rng.gen_range(lo..=hi))
}

/// Random integer of the given primitive kind, clamped to the kind's bounds.
///
/// Non-integer kinds are treated as `i64`.
pub fn integer<R: Rng + ?Sized>(
    rng: &mut R,
    kind: Primitive,
    min: Option<i128>,
    max: Option<i128>,
) -> Result<i128, GenerateError> {
    let (type_min, type_max) = kind
        .integer_bounds()
        .unwrap_or((i64::MIN as i128, i64::MAX as i128));
    let default = (
        (DEFAULT_INT_RANGE.0 as i128).max(type_min),
        (DEFAULT_INT_RANGE.1 as i128).min(type_max),
    );
    let (lo, hi) = resolve_range(min, max, default)?;
    let (lo, hi) = (lo.max(type_min), hi.min(type_max));
    if lo > hi {
        return Err(GenerateError::InvalidRange {
            min: lo.to_string(),
            max: hi.to_string(),
        });
    }
    Ok(rng.gen_range(lo..=hi))
}

/// Integer of `kind` in `1..=min(type max, i32::MAX)`.
pub fn wide_integer<R: Rng + ?Sized>(rng: &mut R, kind: Primitive) -> i128 {
    let type_max = kind.integer_bounds().map_or(i32::MAX as i128, |(_, hi)| hi);
    rng.gen_range(1..=type_max.min(i32::MAX as i128))
}

/// Random `f64` in `min..=max` (default `0.0..=10.0`).
///
/// NaN and infinite bounds are rejected with [`GenerateError::InvalidRange`].
pub fn double<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<f64, GenerateError> {
    let non_finite = [min, max].into_iter().flatten().find(|b| !b.is_finite());
    if let Some(bound) = non_finite {
        return Err(GenerateError::InvalidRange {
            min: min.unwrap_or(bound).to_string(),
            max: max.unwrap_or(bound).to_string(),
        });
    }
    let (lo, hi) = resolve_range(min, max, DEFAULT_FLOAT_RANGE)?;
    if lo == hi {
        return Ok(lo);
    }
    if hi - lo < f64::MAX / 2.0 {
        return Ok(rng.gen_range(lo..=hi));
    }
    // The sampler's scale would overflow: sample the halved range and scale back.
    let half = rng.gen_range(lo / 2.0..=hi / 2.0);
    Ok((half * 2.0).clamp(lo, hi))
}

/// Random decimal with two fractional digits in `min..=max` (default `0..=10`).
#[cfg(feature = "decimal")]
pub fn decimal<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<rust_decimal::Decimal>,
    max: Option<rust_decimal::Decimal>,
) -> Result<rust_decimal::Decimal, GenerateError> {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;

    let default = (
        Decimal::from(DEFAULT_INT_RANGE.0),
        Decimal::from(DEFAULT_INT_RANGE.1),
    );
    let (lo, hi) = resolve_range(min, max, default)?;
    let hundred = Decimal::from(100);
    let lo_cents = (lo * hundred).ceil().to_i64().unwrap_or(i64::MIN);
    let hi_cents = (hi * hundred).floor().to_i64().unwrap_or(i64::MAX);
    if lo_cents > hi_cents {
        return Ok(lo);
    }
    Ok(Decimal::new(rng.gen_range(lo_cents..=hi_cents), 2))
}
