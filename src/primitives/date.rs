use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;

use crate::error::GenerateError;

/// Width of the default window anchored at a supplied bound (30 years).
pub const DEFAULT_DATE_SPAN_MONTHS: u32 = 30 * 12;

/// The earliest date ever generated, 1753-01-01.
pub fn safe_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1753, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn span() -> Months {
    Months::new(DEFAULT_DATE_SPAN_MONTHS)
}

/// Random date in `min..=max`.
///
/// With only `min`, the window is `min..=min + 30y`; with only `max`, it is
/// `max - 30y..=max`; with neither, the last 30 years. The lower end never
/// precedes [`safe_floor`].
pub fn date<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
) -> Result<NaiveDate, GenerateError> {
    let (lo, hi) = date_window(min, max, Utc::now().date_naive())?;
    let days = (hi - lo).num_days();
    Ok(lo + Duration::days(rng.gen_range(0..=days)))
}

/// Random naive timestamp with second precision; windows as in [`date`].
pub fn naive_date_time<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<NaiveDateTime>,
    max: Option<NaiveDateTime>,
) -> Result<NaiveDateTime, GenerateError> {
    let floor = safe_floor().and_hms_opt(0, 0, 0).unwrap_or(NaiveDateTime::MIN);
    let (lo, hi) = match (min, max) {
        (None, None) => {
            let hi = Utc::now().naive_utc();
            (hi.checked_sub_months(span()).unwrap_or(floor), hi)
        }
        (Some(lo), None) => (lo, lo.checked_add_months(span()).unwrap_or(NaiveDateTime::MAX)),
        (None, Some(hi)) => (hi.checked_sub_months(span()).unwrap_or(floor), hi),
        (Some(lo), Some(hi)) => (lo, hi),
    };
    let lo = lo.max(floor);
    if lo > hi {
        return Err(GenerateError::InvalidRange {
            min: lo.to_string(),
            max: hi.to_string(),
        });
    }
    let seconds = (hi - lo).num_seconds();
    Ok(lo + Duration::seconds(rng.gen_range(0..=seconds)))
}

/// Random UTC timestamp with second precision; windows as in [`date`].
pub fn date_time<R: Rng + ?Sized>(
    rng: &mut R,
    min: Option<DateTime<Utc>>,
    max: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, GenerateError> {
    let naive = naive_date_time(
        rng,
        min.map(|d| d.naive_utc()),
        max.map(|d| d.naive_utc()),
    )?;
    Ok(naive.and_utc())
}

fn date_window(
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), GenerateError> {
    let floor = safe_floor();
    let (lo, hi) = match (min, max) {
        (None, None) => (today.checked_sub_months(span()).unwrap_or(floor), today),
        (Some(lo), None) => (lo, lo.checked_add_months(span()).unwrap_or(NaiveDate::MAX)),
        (None, Some(hi)) => (hi.checked_sub_months(span()).unwrap_or(floor), hi),
        (Some(lo), Some(hi)) => (lo, hi),
    };
    let lo = lo.max(floor);
    if lo > hi {
        return Err(GenerateError::InvalidRange {
            min: lo.to_string(),
            max: hi.to_string(),
        });
    }
    Ok((lo, hi))
}
