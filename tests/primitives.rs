use fixtura::primitives::{self, StringHint};
use fixtura::reflect::Primitive;
use fixtura::{GenerateError, Reflect, TypeInfo};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

#[derive(Debug, PartialEq, serde::Deserialize)]
enum Color {
    Red,
    Green,
    Blue,
}

impl Reflect for Color {
    fn type_info() -> TypeInfo {
        TypeInfo::enumeration::<Self>(module_path!(), &["Red", "Green", "Blue"])
    }
}

// === Numbers ===

#[test]
fn int_defaults_to_zero_through_ten() {
    let mut rng = rng();
    for _ in 0..500 {
        let n = primitives::int(&mut rng, None, None).unwrap();
        assert!((0..=10).contains(&n));
    }
}

#[test]
fn int_bounds_are_inclusive() {
    let mut rng = rng();
    let mut seen = [false; 3];
    for _ in 0..300 {
        let n = primitives::int(&mut rng, Some(5), Some(7)).unwrap();
        seen[(n - 5) as usize] = true;
    }
    assert_eq!(seen, [true, true, true]);
}

#[test]
fn single_value_range() {
    let mut rng = rng();
    assert_eq!(primitives::long(&mut rng, Some(3), Some(3)).unwrap(), 3);
    assert_eq!(primitives::double(&mut rng, Some(1.5), Some(1.5)).unwrap(), 1.5);
}

#[test]
fn lone_min_above_default_collapses() {
    let mut rng = rng();
    assert_eq!(primitives::int(&mut rng, Some(50), None).unwrap(), 50);
    let n = primitives::int(&mut rng, Some(4), None).unwrap();
    assert!((4..=10).contains(&n));
}

#[test]
fn inverted_range_is_rejected() {
    let mut rng = rng();
    let err = primitives::int(&mut rng, Some(9), Some(2)).unwrap_err();
    assert_eq!(
        err,
        GenerateError::InvalidRange {
            min: "9".into(),
            max: "2".into()
        }
    );
    assert!(primitives::unsigned(&mut rng, Some(5), Some(1)).is_err());
}

#[test]
fn integer_respects_type_bounds() {
    let mut rng = rng();
    for _ in 0..200 {
        let n = primitives::integer(&mut rng, Primitive::I8, Some(-1000), Some(1000)).unwrap();
        assert!((i8::MIN as i128..=i8::MAX as i128).contains(&n));
    }
    assert!(primitives::integer(&mut rng, Primitive::U8, Some(300), Some(400)).is_err());
}

#[test]
fn wide_integer_is_positive_and_fits() {
    let mut rng = rng();
    for _ in 0..200 {
        let n = primitives::wide_integer(&mut rng, Primitive::U8);
        assert!((1..=255).contains(&n));
        let m = primitives::wide_integer(&mut rng, Primitive::I64);
        assert!((1..=i32::MAX as i128).contains(&m));
    }
}

#[test]
fn double_spans_the_whole_f64_domain() {
    let mut rng = rng();
    for _ in 0..200 {
        let d = primitives::double(&mut rng, Some(f64::MIN), Some(f64::MAX)).unwrap();
        assert!(d.is_finite());
    }
    let d = primitives::double(&mut rng, Some(-f64::MAX), Some(0.0)).unwrap();
    assert!(d <= 0.0);
}

#[test]
fn double_rejects_non_finite_bounds() {
    let mut rng = rng();
    for (min, max) in [
        (Some(f64::NAN), Some(1.0)),
        (Some(0.0), Some(f64::NAN)),
        (Some(f64::NEG_INFINITY), Some(0.0)),
        (None, Some(f64::INFINITY)),
    ] {
        let err = primitives::double(&mut rng, min, max).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRange { .. }), "{min:?}..{max:?}");
    }
}

#[test]
fn double_defaults() {
    let mut rng = rng();
    for _ in 0..200 {
        let d = primitives::double(&mut rng, None, None).unwrap();
        assert!((0.0..=10.0).contains(&d));
    }
}

// === Booleans ===

#[test]
fn boolean_produces_both_values() {
    let mut rng = rng();
    let trues = (0..1000).filter(|_| primitives::boolean(&mut rng)).count();
    // `1..=100 < 50` is true 49% of the time.
    assert!((400..600).contains(&trues), "trues = {trues}");
}

#[test]
fn enabled_is_always_true() {
    let mut rng = rng();
    for _ in 0..100 {
        assert!(primitives::boolean_for(&mut rng, "enabled"));
        assert!(primitives::boolean_for(&mut rng, "Enabled"));
    }
    assert!(primitives::is_always_true("ENABLED"));
    assert!(!primitives::is_always_true("active"));
    assert!(!primitives::is_always_true("enabled_at"));
}

// === Strings ===

#[test]
fn string_default_length_and_charset() {
    let mut rng = rng();
    for _ in 0..200 {
        let s = primitives::string(&mut rng, None, None).unwrap();
        assert!((8..=18).contains(&s.len()), "{s}");
        assert!(s.bytes().all(|b| primitives::ALPHANUMERIC.contains(&b)));
    }
}

#[test]
fn string_custom_length() {
    let mut rng = rng();
    let s = primitives::string(&mut rng, Some(2), Some(2)).unwrap();
    assert_eq!(s.len(), 2);
    let empty = primitives::string(&mut rng, Some(0), Some(0)).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn shaped_strings() {
    let mut rng = rng();
    let email = primitives::email(&mut rng);
    let (local, domain) = email.split_once('@').unwrap();
    assert!(!local.is_empty());
    assert!(domain.ends_with(".com"));

    let url = primitives::url(&mut rng);
    assert!(url.starts_with("http://www."));

    let digits = primitives::digits(&mut rng, 10);
    assert_eq!(digits.len(), 10);
    assert!(digits.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn string_hints_from_property_names() {
    assert_eq!(StringHint::from_property("Email"), StringHint::Email);
    assert_eq!(StringHint::from_property("contact_email"), StringHint::Email);
    assert_eq!(StringHint::from_property("avatarUrl"), StringHint::Url);
    assert_eq!(StringHint::from_property("website"), StringHint::Url);
    assert_eq!(StringHint::from_property("mobile_phone"), StringHint::Digits);
    assert_eq!(StringHint::from_property("fax"), StringHint::Digits);
    assert_eq!(StringHint::from_property("telephone"), StringHint::Digits);
    assert_eq!(StringHint::from_property("hotel"), StringHint::Plain);
    assert_eq!(StringHint::from_property("name"), StringHint::Plain);
}

// === Bytes ===

#[test]
fn bytes_default_length() {
    let mut rng = rng();
    for _ in 0..100 {
        let b = primitives::bytes(&mut rng, None, None).unwrap();
        assert!((8..=18).contains(&b.len()));
    }
}

// === Enums ===

#[test]
fn enum_member_picks_declared_variant() {
    let mut rng = rng();
    let info = Color::type_info();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
        seen.insert(primitives::enum_member(&mut rng, &info).unwrap());
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn random_enum_deserializes() {
    let mut rng = rng();
    let color: Color = primitives::random_enum(&mut rng).unwrap();
    assert!(matches!(color, Color::Red | Color::Green | Color::Blue));
}

#[test]
fn enum_generation_rejects_non_enums() {
    let mut rng = rng();
    let err = primitives::enum_member(&mut rng, &String::type_info()).unwrap_err();
    assert!(matches!(err, GenerateError::NotAnEnum { .. }));
    assert!(err.to_string().contains("String"));
}

// === Dates ===

#[cfg(feature = "chrono")]
mod dates {
    use chrono::{Months, NaiveDate, Utc};
    use fixtura::primitives;

    use super::rng;

    #[test]
    fn date_defaults_to_last_thirty_years() {
        let mut rng = rng();
        let today = Utc::now().date_naive();
        let floor = today.checked_sub_months(Months::new(360)).unwrap();
        for _ in 0..200 {
            let d = primitives::date(&mut rng, None, None).unwrap();
            assert!(d >= floor && d <= today, "{d}");
        }
    }

    #[test]
    fn date_window_after_min() {
        let mut rng = rng();
        let min = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let hi = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        for _ in 0..200 {
            let d = primitives::date(&mut rng, Some(min), None).unwrap();
            assert!(d >= min && d <= hi, "{d}");
        }
    }

    #[test]
    fn date_never_precedes_safe_floor() {
        let mut rng = rng();
        let max = NaiveDate::from_ymd_opt(1760, 6, 1).unwrap();
        for _ in 0..200 {
            let d = primitives::date(&mut rng, None, Some(max)).unwrap();
            assert!(d >= primitives::safe_floor(), "{d}");
            assert!(d <= max);
        }
    }

    #[test]
    fn date_time_is_bounded() {
        let mut rng = rng();
        let lo = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let hi = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let t = primitives::naive_date_time(&mut rng, Some(lo), Some(hi)).unwrap();
        assert!(t >= lo && t <= hi);
        assert!(primitives::naive_date_time(&mut rng, Some(hi), Some(lo)).is_err());
    }
}

// === JSON values ===

#[test]
fn value_for_matches_primitive_shape() {
    let mut rng = rng();
    assert!(matches!(
        primitives::value_for(&mut rng, Primitive::Bool, StringHint::Plain).unwrap(),
        Value::Bool(_)
    ));
    let n = primitives::value_for(&mut rng, Primitive::U16, StringHint::Plain).unwrap();
    assert!(n.as_u64().unwrap() <= 10);
    let s = primitives::value_for(&mut rng, Primitive::String, StringHint::Email).unwrap();
    assert!(s.as_str().unwrap().contains('@'));
    let c = primitives::value_for(&mut rng, Primitive::Char, StringHint::Plain).unwrap();
    let c: char = serde_json::from_value(c).unwrap();
    assert!(c.is_ascii_alphanumeric());
    let bytes = primitives::value_for(&mut rng, Primitive::Bytes, StringHint::Plain).unwrap();
    let bytes: Vec<u8> = serde_json::from_value(bytes).unwrap();
    assert!(bytes.len() >= 8);
}

// === Properties ===

proptest! {
    #[test]
    fn int_stays_in_requested_range(lo in -1000i32..1000, span in 0i32..1000, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let hi = lo + span;
        let n = primitives::int(&mut rng, Some(lo), Some(hi)).unwrap();
        prop_assert!(n >= lo && n <= hi);
    }

    #[test]
    fn string_length_in_range(min in 0usize..40, extra in 0usize..40, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let s = primitives::string(&mut rng, Some(min), Some(min + extra)).unwrap();
        prop_assert!(s.len() >= min && s.len() <= min + extra);
    }

    #[test]
    fn double_never_panics(lo in any::<f64>(), hi in any::<f64>(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = primitives::double(&mut rng, Some(lo), Some(hi));
        if lo.is_finite() && hi.is_finite() && lo <= hi {
            let d = result.unwrap();
            prop_assert!(d >= lo && d <= hi);
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn integer_never_leaves_type_bounds(lo in any::<i64>(), hi in any::<i64>(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        if let Ok(n) = primitives::integer(&mut rng, Primitive::I16, Some(lo as i128), Some(hi as i128)) {
            prop_assert!(n >= i16::MIN as i128 && n <= i16::MAX as i128);
            prop_assert!(n >= lo as i128 && n <= hi as i128);
        }
    }
}
