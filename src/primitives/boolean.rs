use rand::Rng;

/// Roughly fair coin flip: a random integer in `1..=100` below 50.
pub fn boolean<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_range(1..=100) < 50
}

/// Whether a boolean property named `property` is always `true`.
pub fn is_always_true(property: &str) -> bool {
    property.eq_ignore_ascii_case("enabled")
}

/// Boolean for a named property; see [`is_always_true`].
pub fn boolean_for<R: Rng + ?Sized>(rng: &mut R, property: &str) -> bool {
    is_always_true(property) || boolean(rng)
}
