use rand::Rng;

use super::resolve_range;
use crate::error::GenerateError;

/// Characters used for generated strings.
pub const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const LOWER_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Default inclusive length range of generated strings.
pub const DEFAULT_STRING_LEN: (usize, usize) = (8, 18);

const PHONE_DIGITS: usize = 10;

/// Random alphanumeric string with a length in `min_len..=max_len`
/// (default `8..=18`).
pub fn string<R: Rng + ?Sized>(
    rng: &mut R,
    min_len: Option<usize>,
    max_len: Option<usize>,
) -> Result<String, GenerateError> {
    let (lo, hi) = resolve_range(min_len, max_len, DEFAULT_STRING_LEN)?;
    let len = rng.gen_range(lo..=hi);
    Ok(pick_chars(rng, ALPHANUMERIC, len))
}

/// Random alphanumeric character.
pub fn character<R: Rng + ?Sized>(rng: &mut R) -> char {
    ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char
}

/// Email-shaped string: `local@domain.com`.
pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    let local_len = rng.gen_range(5..=10);
    let domain_len = rng.gen_range(5..=10);
    let local = pick_chars(rng, LOWER_ALPHA, local_len);
    let domain = pick_chars(rng, LOWER_ALPHA, domain_len);
    format!("{local}@{domain}.com")
}

/// HTTP URL-shaped string: `http://www.host.com`.
pub fn url<R: Rng + ?Sized>(rng: &mut R) -> String {
    let host_len = rng.gen_range(5..=12);
    let host = pick_chars(rng, LOWER_ALPHA, host_len);
    format!("http://www.{host}.com")
}

/// Digit-only string of `len` characters.
pub fn digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    pick_chars(rng, DIGITS, len)
}

fn pick_chars<R: Rng + ?Sized>(rng: &mut R, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Content shape of a string property, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringHint {
    #[default]
    Plain,
    Email,
    Url,
    /// Phone-like: digits only.
    Digits,
}

impl StringHint {
    pub fn from_property(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("email") {
            StringHint::Email
        } else if name.contains("url") || name.contains("website") {
            StringHint::Url
        } else if name.contains("phone")
            || name.contains("mobile")
            || name.contains("fax")
            || name.starts_with("tel")
        {
            StringHint::Digits
        } else {
            StringHint::Plain
        }
    }

    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R) -> String {
        match self {
            StringHint::Plain => {
                let (lo, hi) = DEFAULT_STRING_LEN;
                let len = rng.gen_range(lo..=hi);
                pick_chars(rng, ALPHANUMERIC, len)
            }
            StringHint::Email => email(rng),
            StringHint::Url => url(rng),
            StringHint::Digits => digits(rng, PHONE_DIGITS),
        }
    }
}
