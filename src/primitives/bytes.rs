use rand::Rng;

use super::resolve_range;
use crate::error::GenerateError;

/// Default inclusive length range of byte buffers.
pub const DEFAULT_BYTES_LEN: (usize, usize) = (8, 18);

/// Random byte buffer with a length in `min_len..=max_len`.
pub fn bytes<R: Rng + ?Sized>(
    rng: &mut R,
    min_len: Option<usize>,
    max_len: Option<usize>,
) -> Result<Vec<u8>, GenerateError> {
    let (lo, hi) = resolve_range(min_len, max_len, DEFAULT_BYTES_LEN)?;
    let len = rng.gen_range(lo..=hi);
    Ok((0..len).map(|_| rng.gen()).collect())
}
