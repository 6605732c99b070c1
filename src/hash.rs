//! Stable bucket hashing.
//!
//! 32-bit FNV-1a over a string's UTF-16 code units. The constants and
//! operator order are fixed: any deployment sharing a seed assigns the same
//! bucket to the same input, across processes, restarts, and reimplementations
//! in other languages.

use crate::error::{FlagError, FlagResult};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Raw 32-bit FNV-1a hash of `input`.
///
/// Hashes one UTF-16 code unit at a time; characters outside the BMP
/// contribute their two surrogate code units separately.
pub(crate) fn fnv1a_32(input: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for unit in input.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Map `input` to a deterministic bucket in `[0, max)`.
///
/// # Errors
///
/// Returns [`FlagError::InvalidArgument`] if `max` is zero.
///
/// # Examples
///
/// ```
/// let bucket = vexil::bucket("seed:my-flag:user-42", 100).unwrap();
/// assert!(bucket < 100);
/// assert_eq!(bucket, vexil::bucket("seed:my-flag:user-42", 100).unwrap());
/// ```
pub fn bucket(input: &str, max: u32) -> FlagResult<u32> {
    if max == 0 {
        return Err(FlagError::InvalidArgument(
            "bucket max must be a positive integer".to_string(),
        ));
    }
    Ok(fnv1a_32(input) % max)
}
