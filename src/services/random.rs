use rand::{rngs::OsRng, RngCore};

/// Characters a random string is drawn from. The length is exactly 64 so a
/// random byte masked to six bits picks each one with equal probability.
const RANDOM_STRING_SOURCE: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Returns a string of `length` characters drawn independently from
/// [`RANDOM_STRING_SOURCE`] using the operating system's secure RNG.
///
/// `length` is unsigned, so negative lengths cannot be expressed; zero
/// yields an empty string.
pub fn random_string(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);

    bytes
        .into_iter()
        .map(|b| RANDOM_STRING_SOURCE[(b & 0x3f) as usize] as char)
        .collect()
}
