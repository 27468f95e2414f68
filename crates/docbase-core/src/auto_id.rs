//! Random document identifiers.
//!
//! IDs are 20 characters drawn uniformly from a 62-character alphabet using
//! the operating system's CSPRNG, giving 62^20 (about 2^119) possible values.
//! Collisions are not ruled out; writes that must not clobber an existing
//! document carry a "must not exist" precondition.

use rand::Rng;
use rand::rngs::OsRng;

/// Length of a generated ID.
pub const AUTO_ID_LEN: usize = 20;

/// Characters a generated ID is drawn from.
pub const AUTO_ID_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a new document ID.
pub fn auto_id() -> String {
    let mut rng = OsRng;
    (0..AUTO_ID_LEN)
        .map(|_| AUTO_ID_ALPHABET[rng.gen_range(0..AUTO_ID_ALPHABET.len())] as char)
        .collect()
}
