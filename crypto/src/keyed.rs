//! Keyed, variable-length hashing.
//!
//! The original implementation uses Skein-512 for this role (tunable output
//! length, optional key, used both as a plain hash and as a PRNG). No crate
//! in this workspace's dependency pool provides Skein; [`blake2`] is the
//! closest real substitute with the same three properties (keyed MAC mode,
//! configurable digest length, tree-hash-grade diffusion), so `Hash512` wraps
//! `Blake2b512` and `Hash512::keyed` wraps its keyed variant.
use blake2::digest::consts::U64;
use blake2::digest::{FixedOutput, KeyInit, Mac, Update};
use blake2::{Blake2bMac, Blake2b512, Digest as _};

use crate::Error;

/// Maximum output length, in bytes, supported by [`Hash512::keyed`].
pub const MAX_OUTPUT: usize = 64;

/// Unkeyed 512-bit hash over `data`.
///
/// Used for hashing emulated-memory rectangles (`(offset, length, rows,
/// stride)`) exposed to scripts via the memory-space bindings.
#[must_use]
pub fn hash(data: &[u8]) -> [u8; 64] {
    Blake2b512::digest(data).into()
}

/// Keyed hash over `data`, truncated (or, for inputs under 64 bytes,
/// naturally sized) to `out_len` bytes.
///
/// Used by the rerecord-data set to derive tokens from a running key, and by
/// the DH-25519 upload authenticator's PRNG.
///
/// # Errors
///
/// Returns [`Error::Length`] if `out_len` exceeds [`MAX_OUTPUT`].
pub fn keyed(key: &[u8], data: &[u8], out_len: usize) -> Result<Vec<u8>, Error> {
    if out_len > MAX_OUTPUT {
        return Err(Error::Length {
            expect: MAX_OUTPUT,
            got: out_len,
        });
    }
    let mut mac: Blake2bMac<U64> =
        Blake2bMac::new_from_slice(key).expect("blake2b accepts keys up to 64 bytes");
    Mac::update(&mut mac, data);
    let full = mac.finalize_fixed();
    Ok(full[..out_len].to_vec())
}

/// A small counter-mode PRNG built atop the keyed hash.
///
/// Mirrors the role of the Skein PRNG used by the DH-25519 HTTP
/// authenticator: seed once, then pull an arbitrary number of pseudorandom
/// bytes by hashing `(seed, counter)`.
#[derive(Clone, Debug)]
pub struct Prng {
    seed: Vec<u8>,
    counter: u64,
}

impl Prng {
    /// Constructs a `Prng` seeded with `seed`.
    #[must_use]
    pub fn new(seed: &[u8]) -> Self {
        Self {
            seed: seed.to_vec(),
            counter: 0,
        }
    }

    /// Draws the next 64 bytes of pseudorandom output.
    pub fn next_block(&mut self) -> [u8; 64] {
        let mut data = self.seed.clone();
        data.extend_from_slice(&self.counter.to_le_bytes());
        self.counter += 1;
        hash(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash(b"abc"), hash(b"abc"));
        assert_ne!(hash(b"abc"), hash(b"abd"));
    }

    #[test]
    fn keyed_respects_out_len() {
        let short = keyed(b"key", b"data", 16).unwrap();
        assert_eq!(short.len(), 16);
        let long = keyed(b"key", b"data", 64).unwrap();
        assert_eq!(long.len(), 64);
        assert_eq!(&long[..16], short.as_slice());
    }

    #[test]
    fn keyed_rejects_oversized_output() {
        assert!(matches!(
            keyed(b"key", b"data", 65),
            Err(Error::Length { expect: 64, got: 65 })
        ));
    }

    #[test]
    fn keyed_differs_by_key() {
        let a = keyed(b"key-a", b"data", 32).unwrap();
        let b = keyed(b"key-b", b"data", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn prng_advances_each_call() {
        let mut prng = Prng::new(b"seed");
        let a = prng.next_block();
        let b = prng.next_block();
        assert_ne!(a, b);
    }
}
