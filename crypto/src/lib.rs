//! Hashing, key agreement, and secure wiping.
//!
//! These primitives exist in the core (rather than being delegated to a
//! peripheral upload module) because the [movie container][crate::keyed]'s
//! project identifier is randomness-seeded, rerecord tokens are randomness
//! seeded, and ROM/region hashing needs a fast, well-tested digest.
//!
//! # Usage
//!
//! ```
//! use tascore_crypto::sha256;
//!
//! let digest = sha256(b"hello, world");
//! assert_eq!(digest.len(), 32);
//! ```

#![warn(clippy::pedantic)]

use std::ptr;
use std::sync::atomic::{compiler_fence, Ordering};

use rand::RngCore;
use sha2::Digest as _;
use thiserror::Error;

pub mod curve25519;
pub mod keyed;

/// An error caused by a crypto operation.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// A key or digest was the wrong length for the operation.
    #[error("expected {expect} bytes, got {got}")]
    Length {
        /// Expected byte length.
        expect: usize,
        /// Actual byte length provided.
        got: usize,
    },
}

/// Hashes `data` with SHA-256.
///
/// Used for ROM/region integrity hashes (`romimg_sha256`, `romxml_sha256`).
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha2::Sha256::digest(data).into()
}

/// Fills `buf` with cryptographically random bytes.
///
/// Backs the movie `projectid` (160 bits of hex-encoded randomness) and
/// rerecord-set token generation.
pub fn fill_random(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Overwrites `buf` with zeroes in a way the optimizer cannot elide.
///
/// Equivalent to the "volatile-write memset" pattern: the original codebase
/// relies on this so that sensitive key material (the upload DH key, movie
/// anchor savestate scratch buffers) does not linger in memory after use.
pub fn wipe(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned `&mut u8` for the duration of
        // the write; `write_volatile` simply forbids the optimizer from
        // eliding or reordering it.
        unsafe { ptr::write_volatile(byte, 0) };
    }
    compiler_fence(Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        // NIST test vector for the empty string.
        let digest = sha256(b"");
        assert_eq!(
            hex(&digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn wipe_clears_buffer() {
        let mut buf = [0xAAu8; 32];
        wipe(&mut buf);
        assert_eq!(buf, [0u8; 32]);
    }

    #[test]
    fn fill_random_is_not_constant() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        fill_random(&mut a);
        fill_random(&mut b);
        assert_ne!(a, b, "two random fills collided; RNG is broken");
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
