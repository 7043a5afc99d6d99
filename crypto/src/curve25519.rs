//! Curve25519 scalar multiplication with the standard clamp.
//!
//! Used for the DH-25519 key agreement behind upload authentication (§6):
//! the client holds a long-term `(privkey, pubkey)` pair, and derives a
//! shared secret from the server's per-request challenge.

use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;

/// A 32-byte Curve25519 scalar (private key), pre-clamped on construction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Clamps raw bytes into a valid Curve25519 scalar, per RFC 7748 §5.
    #[must_use]
    pub fn clamp(mut bytes: [u8; 32]) -> Self {
        bytes[0] &= 248;
        bytes[31] &= 127;
        bytes[31] |= 64;
        Self(bytes)
    }

    /// Derives the corresponding public key (`scalar * basepoint`).
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        let scalar = Scalar::from_bytes_mod_order(self.0);
        let point = MontgomeryPoint::mul_base(&scalar);
        PublicKey(point.to_bytes())
    }

    /// Performs the Diffie-Hellman scalar multiplication against `their`.
    #[must_use]
    pub fn agree(&self, their: &PublicKey) -> SharedSecret {
        let scalar = Scalar::from_bytes_mod_order(self.0);
        let point = MontgomeryPoint(their.0);
        SharedSecret((scalar * point).to_bytes())
    }
}

/// A 32-byte Curve25519 public key (Montgomery u-coordinate).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wraps a raw 32-byte Montgomery u-coordinate.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte encoding.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

/// A 32-byte shared secret resulting from [`PrivateKey::agree`].
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Returns the raw 32-byte encoding.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        crate::wipe(&mut self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_sets_required_bits() {
        let key = PrivateKey::clamp([0xFF; 32]);
        assert_eq!(key.0[0] & 0x07, 0);
        assert_eq!(key.0[31] & 0x80, 0);
        assert_eq!(key.0[31] & 0x40, 0x40);
    }

    #[test]
    fn dh_agreement_is_symmetric() {
        let alice = PrivateKey::clamp([1u8; 32]);
        let bob = PrivateKey::clamp([2u8; 32]);

        let alice_pub = alice.public_key();
        let bob_pub = bob.public_key();

        let shared_a = alice.agree(&bob_pub);
        let shared_b = bob.agree(&alice_pub);

        assert_eq!(shared_a.to_bytes(), shared_b.to_bytes());
    }

    #[test]
    fn different_peers_yield_different_secrets() {
        let alice = PrivateKey::clamp([3u8; 32]);
        let bob = PrivateKey::clamp([4u8; 32]);
        let carol = PrivateKey::clamp([5u8; 32]);

        let shared_ab = alice.agree(&bob.public_key());
        let shared_ac = alice.agree(&carol.public_key());
        assert_ne!(shared_ab.to_bytes(), shared_ac.to_bytes());
    }
}
