// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! X25519 Key Agreement
//!
//! Long-lived identity keypairs and the Curve25519 Diffie-Hellman agreement
//! that yields the per-peer shared secret. The same 32-byte secret comes out
//! on both sides, so either peer can derive it independently once public
//! keys have been exchanged in-band.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use super::SymmetricKey;

/// A long-lived X25519 identity keypair.
///
/// The private half never leaves this type except through
/// [`secret_bytes`](Self::secret_bytes) for persistence; `StaticSecret`
/// zeroizes itself on drop.
pub struct IdentityKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl IdentityKeyPair {
    /// Generates a new random keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        IdentityKeyPair { secret, public }
    }

    /// Restores a keypair from persisted secret bytes.
    pub fn from_bytes(secret_bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret_bytes);
        let public = PublicKey::from(&secret);
        IdentityKeyPair { secret, public }
    }

    /// Returns the public key bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Returns the secret key bytes for persistence.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Performs X25519 agreement with a peer's public key.
    ///
    /// Commutative: `a.agree(pub_b) == b.agree(pub_a)`.
    pub fn agree(&self, peer_public: &[u8; 32]) -> SymmetricKey {
        let peer = PublicKey::from(*peer_public);
        let shared = self.secret.diffie_hellman(&peer);
        SymmetricKey::from_bytes(shared.to_bytes())
    }
}
