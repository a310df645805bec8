//! ECDH key agreement (SEC 1, section 3.3.1).
//!
//! The shared secret is the affine x-coordinate of the product of the
//! local private scalar and the remote public point, encoded over 32
//! bytes in big-endian (SEC 1, section 2.3.5). The remote point comes
//! from a validated `PublicKey`, so it is never the neutral and has
//! prime order; the product therefore cannot be the point-at-infinity
//! for a valid private key.
//!
//! The raw x-coordinate is returned; hashing it into actual key
//! material (X9.63 KDF, HKDF...) is the caller's business.

use crate::ecdsa::{PrivateKey, PublicKey};
use crate::Error;

impl PrivateKey {

    /// Computes the ECDH shared secret between this private key and the
    /// peer's public key, as the big-endian affine x-coordinate of the
    /// product point.
    ///
    /// This operation is constant-time with regard to the private key.
    pub fn ecdh(&self, remote: &PublicKey) -> Result<[u8; 32], Error> {
        let P = remote.point().mul(self.scalar());
        P.x_bytes().ok_or(Error::InvalidPoint)
    }
}

// ========================================================================

#[cfg(test)]
mod tests {

    use crate::ecdsa::PrivateKey;
    use sha2::{Sha256, Digest};

    fn keypair(tag: u64) -> PrivateKey {
        let mut sh = Sha256::new();
        sh.update(tag.to_le_bytes());
        let seed: [u8; 32] = sh.finalize().into();
        PrivateKey::from_seed(&seed)
    }

    #[test]
    fn agreement() {
        for i in 0..10u64 {
            let alice = keypair(2 * i);
            let bob = keypair(2 * i + 1);

            let k1 = alice.ecdh(bob.public_key()).unwrap();
            let k2 = bob.ecdh(alice.public_key()).unwrap();
            assert!(k1 == k2);

            // The secret is the x-coordinate of the combined product.
            let expect = bob.public_key().point().mul(alice.scalar())
                .x_bytes().unwrap();
            assert!(k1 == expect);

            // A third party lands elsewhere.
            let eve = keypair(10_000 + i);
            let k3 = eve.ecdh(bob.public_key()).unwrap();
            assert!(k1 != k3);
        }
    }
}
