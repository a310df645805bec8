//! Nonce derivation.
//!
//! There are documented attacks that can exploit even the most subtle
//! amounts of bias (under one bit) in the generation of signature
//! nonces, and a long history of deployed systems whose random source
//! turned out to be constant or low-entropy. RFC 6979 addresses this
//! with a fully deterministic HMAC-DRBG construction; the scheme here
//! goes one step further and mixes the private key, 256 bits of caller
//! entropy, and the message digest into a keyed cSHAKE-256 stream. If
//! the entropy source is broken, signing degrades to a deterministic
//! (but still safe) scheme; the private key never leaks.
//!
//! The cSHAKE customization string carries a per-protocol context so
//! that a key shared between ECDSA and BIP-0340 signing never reuses a
//! nonce stream across the two schemes.

use sha3::{CShake256, CShake256Core, CShake256Reader};
use sha3::digest::{Update, ExtendableOutput, XofReader};

use crate::{CryptoRng, RngCore};
use crate::field::Scalar;
use crate::point::bswap32;
use crate::Error;

/// Context string for ECDSA signing.
pub(crate) const CONTEXT_ECDSA: &str = "ECDSA-Sign";

/// Context string for BIP-0340 Schnorr signing.
pub(crate) const CONTEXT_SCHNORR: &str = "BIP0340-Sign";

// Customization string prefix; the context is appended to it.
const CUSTOM_PREFIX: &str = "Honorary Debian/Sony RNG mitigation:";

// Entropy drawn from the caller's source per signature.
const ENTROPY_LEN: usize = 32;

// Candidate draws before rejection sampling reports a broken source.
const MAX_SCALAR_SAMPLES: usize = 8;

/// Builds the nonce stream for one signing operation: 32 bytes are read
/// from the provided random source, then absorbed into a cSHAKE-256
/// instance together with the private scalar encoding and the message
/// digest.
pub(crate) fn nonce_stream<T: CryptoRng + RngCore>(rng: &mut T,
    ctx: &str, sk: &[u8; 32], h: &[u8]) -> Result<CShake256Reader, Error>
{
    let mut entropy = [0u8; ENTROPY_LEN];
    rng.try_fill_bytes(&mut entropy).map_err(|_| Error::EntropySource)?;

    let mut custom = [0u8; 64];
    let cp = CUSTOM_PREFIX.as_bytes();
    custom[..cp.len()].copy_from_slice(cp);
    custom[cp.len()..cp.len() + ctx.len()].copy_from_slice(ctx.as_bytes());

    let mut xof = CShake256::from_core(
        CShake256Core::new(&custom[..cp.len() + ctx.len()]));
    xof.update(sk);
    xof.update(&entropy);
    xof.update(h);
    Ok(xof.finalize_xof())
}

/// Samples a canonical non-zero scalar from the nonce stream by
/// rejection: each 32-byte block is interpreted as a big-endian integer
/// and accepted if it falls in [1, n). The odds of a single rejection
/// are about 3.73*10^-39, so more than one draw essentially never
/// happens with a functional stream; after 8 failed draws the stream is
/// declared broken.
pub(crate) fn sample_scalar_xof(rd: &mut CShake256Reader)
    -> Result<Scalar, Error>
{
    let mut tmp = [0u8; 32];
    for _ in 0..MAX_SCALAR_SAMPLES {
        rd.read(&mut tmp);
        let (s, cc) = Scalar::decode32(&bswap32(&tmp));
        if (cc & !s.iszero()) != 0 {
            return Ok(s);
        }
    }
    Err(Error::RejectionSampling)
}

/// Samples a canonical non-zero scalar directly from a random source
/// (same rejection rule and bound as `sample_scalar_xof()`); used for
/// key generation.
pub(crate) fn sample_scalar_rng<T: CryptoRng + RngCore>(rng: &mut T)
    -> Result<Scalar, Error>
{
    let mut tmp = [0u8; 32];
    for _ in 0..MAX_SCALAR_SAMPLES {
        rng.try_fill_bytes(&mut tmp).map_err(|_| Error::EntropySource)?;
        let (s, cc) = Scalar::decode32(&bswap32(&tmp));
        if (cc & !s.iszero()) != 0 {
            return Ok(s);
        }
    }
    Err(Error::RejectionSampling)
}

// ========================================================================

#[cfg(test)]
pub(crate) mod tests {

    use super::*;
    use rand_core::impls;

    /// A "random" source that returns only zero bytes; stands in for a
    /// fully compromised system RNG.
    pub(crate) struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 { 0 }
        fn next_u64(&mut self) -> u64 { 0 }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest.iter_mut() {
                *b = 0;
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8])
            -> Result<(), rand_core::Error>
        {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    /// A source whose reads always fail.
    pub(crate) struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            impls::next_u32_via_fill(self)
        }
        fn next_u64(&mut self) -> u64 {
            impls::next_u64_via_fill(self)
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest).unwrap()
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8])
            -> Result<(), rand_core::Error>
        {
            Err(rand_core::Error::new("entropy source is down"))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn stream_determinism() {
        let sk = [0x42u8; 32];
        let h1 = [1u8; 32];
        let h2 = [2u8; 32];

        // With a constant RNG the stream is deterministic for fixed
        // inputs...
        let mut rd_a = nonce_stream(&mut ZeroRng, CONTEXT_ECDSA,
            &sk, &h1).unwrap();
        let mut rd_b = nonce_stream(&mut ZeroRng, CONTEXT_ECDSA,
            &sk, &h1).unwrap();
        let ka = sample_scalar_xof(&mut rd_a).unwrap();
        let kb = sample_scalar_xof(&mut rd_b).unwrap();
        assert!(ka.equals(kb) == 0xFFFFFFFF);

        // ... but changes with the message ...
        let mut rd_c = nonce_stream(&mut ZeroRng, CONTEXT_ECDSA,
            &sk, &h2).unwrap();
        let kc = sample_scalar_xof(&mut rd_c).unwrap();
        assert!(ka.equals(kc) == 0);

        // ... with the key ...
        let sk2 = [0x43u8; 32];
        let mut rd_d = nonce_stream(&mut ZeroRng, CONTEXT_ECDSA,
            &sk2, &h1).unwrap();
        let kd = sample_scalar_xof(&mut rd_d).unwrap();
        assert!(ka.equals(kd) == 0);

        // ... and with the protocol context.
        let mut rd_e = nonce_stream(&mut ZeroRng, CONTEXT_SCHNORR,
            &sk, &h1).unwrap();
        let ke = sample_scalar_xof(&mut rd_e).unwrap();
        assert!(ka.equals(ke) == 0);
    }

    #[test]
    fn entropy_failure() {
        let sk = [0x42u8; 32];
        let h = [1u8; 32];
        assert!(matches!(
            nonce_stream(&mut FailingRng, CONTEXT_ECDSA, &sk, &h),
            Err(Error::EntropySource)));
    }
}
