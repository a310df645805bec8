//! ECDSA signatures over secp256k1.
//!
//! The `PrivateKey` structure wraps the secret scalar, together with the
//! derived `PublicKey` (and the BIP-0340 public key used by the
//! `schnorr` module); derivation happens once, at key construction.
//! Private keys encode to exactly 32 bytes (unsigned big-endian, as per
//! SEC 1), and can be built from an encoding, from a random source, or
//! from a seed.
//!
//! Signing follows SEC 1, section 4.1.3, on a pre-hashed message. The
//! nonce is obtained from the cSHAKE-256 stream of the `nonce` module,
//! so a compromised random source degrades signing to a deterministic
//! scheme without endangering the key. Produced signatures are always in
//! low-s form (`s <= n/2`), and come with a recovery identifier: bit 0
//! is the parity of the ephemeral y-coordinate, bit 1 tells whether the
//! ephemeral x-coordinate had been reduced modulo n. No constant (27,
//! 31, EIP-155...) is ever added to that identifier; such conventions
//! belong to the caller.
//!
//! Verification follows SEC 1, section 4.1.4, and accepts any `s` in
//! [1, n); the BIP-0066 variant additionally runs the strict
//! signature-encoding check (with the trailing sighash byte) and
//! rejects `s > n/2`. Public keys can be recovered from a signature and
//! its recovery identifier.

use crate::{CryptoRng, OsRng, RngCore};
use crate::asn1;
use crate::field::Scalar;
use crate::nonce;
use crate::point::{Point, bswap32};
use crate::schnorr::SchnorrPublicKey;
use crate::Error;
use sha2::{Sha512, Digest};

/// A secp256k1 private key, with its derived public keys.
#[derive(Clone, Copy, Debug)]
pub struct PrivateKey {
    x: Scalar,   // secret scalar; always in [1, n)
    pk: PublicKey,
    spk: SchnorrPublicKey,
}

/// A secp256k1 public key: a non-neutral curve point.
#[derive(Clone, Copy, Debug)]
pub struct PublicKey {
    point: Point,
    enc: [u8; 65],   // cached uncompressed SEC 1 encoding
}

/// An ECDSA signature: the two scalars `(r, s)`, both in [1, n).
#[derive(Clone, Copy, Debug)]
pub struct Signature {
    pub r: Scalar,
    pub s: Scalar,
}

impl PrivateKey {

    /// Generates a new private key from a cryptographically secure
    /// random source, by rejection sampling.
    pub fn generate<T: CryptoRng + RngCore>(rng: &mut T)
        -> Result<Self, Error>
    {
        let x = nonce::sample_scalar_rng(rng)?;
        Ok(Self::from_scalar(x))
    }

    /// Instantiates a private key by decoding the provided 32-byte
    /// array.
    ///
    /// The 32 bytes contain the unsigned big-endian encoding of the
    /// secret scalar (as per SEC 1 and RFC 5915). The decoding fails if
    /// the source slice does not have length exactly 32 bytes, if the
    /// scalar is not lower than the curve order, or if it is zero.
    ///
    /// Decoding is constant-time; side channels may leak whether the
    /// value was valid or not, but not the value itself (nor why it was
    /// deemed invalid, if decoding failed).
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != 32 {
            return Err(Error::InvalidScalar);
        }
        let (x, r) = Scalar::decode32(&bswap32(buf));
        if (r & !x.iszero()) == 0 {
            return Err(Error::InvalidScalar);
        }
        Ok(Self::from_scalar(x))
    }

    /// Encodes this private key into exactly 32 bytes (unsigned
    /// big-endian, as per SEC 1 and RFC 5915).
    pub fn encode(&self) -> [u8; 32] {
        bswap32(&self.x.encode32())
    }

    /// Instantiates a private key from a random seed.
    ///
    /// The seed MUST have been generated from a cryptographically secure
    /// random source that ensured an entropy of at least 128 bits. The
    /// transform from the seed to the private key is not described by
    /// any standard; therefore, for key storage, the private key itself
    /// should be stored, not the seed.
    ///
    /// This process guarantees that the output key is valid (i.e. it is
    /// in the proper range, and it is non-zero).
    pub fn from_seed(seed: &[u8]) -> Self {
        // SHA-512 over a domain prefix and the seed yields a
        // pseudo-random 512-bit value, reduced modulo the curve order.
        let mut sh = Sha512::new();
        sh.update(b"secp256k1-ct keygen");
        sh.update(seed);
        let mut x = Scalar::decode_reduce(&sh.finalize());

        // We make sure we do not get zero by replacing the value with 1
        // in that case. The probability that such a thing happens is
        // negligible.
        x.set_cond(&Scalar::ONE, x.iszero());
        Self::from_scalar(x)
    }

    // Builds the key record from a non-zero scalar, deriving the public
    // keys.
    fn from_scalar(x: Scalar) -> Self {
        let pk = PublicKey::from_point_unchecked(Point::mulgen(&x));
        let spk = SchnorrPublicKey::from_ecdsa_public_key(&pk);
        Self { x, pk, spk }
    }

    /// Gets the public key corresponding to this private key.
    #[inline(always)]
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Gets the BIP-0340 public key corresponding to this private key.
    #[inline(always)]
    pub fn schnorr_public_key(&self) -> &SchnorrPublicKey {
        &self.spk
    }

    /// Compares two private keys (constant-time); returned value is
    /// 0xFFFFFFFF on equality, 0 otherwise.
    pub fn equals(&self, other: &Self) -> u32 {
        self.x.equals(other.x)
    }

    // The secret scalar, for the signing code of the schnorr module.
    #[inline(always)]
    pub(crate) fn scalar(&self) -> &Scalar {
        &self.x
    }

    /// Signs a pre-hashed message with ECDSA, drawing entropy from the
    /// operating system source.
    ///
    /// The hash value `hv` must be a real hash output of at least 16
    /// bytes (values longer than 32 bytes are truncated to their
    /// leftmost 32 bytes, shorter ones are treated as left-padded with
    /// zeros). Returned values are the signature (always in low-s form)
    /// and the recovery identifier, in the 0 to 3 range.
    pub fn sign_hash(&self, hv: &[u8]) -> Result<(Signature, u8), Error> {
        self.sign_hash_with_rng(&mut OsRng, hv)
    }

    /// Signs a pre-hashed message with ECDSA, drawing entropy from the
    /// provided random source (see `sign_hash()`).
    ///
    /// The entropy is only used to seed the nonce-derivation stream: a
    /// weak or constant source makes signatures deterministic but does
    /// not endanger the private key.
    pub fn sign_hash_with_rng<T: CryptoRng + RngCore>(&self, rng: &mut T,
        hv: &[u8]) -> Result<(Signature, u8), Error>
    {
        // The challenge only depends on the message; compute it before
        // the sampling loop.
        let e = hash_to_scalar(hv)?;

        let mut xof = nonce::nonce_stream(rng,
            nonce::CONTEXT_ECDSA, &self.encode(), hv)?;

        loop {
            // Ephemeral key pair (k, R = k*G).
            let k = nonce::sample_scalar_xof(&mut xof)?;
            let R = Point::mulgen(&k);
            let (xr, yr, _) = R.to_affine();

            // r = x(R) mod n; the reduction bit feeds the recovery
            // identifier.
            let (r, dr) = Scalar::decode32_reduce(&xr.encode());
            if r.iszero() != 0 {
                // Infeasible to reach; nobody knows an input mapping to
                // r = 0.
                continue;
            }

            // s = (e + r*x) / k mod n.
            let s = (e + r * self.x) * k.invert();
            if s.iszero() != 0 {
                continue;
            }

            let mut recid = (((dr & 1) << 1) | (yr.isodd() & 1)) as u8;

            // (r, -s) is an equivalent signature; always emit the low-s
            // form, and flip the parity bit accordingly.
            let neg = s.is_greater_than_half_n();
            let mut s = s;
            s.set_condneg(neg);
            recid ^= (neg & 1) as u8;

            return Ok((Signature { r, s }, recid));
        }
    }
}

impl PublicKey {

    /// Decodes a public key from its SEC 1 point encoding.
    ///
    /// This function accepts both compressed (33 bytes) and uncompressed
    /// (65 bytes) formats. The point is always verified to be a valid
    /// curve point. The point-at-infinity is explicitly rejected: an
    /// ECDSA public key is never the neutral point.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let point = Point::decode(buf).ok_or(Error::InvalidPoint)?;
        if point.isneutral() != 0 {
            return Err(Error::InvalidPoint);
        }
        Ok(Self::from_point_unchecked(point))
    }

    /// Creates a public key from a curve point; the neutral point is
    /// rejected.
    pub fn from_point(point: &Point) -> Result<Self, Error> {
        if point.isneutral() != 0 {
            return Err(Error::InvalidPoint);
        }
        Ok(Self::from_point_unchecked(*point))
    }

    // Wraps a point which is already known to be non-neutral.
    pub(crate) fn from_point_unchecked(point: Point) -> Self {
        Self { point, enc: point.encode_uncompressed() }
    }

    /// Encodes this public key into the compressed format (33 bytes).
    pub fn encode_compressed(&self) -> [u8; 33] {
        self.point.encode_compressed()
    }

    /// Encodes this public key into the uncompressed format (65 bytes).
    pub fn encode_uncompressed(&self) -> [u8; 65] {
        self.enc
    }

    /// Serializes this public key into an ASN.1 SubjectPublicKeyInfo
    /// structure (SEC 1, appendix C.3), with the uncompressed point
    /// form.
    pub fn to_spki_der(&self) -> Vec<u8> {
        asn1::encode_spki(&self.enc)
    }

    /// Parses an ASN.1 SubjectPublicKeyInfo structure (SEC 1, appendix
    /// C.3). Only the named-curve form for secp256k1 is accepted.
    pub fn from_spki_der(buf: &[u8]) -> Result<Self, Error> {
        let pt = asn1::decode_spki(buf)?;
        Self::decode(pt)
    }

    /// Gets the curve point of this public key.
    #[inline(always)]
    pub fn point(&self) -> Point {
        self.point
    }

    /// Tells whether the y-coordinate of this public key is odd.
    #[inline]
    pub fn has_odd_y(&self) -> bool {
        (self.enc[64] & 1) != 0
    }

    // Big-endian x-coordinate, from the cached encoding.
    pub(crate) fn x_bytes_cached(&self) -> [u8; 32] {
        let mut x = [0u8; 32];
        x.copy_from_slice(&self.enc[1..33]);
        x
    }

    /// Compares two public keys (constant-time in the point values);
    /// returned value is 0xFFFFFFFF on equality, 0 otherwise.
    pub fn equals(&self, other: &Self) -> u32 {
        self.point.equals(other.point)
    }

    /// Verifies an ECDSA signature over the pre-hashed message `hv`.
    ///
    /// Note: this function is not constant-time; it assumes that the
    /// public key and signature value are public data.
    pub fn verify(&self, hv: &[u8], sig: &Signature) -> bool {
        self.verify_raw(hv, &sig.r, &sig.s)
    }

    /// Verifies an ECDSA signature provided as raw `(r, s)` scalars over
    /// the pre-hashed message `hv` (see `verify()`).
    pub fn verify_raw(&self, hv: &[u8], r: &Scalar, s: &Scalar) -> bool {
        // r and s must be in [1, n-1]. Decoders already enforce this,
        // but caller-supplied scalars are also accepted here.
        if (r.iszero() | s.iszero()) != 0 {
            return false;
        }

        let e = match hash_to_scalar(hv) {
            Ok(e) => e,
            Err(_) => return false,
        };

        // u1 = e/s, u2 = r/s; R = u1*G + u2*Q.
        let w = s.invert();
        let u1 = e * w;
        let u2 = r * w;
        let R = self.point.mul_add_mulgen_vartime(&u2, &u1);
        if R.isneutral() != 0 {
            return false;
        }

        // v = x(R) mod n must match r.
        let (xr, _, _) = R.to_affine();
        let (v, _) = Scalar::decode32_reduce(&xr.encode());
        v.equals(*r) != 0
    }

    /// Verifies a DER-encoded ECDSA signature (`SEQUENCE { r INTEGER,
    /// s INTEGER }`) over the pre-hashed message `hv` (see `verify()`).
    pub fn verify_der(&self, hv: &[u8], sig: &[u8]) -> bool {
        let (r, s) = match asn1::decode_der_signature(sig) {
            Ok(v) => v,
            Err(_) => return false,
        };
        self.verify_raw(hv, &r, &s)
    }

    /// Verifies a BIP-0066 encoded ECDSA signature over the pre-hashed
    /// message `hv`. The signature MUST carry its trailing sighash byte
    /// (which is otherwise not interpreted), pass the strict
    /// signature-encoding check, and have `s <= n/2`.
    pub fn verify_bip0066(&self, hv: &[u8], sig: &[u8]) -> bool {
        if !asn1::is_valid_bip0066(sig) {
            return false;
        }
        let (r, s) = match asn1::decode_der_signature(&sig[..sig.len() - 1]) {
            Ok(v) => v,
            Err(_) => return false,
        };
        if s.is_greater_than_half_n() != 0 {
            return false;
        }
        self.verify_raw(hv, &r, &s)
    }
}

impl Signature {

    /// Encodes this signature into the 64-byte compact form
    /// (big-endian r, then big-endian s).
    pub fn encode_compact(&self) -> [u8; 64] {
        let mut d = [0u8; 64];
        d[..32].copy_from_slice(&bswap32(&self.r.encode32()));
        d[32..].copy_from_slice(&bswap32(&self.s.encode32()));
        d
    }

    /// Decodes a signature from the 64-byte compact form. Both halves
    /// must be canonical and non-zero.
    pub fn decode_compact(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != 64 {
            return Err(Error::InvalidSignatureEncoding);
        }
        let (r, cr) = Scalar::decode32(&bswap32(&buf[..32]));
        let (s, cs) = Scalar::decode32(&bswap32(&buf[32..]));
        if ((cr & !r.iszero()) & (cs & !s.iszero())) == 0 {
            return Err(Error::InvalidScalar);
        }
        Ok(Self { r, s })
    }

    /// Encodes this signature into the 65-byte recoverable compact form
    /// (compact form followed by the raw recovery identifier byte).
    pub fn encode_compact_recoverable(&self, recovery_id: u8) -> [u8; 65] {
        let mut d = [0u8; 65];
        d[..64].copy_from_slice(&self.encode_compact());
        d[64] = recovery_id;
        d
    }

    /// Decodes a signature and its recovery identifier from the 65-byte
    /// recoverable compact form. The identifier byte must be in the 0 to
    /// 3 range (no offset convention is recognized).
    pub fn decode_compact_recoverable(buf: &[u8]) -> Result<(Self, u8), Error> {
        if buf.len() != 65 {
            return Err(Error::InvalidSignatureEncoding);
        }
        let sig = Self::decode_compact(&buf[..64])?;
        if buf[64] > 3 {
            return Err(Error::InvalidRecoveryId);
        }
        Ok((sig, buf[64]))
    }

    /// Encodes this signature into DER (`SEQUENCE { r INTEGER,
    /// s INTEGER }`).
    pub fn encode_der(&self) -> Vec<u8> {
        asn1::encode_der_signature(&self.r, &self.s)
    }

    /// Decodes a DER-encoded signature (strict parse; both integers must
    /// be canonical non-zero scalars).
    pub fn decode_der(buf: &[u8]) -> Result<Self, Error> {
        let (r, s) = asn1::decode_der_signature(buf)?;
        Ok(Self { r, s })
    }
}

/// Recovers the public key from a signature and its recovery identifier
/// over the pre-hashed message `hv`.
///
/// The identifier must be in the 0 to 3 range. Note that any `s` in
/// [1, n) is accepted here; enforcing the low-s rule, where relevant, is
/// the caller's responsibility.
///
/// This function is not constant-time; signatures are public data.
pub fn recover_public_key(hv: &[u8], sig: &Signature, recovery_id: u8)
    -> Result<PublicKey, Error>
{
    if (sig.r.iszero() | sig.s.iszero()) != 0 {
        return Err(Error::InvalidScalar);
    }

    // Rebuild the ephemeral point from r and the identifier, instead of
    // trying all candidates as in SEC 1, section 4.1.6.
    let R = Point::recover(&sig.r, recovery_id)?;

    let e = hash_to_scalar(hv)?;

    // Q = (s*R - e*G)/r, computed as (s/r)*R + (-e/r)*G.
    let ri = sig.r.invert();
    let u1 = sig.s * ri;
    let u2 = -(e * ri);
    let Q = R.mul_add_mulgen_vartime(&u1, &u2);
    if Q.isneutral() != 0 {
        return Err(Error::InvalidPoint);
    }
    PublicKey::from_point(&Q)
}

/// Derives the ECDSA challenge scalar from a pre-hashed message: the
/// leftmost 256 bits of the hash value, interpreted as a big-endian
/// integer and reduced modulo n. Hash values shorter than 32 bytes are
/// treated as left-padded with zeros; values shorter than 16 bytes are
/// rejected outright, as too short to be any real hash output.
pub(crate) fn hash_to_scalar(hv: &[u8]) -> Result<Scalar, Error> {
    if hv.len() < 16 {
        return Err(Error::InvalidDigest);
    }
    let mut tmp = [0u8; 32];
    if hv.len() >= 32 {
        tmp[..].copy_from_slice(&hv[..32]);
    } else {
        tmp[32 - hv.len()..].copy_from_slice(hv);
    }
    let (e, _) = Scalar::decode32_reduce(&bswap32(&tmp));
    Ok(e)
}

// ========================================================================

#[cfg(test)]
mod tests {

    use super::{PrivateKey, PublicKey, Signature, recover_public_key,
        hash_to_scalar};
    use crate::field::Scalar;
    use crate::nonce::tests::ZeroRng;
    use crate::point::bswap32;
    use crate::Error;
    use sha2::{Sha256, Digest};

    fn keypair(tag: u64) -> PrivateKey {
        let mut sh = Sha256::new();
        sh.update(tag.to_le_bytes());
        let seed: [u8; 32] = sh.finalize().into();
        PrivateKey::from_seed(&seed)
    }

    #[test]
    fn keys() {
        let sk = keypair(1);
        let e = sk.encode();
        let sk2 = PrivateKey::decode(&e).unwrap();
        assert!(sk.equals(&sk2) == 0xFFFFFFFF);
        assert!(sk.public_key().equals(sk2.public_key()) == 0xFFFFFFFF);

        // Zero and order-sized encodings are invalid.
        assert!(PrivateKey::decode(&[0u8; 32]).is_err());
        let mut nb = [0u8; 32];
        nb.copy_from_slice(&hex::decode(
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
            .unwrap());
        assert!(PrivateKey::decode(&nb).is_err());
        assert!(PrivateKey::decode(&[1u8; 31]).is_err());

        // Public key codec round trips, both formats plus SPKI.
        let pk = sk.public_key();
        let pc = pk.encode_compressed();
        let pu = pk.encode_uncompressed();
        assert!(PublicKey::decode(&pc).unwrap().equals(pk) == 0xFFFFFFFF);
        assert!(PublicKey::decode(&pu).unwrap().equals(pk) == 0xFFFFFFFF);
        let spki = pk.to_spki_der();
        assert!(PublicKey::from_spki_der(&spki).unwrap()
            .equals(pk) == 0xFFFFFFFF);

        // The neutral point (single 0x00 byte) is not a public key.
        assert!(PublicKey::decode(&[0u8]).is_err());

        // Key generation through an RNG yields a working key.
        let gk = PrivateKey::generate(&mut ZeroRng).err();
        // ZeroRng yields the all-zero candidate forever, which is
        // rejected by sampling.
        assert!(gk == Some(Error::RejectionSampling));
        let gk = PrivateKey::generate(&mut rand_core::OsRng).unwrap();
        let (sig, _) = gk.sign_hash(&[7u8; 32]).unwrap();
        assert!(gk.public_key().verify(&[7u8; 32], &sig));
    }

    #[test]
    fn sign_verify() {
        let mut sh = Sha256::new();
        for i in 0..10u64 {
            let sk = keypair(i);
            let pk = sk.public_key();

            sh.update(i.to_le_bytes());
            let hv: [u8; 32] = sh.finalize_reset().into();

            let (sig, recid) = sk.sign_hash(&hv).unwrap();
            assert!(recid <= 3);
            assert!(pk.verify(&hv, &sig));

            // Low-s is always enforced.
            assert!(sig.s.is_greater_than_half_n() == 0);

            // A different message or a corrupted signature must fail.
            let mut hv2 = hv;
            hv2[0] ^= 1;
            assert!(!pk.verify(&hv2, &sig));
            let bad = Signature { r: sig.r, s: sig.s + Scalar::ONE };
            assert!(!pk.verify(&hv, &bad));
            let bad = Signature { r: sig.r + Scalar::ONE, s: sig.s };
            assert!(!pk.verify(&hv, &bad));

            // Zero halves are rejected outright.
            assert!(!pk.verify(&hv, &Signature { r: Scalar::ZERO, s: sig.s }));
            assert!(!pk.verify(&hv, &Signature { r: sig.r, s: Scalar::ZERO }));

            // The high-s form of a valid signature still verifies in
            // plain ECDSA (both forms are mathematically valid).
            let high = Signature { r: sig.r, s: -sig.s };
            assert!(pk.verify(&hv, &high));

            // Recovery returns the signing key's public half.
            let rk = recover_public_key(&hv, &sig, recid).unwrap();
            assert!(rk.equals(pk) == 0xFFFFFFFF);

            // Compact and recoverable-compact round trips.
            let c = sig.encode_compact();
            let sig2 = Signature::decode_compact(&c).unwrap();
            assert!(sig.r.equals(sig2.r) == 0xFFFFFFFF);
            assert!(sig.s.equals(sig2.s) == 0xFFFFFFFF);
            let cr = sig.encode_compact_recoverable(recid);
            let (sig3, recid3) = Signature::decode_compact_recoverable(&cr)
                .unwrap();
            assert!(recid3 == recid);
            assert!(sig.r.equals(sig3.r) == 0xFFFFFFFF);

            // DER round trip and DER verification.
            let der = sig.encode_der();
            let sig4 = Signature::decode_der(&der).unwrap();
            assert!(sig.s.equals(sig4.s) == 0xFFFFFFFF);
            assert!(pk.verify_der(&hv, &der));

            // BIP-0066: sighash byte appended, low-s accepted, high-s
            // rejected.
            let mut b66 = der.clone();
            b66.push(0x01);
            assert!(pk.verify_bip0066(&hv, &b66));
            assert!(!pk.verify_bip0066(&hv, &der));
            let mut high_der = high.encode_der();
            high_der.push(0x01);
            assert!(pk.verify_der(&hv, &high.encode_der()));
            assert!(!pk.verify_bip0066(&hv, &high_der));
        }
    }

    #[test]
    fn known_vector() {
        // Test vector from project Wycheproof
        // (ecdsa_secp256k1_sha256_p1363_test.json, tc 3).
        let pk = PublicKey::decode(&hex::decode(
            "04b838ff44e5bc177bf21189d0766082fc9d843226887fc9760371100b7ee20a6f\
             f0c9d75bfba7b31a6bca1974496eeb56de357071955d83c4b1badaa0b21832e9")
            .unwrap()).unwrap();
        let sig = Signature::decode_compact(&hex::decode(
            "813ef79ccefa9a56f7ba805f0e478584fe5f0dd5f567bc09b5123ccbc9832365\
             900e75ad233fcc908509dbff5922647db37c21f4afd3203ae8dc4ae7794b0f87")
            .unwrap()).unwrap();

        let mut sh = Sha256::new();
        sh.update(b"123400");
        let hv1: [u8; 32] = sh.finalize_reset().into();
        sh.update(b"123401");
        let hv2: [u8; 32] = sh.finalize_reset().into();

        assert!(pk.verify(&hv1, &sig));
        assert!(!pk.verify(&hv2, &sig));
    }

    #[test]
    fn broken_rng_nonces() {
        // With an all-zero RNG, signing is deterministic but nonces
        // still differ across messages and keys.
        let sk1 = keypair(100);
        let sk2 = keypair(101);
        let m1 = [1u8; 32];
        let m2 = [2u8; 32];

        let (sa, ra) = sk1.sign_hash_with_rng(&mut ZeroRng, &m1).unwrap();
        let (sb, rb) = sk1.sign_hash_with_rng(&mut ZeroRng, &m1).unwrap();
        assert!(ra == rb);
        assert!(sa.encode_compact() == sb.encode_compact());
        assert!(sk1.public_key().verify(&m1, &sa));

        let (sc, _) = sk1.sign_hash_with_rng(&mut ZeroRng, &m2).unwrap();
        assert!(sa.r.equals(sc.r) == 0);

        let (sd, _) = sk2.sign_hash_with_rng(&mut ZeroRng, &m1).unwrap();
        assert!(sa.r.equals(sd.r) == 0);
    }

    #[test]
    fn nonce_reuse_recovers_key() {
        // The classic failure the nonce derivation protects against:
        // two signatures sharing the same k leak the private key. Forge
        // the situation by computing the signature equation directly.
        let sk = keypair(55);
        let d = *sk.scalar();

        let mut sh = Sha256::new();
        sh.update(b"first message");
        let h1: [u8; 32] = sh.finalize_reset().into();
        sh.update(b"second message");
        let h2: [u8; 32] = sh.finalize_reset().into();
        let z1 = hash_to_scalar(&h1).unwrap();
        let z2 = hash_to_scalar(&h2).unwrap();

        let k = Scalar::decode_reduce(b"fixed nonce, as seen in the wild");
        let R = crate::point::Point::mulgen(&k);
        let (xr, _, _) = R.to_affine();
        let (r, _) = Scalar::decode32_reduce(&xr.encode());
        let ki = k.invert();
        let s1 = (z1 + r * d) * ki;
        let s2 = (z2 + r * d) * ki;

        // Both are valid signatures...
        assert!(sk.public_key().verify(&h1, &Signature { r, s: s1 }));
        assert!(sk.public_key().verify(&h2, &Signature { r, s: s2 }));

        // ... and together they surrender k and then d.
        let k_rec = (z1 - z2) / (s1 - s2);
        assert!(k_rec.equals(k) == 0xFFFFFFFF);
        let d_rec = (s1 * k_rec - z1) / r;
        assert!(d_rec.equals(d) == 0xFFFFFFFF);
    }

    #[test]
    fn digest_truncation() {
        let sk = keypair(77);
        let pk = sk.public_key();

        // Shorter than 16 bytes: rejected.
        assert!(matches!(sk.sign_hash(&[0u8; 15]),
            Err(Error::InvalidDigest)));
        assert!(hash_to_scalar(&[0u8; 15]).is_err());

        // 16..31 bytes: left-padded with zeros.
        let short = [0xA5u8; 20];
        let mut padded = [0u8; 32];
        padded[12..].copy_from_slice(&short);
        let (sig, _) = sk.sign_hash(&short).unwrap();
        assert!(pk.verify(&padded, &sig));
        assert!(pk.verify(&short, &sig));

        // Longer than 32 bytes: leftmost 32 bytes only.
        let mut long = [0u8; 48];
        for i in 0..48 {
            long[i] = i as u8;
        }
        let (sig, _) = sk.sign_hash(&long).unwrap();
        assert!(pk.verify(&long[..32], &sig));

        // e is the truncated value reduced mod n.
        let e = hash_to_scalar(&long).unwrap();
        let (want, _) = Scalar::decode32_reduce(&bswap32(&long[..32]));
        assert!(e.equals(want) == 0xFFFFFFFF);
    }
}
