//! BIP-0340 Schnorr signatures over secp256k1.
//!
//! Public keys are 32 bytes: the x-coordinate of a point whose
//! y-coordinate is implicitly even ("lift_x"). The `SchnorrPublicKey`
//! structure stores the lifted point along with its x-only encoding;
//! when derived from a `PrivateKey`, the secret scalar used for signing
//! is negated whenever the plain public point has an odd y, so that
//! signing and verification agree on the lifted key.
//!
//! Signatures are 64 bytes (`x(R) || s`) and messages are exactly 32
//! bytes, as prescribed by the BIP. All hashing uses the BIP-0340
//! tagged-hash construction (`SHA-256(SHA-256(tag) || SHA-256(tag) ||
//! data)`).
//!
//! BIP-0340 inherits from RFC 6979 the risk that deterministic nonces
//! shared between ECDSA and Schnorr signing under one key collide; the
//! auxiliary randomness here comes from the same cSHAKE-256 stream as
//! ECDSA nonces but under a distinct domain-separation context, so the
//! two schemes stay apart even with a dead entropy source.
//!
//! Signing self-verifies its output before returning it, using the
//! shortcut `R' = (s - e*d)*G` (a single constant-time fixed-base
//! multiplication) rather than the generic verification equation, which
//! would be three times slower and would route secret material through
//! variable-time code.

use sha2::{Sha256, Digest};
use sha3::digest::XofReader;

use crate::{CryptoRng, OsRng, RngCore};
use crate::ecdsa::{PrivateKey, PublicKey};
use crate::field::{GFp, Scalar};
use crate::nonce;
use crate::point::{Point, bswap32};
use crate::Error;

/// Size of a BIP-0340 public key, in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of a BIP-0340 signature, in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Size of a BIP-0340 message, in bytes.
pub const MESSAGE_SIZE: usize = 32;

const TAG_AUX: &str = "BIP0340/aux";
const TAG_NONCE: &str = "BIP0340/nonce";
const TAG_CHALLENGE: &str = "BIP0340/challenge";

/// A public key for verifying BIP-0340 Schnorr signatures.
#[derive(Clone, Copy, Debug)]
pub struct SchnorrPublicKey {
    point: Point,    // never the neutral; y is always even
    x: [u8; 32],     // big-endian x-coordinate
}

impl SchnorrPublicKey {

    /// Decodes a BIP-0340 public key from its 32-byte x-only encoding.
    ///
    /// The point is lifted by decompression with an even y-coordinate;
    /// decoding fails if the x-coordinate is not canonical or is not the
    /// abscissa of any curve point.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != PUBLIC_KEY_SIZE {
            return Err(Error::InvalidPoint);
        }
        let mut cb = [0u8; 33];
        cb[0] = 0x02;
        cb[1..].copy_from_slice(buf);
        let point = Point::decode(&cb).ok_or(Error::InvalidPoint)?;

        let mut x = [0u8; 32];
        x.copy_from_slice(buf);
        Ok(Self { point, x })
    }

    /// Creates a BIP-0340 public key from a curve point. Any non-neutral
    /// point is accepted; a point with an odd y-coordinate is replaced
    /// with its negation (the even-y lift of the same x).
    pub fn from_point(point: &Point) -> Result<Self, Error> {
        if point.isneutral() != 0 {
            return Err(Error::InvalidPoint);
        }
        let mut pt = *point;
        pt.set_condneg(pt.has_odd_y());
        // The point is not the neutral, so its coordinates exist.
        let (x, _) = pt.x_y_bytes().unwrap();
        Ok(Self { point: pt, x })
    }

    // Derivation from an ECDSA/ECDH public key (used when building a
    // PrivateKey). The cached uncompressed encoding provides both the
    // x bytes and the parity.
    pub(crate) fn from_ecdsa_public_key(pk: &PublicKey) -> Self {
        let mut pt = pk.point();
        pt.set_condneg((pk.has_odd_y() as u32).wrapping_neg());
        Self { point: pt, x: pk.x_bytes_cached() }
    }

    /// Encodes this public key into its 32-byte x-only form.
    pub fn encode(&self) -> [u8; 32] {
        self.x
    }

    /// Gets the (even-y) curve point of this public key.
    #[inline(always)]
    pub fn point(&self) -> Point {
        self.point
    }

    /// Compares two public keys (constant-time in the point values);
    /// returned value is 0xFFFFFFFF on equality, 0 otherwise.
    pub fn equals(&self, other: &Self) -> u32 {
        self.point.equals(other.point)
    }

    /// Verifies a BIP-0340 Schnorr signature over `msg` (which must be
    /// exactly 32 bytes).
    ///
    /// Note: this function is not constant-time; it assumes that the
    /// public key, message and signature are public data.
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> bool {
        let (s, e, rx) = match parse_signature(&self.x, msg, sig) {
            Some(v) => v,
            None => return false,
        };

        // R = s*G - e*P.
        let R = self.point.mul_add_mulgen_vartime(&-e, &s);
        check_signature_r(&rx, &R)
    }
}

/// BIP-0340 tagged hash: SHA-256(SHA-256(tag) || SHA-256(tag) || data).
pub(crate) fn tagged_hash(tag: &str, chunks: &[&[u8]]) -> [u8; 32] {
    let ht: [u8; 32] = Sha256::digest(tag.as_bytes()).into();
    let mut sh = Sha256::new();
    sh.update(ht);
    sh.update(ht);
    for c in chunks {
        sh.update(c);
    }
    sh.finalize().into()
}

// Checks the signature length, the ranges of its halves (x(R) must be
// canonical modulo p, s canonical modulo n), and derives the challenge
// scalar. Returns (s, e, x(R) bytes).
fn parse_signature(pk_x: &[u8; 32], msg: &[u8], sig: &[u8])
    -> Option<(Scalar, Scalar, [u8; 32])>
{
    if msg.len() != MESSAGE_SIZE || sig.len() != SIGNATURE_SIZE {
        return None;
    }

    // r = int(sig[0..32]); fail if r >= p. Only the range is needed
    // here; the point itself is rebuilt by the verification equation.
    let (_, rok) = GFp::decode32(&bswap32(&sig[0..32]));
    if rok == 0 {
        return None;
    }
    let mut rx = [0u8; 32];
    rx.copy_from_slice(&sig[0..32]);

    // s = int(sig[32..64]); fail if s >= n.
    let s = Scalar::decode(&bswap32(&sig[32..64]))?;

    // e = int(tagged_hash("BIP0340/challenge", r || P.x || m)) mod n.
    let eb = tagged_hash(TAG_CHALLENGE, &[&rx, pk_x, msg]);
    let (e, _) = Scalar::decode32_reduce(&bswap32(&eb));

    Some((s, e, rx))
}

// Final acceptance checks on the recomputed R: not the neutral, even y,
// x matching the signature bytes. Byte comparison is variable-time by
// design (public data).
fn check_signature_r(rx: &[u8; 32], R: &Point) -> bool {
    if R.isneutral() != 0 {
        return false;
    }
    let (x, y, _) = R.to_affine();
    if y.isodd() != 0 {
        return false;
    }
    bswap32(&x.encode()) == *rx
}

impl PrivateKey {

    /// Signs a 32-byte message with BIP-0340 Schnorr, drawing the
    /// auxiliary randomness from the operating system source. Returns
    /// the 64-byte signature.
    pub fn sign_schnorr(&self, msg: &[u8]) -> Result<[u8; 64], Error> {
        self.sign_schnorr_with_rng(&mut OsRng, msg)
    }

    /// Signs a 32-byte message with BIP-0340 Schnorr, drawing the
    /// auxiliary randomness from the provided source, filtered through
    /// the keyed nonce-derivation stream (a weak source makes signing
    /// deterministic, not insecure).
    pub fn sign_schnorr_with_rng<T: CryptoRng + RngCore>(&self, rng: &mut T,
        msg: &[u8]) -> Result<[u8; 64], Error>
    {
        if msg.len() != MESSAGE_SIZE {
            return Err(Error::InvalidDigest);
        }
        let mut xof = nonce::nonce_stream(rng,
            nonce::CONTEXT_SCHNORR, &self.encode(), msg)?;
        let mut aux = [0u8; 32];
        xof.read(&mut aux);

        self.sign_schnorr_with_aux(&aux, msg)
    }

    // The BIP-0340 signing algorithm proper, with the auxiliary
    // randomness as an explicit input (as in the BIP test vectors).
    pub(crate) fn sign_schnorr_with_aux(&self, aux: &[u8; 32], msg: &[u8])
        -> Result<[u8; 64], Error>
    {
        // d = d' if the public point has even y, n - d' otherwise.
        let pk = self.public_key();
        let mut d = *self.scalar();
        d.set_condneg((pk.has_odd_y() as u32).wrapping_neg());
        let pxb = self.schnorr_public_key().encode();

        // t = bytes(d) XOR tagged_hash("BIP0340/aux", a).
        let th = tagged_hash(TAG_AUX, &[aux]);
        let db = bswap32(&d.encode32());
        let mut t = [0u8; 32];
        for i in 0..32 {
            t[i] = db[i] ^ th[i];
        }

        // rand = tagged_hash("BIP0340/nonce", t || P.x || m);
        // k' = int(rand) mod n; fail if k' = 0 (this cannot happen with
        // an unbroken SHA-256).
        let rand = tagged_hash(TAG_NONCE, &[&t, &pxb, msg]);
        let (kp, _) = Scalar::decode32_reduce(&bswap32(&rand));
        if kp.iszero() != 0 {
            return Err(Error::RejectionSampling);
        }

        // R = k'*G; k = k' if R has even y, n - k' otherwise.
        let R = Point::mulgen(&kp);
        let (xr, yr, _) = R.to_affine();
        let rxb = bswap32(&xr.encode());
        let mut k = kp;
        k.set_condneg(yr.isodd());

        // e = int(tagged_hash("BIP0340/challenge", R.x || P.x || m)) mod n.
        let eb = tagged_hash(TAG_CHALLENGE, &[&rxb, &pxb, msg]);
        let (e, _) = Scalar::decode32_reduce(&bswap32(&eb));

        // sig = R.x || bytes(k + e*d).
        let s = k + e * d;
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(&rxb);
        sig[32..].copy_from_slice(&bswap32(&s.encode32()));

        // Self-verification before release. A failure here means the
        // computation above went wrong (miscompiled code, hardware
        // fault); continuing would hand out a key-dependent invalid
        // signature.
        if !verify_with_secret(&d, &pxb, msg, &sig) {
            panic!("secp256k1 schnorr: self-verification failed");
        }

        Ok(sig)
    }
}

// Verification of a freshly produced signature using the signing secret:
// since s = k + e*d, the ephemeral point is recomputed as (s - e*d)*G
// with a single constant-time fixed-base multiplication.
fn verify_with_secret(d: &Scalar, pk_x: &[u8; 32], msg: &[u8], sig: &[u8])
    -> bool
{
    let (s, e, rx) = match parse_signature(pk_x, msg, sig) {
        Some(v) => v,
        None => return false,
    };
    let R = Point::mulgen(&(s - e * d));
    check_signature_r(&rx, &R)
}

// ========================================================================
