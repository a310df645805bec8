//! secp256k1-ct is a Rust implementation of the secp256k1 elliptic
//! curve and of the usual protocols built on top of it: ECDH key
//! agreement, ECDSA signatures (including public-key recovery and the
//! strict-DER BIP-0066 flavour), and BIP-0340 Schnorr signatures.
//!
//! The group and scalar arithmetic aims at being efficient and secure
//! (constant-time), with portable code, and with a convenient API so
//! that scalars, curve points, and field elements may be used in
//! straightforward expressions with normal arithmetic operators.
//!
//! The base field (`field::GFp`) and the scalar ring (`field::Scalar`)
//! are implemented over four 64-bit limbs in the `backend` module. Curve
//! points and the scalar multiplication engine are in the `point`
//! module; ECDSA keys and signatures are in `ecdsa`, BIP-0340 Schnorr
//! keys and signatures in `schnorr`, and ECDH in `ecdh`. The strict
//! ASN.1/DER codecs (signatures, SubjectPublicKeyInfo, BIP-0066
//! validation) are in `asn1`.
//!
//! # Conventions
//!
//! All implemented functions are strictly constant-time, unless
//! explicitly documented otherwise (non-constant-time functions normally
//! have "vartime" in their name, and signature verification is
//! variable-time by design, since it processes only public data). In
//! order to avoid unwanted side-channel leaks, Booleans are avoided
//! (compilers tend to "optimize" things a bit too eagerly when handling
//! `bool` values). All functions that return or use a potentially secret
//! Boolean value use the `u32` type; the convention is that 0xFFFFFFFF
//! means "true", and 0x00000000 means "false". No other value shall be
//! used, for they would lead to unpredictable results. Similarly, the
//! `Eq` or `PartialEq` traits are not implemented on such types.
//!
//! Algebraic operations on field elements and curve points are performed
//! with the usual operators (e.g. `+`); appropriate traits are defined
//! so that structure types and pointers to structure types can be used
//! more or less interchangeably. Throughout the code, functions that
//! modify the object on which they are called tend to have a name in
//! `set_*()` (e.g. for a curve point `P`, if we want to compute the
//! double of that point, then `P.set_double()` modifies the point
//! structure in place, while `P.double()` leaves `P` unmodified and
//! returns the double as a new structure instance).
//!
//! # Randomness
//!
//! Key generation and signing draw entropy through the `rand_core`
//! traits; the operating system source (`OsRng`) is used when the caller
//! does not provide one. Nonce generation additionally filters all
//! caller-provided entropy through a keyed cSHAKE-256 stream, so that a
//! broken or hostile RNG degrades signing to a deterministic (but still
//! safe) scheme instead of leaking the private key.

pub use rand_core::{CryptoRng, OsRng, RngCore};

use core::fmt;

pub mod backend;
pub mod field;
pub mod point;
pub mod ecdsa;
pub mod schnorr;
pub mod ecdh;
pub mod asn1;

pub(crate) mod nonce;

/// Errors reported by the various decoding and signing operations.
///
/// Signature *verification* failures are never reported through this
/// type: verification functions return a plain Boolean, since a
/// well-formed but mathematically invalid signature is not an
/// exceptional condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Scalar bytes decode to a value not in the expected range (out of
    /// [0, n), or zero where a non-zero value is required).
    InvalidScalar,

    /// Field element bytes decode to a value which is not lower than the
    /// field modulus.
    InvalidFieldElement,

    /// Point encoding has a wrong length or prefix, coordinates off the
    /// curve, or designates the point-at-infinity where that is
    /// forbidden.
    InvalidPoint,

    /// Signature encoding is malformed (bad DER, wrong compact length).
    InvalidSignatureEncoding,

    /// Pre-hashed message is too short to safely derive a challenge.
    InvalidDigest,

    /// Recovery identifier is out of range, or inconsistent with the
    /// signature value it accompanies.
    InvalidRecoveryId,

    /// The random source failed to deliver entropy.
    EntropySource,

    /// Repeated scalar sampling failed to produce a canonical non-zero
    /// value; the random source is broken.
    RejectionSampling,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Error::InvalidScalar => "invalid scalar",
            Error::InvalidFieldElement => "invalid field element",
            Error::InvalidPoint => "invalid curve point",
            Error::InvalidSignatureEncoding => "invalid signature encoding",
            Error::InvalidDigest => "invalid message digest length",
            Error::InvalidRecoveryId => "invalid recovery identifier",
            Error::EntropySource => "entropy source failure",
            Error::RejectionSampling => "scalar rejection sampling failure",
        };
        f.write_str(s)
    }
}

impl std::error::Error for Error {}
