//! secp256k1 curve group.
//!
//! This module implements group operations on the secp256k1 elliptic
//! curve, a short Weierstraß curve with equation `y^2 = x^3 + 7`. The
//! curve has prime order `n`; scalars are integers modulo `n` and are
//! implemented by the `Scalar` structure (see the `field` module).
//!
//! A point on the curve is represented by the `Point` structure. The
//! additive arithmetic operators can be applied on `Point` instances
//! (`+`, `-`, `+=`, `-=`); multiplication by a scalar (`Scalar` type) is
//! supported with the `*` and `*=` operators. Point doublings can be
//! performed with the `double()` function (which is somewhat faster than
//! general addition), and additional optimizations are obtained in the
//! context of multiple successive doublings by calling the `xdouble()`
//! function. All these operations are implemented with fully
//! constant-time code and are complete, i.e. they work with all points,
//! even when adding a point with itself or when operations involve the
//! curve point-at-infinity (the neutral element for the curve as a
//! group).
//!
//! Variable-time versions of the multiplication routines are provided
//! for use with public data only: a GLV-accelerated variable-base
//! multiplier (`mul_vartime_glv()`), a fixed-base multiplier
//! (`mulgen_vartime()`), and the fused `u*self + v*G` combination
//! (`mul_add_mulgen_vartime()`) which is the workhorse of signature
//! verification.
//!
//! Points can be encoded in compressed (33 bytes) or uncompressed (65
//! bytes) SEC 1 formats, with the one-byte encoding (0x00) for the
//! point-at-infinity. These formats internally use big-endian. The
//! fixed-size encoders cannot produce the one-byte encoding and yield a
//! sequence of 33 or 65 zeros for the neutral; decoding does not accept
//! those all-zero sequences. All decoding operations enforce
//! canonicality of the coordinates, and verify that the point is indeed
//! on the curve.
//!
//! The fixed-base multipliers rely on a 60 kB table of multiples of the
//! generator, built once (from the generator itself, or from a
//! serialized blob) and shared by all threads afterwards.

// Projective/fractional coordinates traditionally use uppercase letters,
// using lowercase only for affine coordinates.
#![allow(non_snake_case)]

use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::OnceLock;

use crate::field::{GFp, Scalar};
use crate::Error;

/// A point on the short Weierstraß curve secp256k1.
#[derive(Clone, Copy, Debug)]
pub struct Point {
    X: GFp,
    Y: GFp,
    Z: GFp,
}

/// A curve point (non-infinity) in affine coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PointAffine {
    pub(crate) x: GFp,
    pub(crate) y: GFp,
}

/// Reverses a 32-byte sequence (i.e. switches between big-endian and
/// little-endian conventions).
///
/// Source slice MUST have length at least 32 (only the first 32 bytes
/// are accessed).
pub(crate) fn bswap32(x: &[u8]) -> [u8; 32] {
    let mut y = [0u8; 32];
    for i in 0..32 {
        y[i] = x[31 - i];
    }
    y
}

impl Point {

    // Curve equation is: y^2 = x^3 + b  (for b = 7)
    // We use projective coordinates:
    //   (x, y) -> (X:Y:Z) such that x = X/Z and y = Y/Z
    //   Y is never 0 (not even for the neutral)
    //   X = 0 and Z = 0 for the neutral
    //   Z != 0 for all non-neutral points
    // X = 0 is conceptually feasible for some non-neutral points, but
    // it does not happen with secp256k1.
    //
    // Note that the curve does not have a point of order 2.
    //
    // For point additions, we use the formulas from:
    //    https://eprint.iacr.org/2015/1060
    // (algorithm 7, specialized to a = 0). The formulas are complete
    // (on this curve), with cost 14M (including two multiplications by
    // the constant 3*b).
    //
    // For point doublings (algorithm 9), the formulas have cost 7M+2S
    // (including one multiplication by the constant 3*b).

    /// The neutral element (point-at-infinity) in the curve.
    pub const NEUTRAL: Self = Self {
        X: GFp::ZERO,
        Y: GFp::ONE,
        Z: GFp::ZERO,
    };

    /// The conventional generator point of the curve.
    ///
    /// Like all non-neutral points in secp256k1, it generates the whole
    /// group.
    pub const BASE: Self = Self {
        X: GFp::w64be(
            0x79BE667EF9DCBBAC, 0x55A06295CE870B07,
            0x029BFCDB2DCE28D9, 0x59F2815B16F81798),
        Y: GFp::w64be(
            0x483ADA7726A3C465, 0x5DA4FBFC0E1108A8,
            0xFD17B448A6855419, 0x9C47D08FFB10D4B8),
        Z: GFp::ONE,
    };

    /// Curve equation parameter b.
    const B: GFp = GFp::w64be(0, 0, 0, 7);

    // The group order n, as a field element. Used when rebuilding the
    // ephemeral x-coordinate during public-key recovery.
    const N_FE: GFp = GFp::w64be(
        0xFFFFFFFFFFFFFFFF, 0xFFFFFFFFFFFFFFFE,
        0xBAAEDCE6AF48A03B, 0xBFD25E8CD0364141);

    // p - n, over 64-bit limbs (low-to-high). A scalar r admits a second
    // x-coordinate candidate r + n only if r < p - n.
    const P_MINUS_N: [u64; 4] = [
        0x402DA1722FC9BAEE, 0x4551231950B75FC4, 1, 0 ];

    /// Tries to decode a point.
    ///
    /// This function accepts the following encodings and lengths:
    ///
    ///  - A single byte of value 0x00: the point-at-infinity.
    ///
    ///  - A byte of value 0x02 or 0x03, followed by exactly 32 bytes
    ///    (unsigned big-endian encoding of the x coordinate): compressed
    ///    encoding of a non-neutral point.
    ///
    ///  - A byte of value 0x04, followed by exactly 64 bytes (unsigned
    ///    big-endian encodings of x and y): uncompressed encoding of a
    ///    non-neutral point.
    ///
    /// The (very rarely encountered) "hybrid" encoding (like
    /// uncompressed, but the least significant bit of y is also copied
    /// into the first byte, which has value 0x06 or 0x07) is not
    /// supported.
    ///
    /// On success, this structure is set to the decoded point, and
    /// 0xFFFFFFFF is returned. On failure, this structure is set to the
    /// neutral point, and 0x00000000 is returned. A failure is reported
    /// if the coordinates can be decoded but do not correspond to a
    /// point on the curve.
    ///
    /// Constant-time behaviour: timing-based side channels may leak
    /// which encoding type was used (neutral, compressed, uncompressed)
    /// but not the value of the obtained point, nor whether the encoding
    /// was for a valid point.
    pub fn set_decode(&mut self, buf: &[u8]) -> u32 {
        *self = Self::NEUTRAL;

        if buf.len() == 1 {

            // Single-byte encoding is for the point-at-infinity.
            // Return 0xFFFFFFFF if and only if the byte has value 0x00.
            return (((buf[0] as i32) - 1) >> 8) as u32;

        } else if buf.len() == 33 {

            // Compressed encoding.
            // Check that the first byte is 0x02 or 0x03.
            let mut r = (((((buf[0] & 0xFE) ^ 0x02) as i32) - 1) >> 8) as u32;

            // Decode x.
            let (x, rx) = GFp::decode32(&bswap32(&buf[1..33]));
            r &= rx;

            // Compute: y = sqrt(x^3 + b)
            let (mut y, ry) = (x * x.square() + Self::B).sqrt();
            r &= ry;

            // Negate y if the parity does not match the bit provided in
            // the first encoding byte. Note that there is no valid point
            // with y = 0, thus we do not have to check that the parity is
            // correct after the conditional negation.
            let yb = y.encode()[0];
            let ws = (((yb ^ buf[0]) & 0x01) as u32).wrapping_neg();
            y.set_cond(&-y, ws);

            // Set the coordinates, adjusting them if the process failed.
            self.X = GFp::select(&GFp::ZERO, &x, r);
            self.Y = GFp::select(&GFp::ONE, &y, r);
            self.Z = GFp::select(&GFp::ZERO, &GFp::ONE, r);
            return r;

        } else if buf.len() == 65 {

            // Uncompressed encoding.
            // First byte must have value 0x04.
            let mut r = ((((buf[0] ^ 0x04) as i32) - 1) >> 8) as u32;

            // Decode x and y.
            let (x, rx) = GFp::decode32(&bswap32(&buf[1..33]));
            let (y, ry) = GFp::decode32(&bswap32(&buf[33..65]));
            r &= rx & ry;

            // Verify that the coordinates match the curve equation.
            r &= y.square().equals(x * x.square() + Self::B);

            // Set the coordinates, adjusting them if the process failed.
            self.X = GFp::select(&GFp::ZERO, &x, r);
            self.Y = GFp::select(&GFp::ONE, &y, r);
            self.Z = GFp::select(&GFp::ZERO, &GFp::ONE, r);
            return r;

        } else {

            // Invalid encoding length, return 0.
            return 0;

        }
    }

    /// Tries to decode a point (see `set_decode()` for the accepted
    /// encodings). On success, the decoded point is returned; on failure,
    /// `None` is returned.
    pub fn decode(buf: &[u8]) -> Option<Point> {
        let mut P = Point::NEUTRAL;
        if P.set_decode(buf) != 0 {
            Some(P)
        } else {
            None
        }
    }

    /// Encodes this point in compressed format (33 bytes).
    ///
    /// If the point is the neutral then `[0u8; 33]` is returned, which
    /// is NOT the standard encoding of the neutral (standard is a single
    /// byte of value 0x00); for a non-neutral point, the first byte
    /// is always equal to 0x02 or 0x03, never to 0x00.
    pub fn encode_compressed(self) -> [u8; 33] {
        let r = !self.isneutral();
        let iZ = GFp::ONE / self.Z;  // this is 0 if Z = 0
        let x = self.X * iZ;  // 0 for the neutral
        let y = self.Y * iZ;  // 0 for the neutral
        let mut b = [0u8; 33];
        b[0] = ((y.encode()[0] & 0x01) | 0x02) & (r as u8);
        b[1..33].copy_from_slice(&bswap32(&x.encode()));
        b
    }

    /// Encodes this point in uncompressed format (65 bytes).
    ///
    /// If the point is the neutral then `[0u8; 65]` is returned, which
    /// is NOT the standard encoding of the neutral (standard is a single
    /// byte of value 0x00); for a non-neutral point, the first byte
    /// is always equal to 0x04, never to 0x00.
    pub fn encode_uncompressed(self) -> [u8; 65] {
        let r = !self.isneutral();
        let iZ = GFp::ONE / self.Z;  // this is 0 if Z = 0
        let x = self.X * iZ;  // 0 for the neutral
        let y = self.Y * iZ;  // 0 for the neutral
        let mut b = [0u8; 65];
        b[0] = 0x04 & (r as u8);
        b[ 1..33].copy_from_slice(&bswap32(&x.encode()));
        b[33..65].copy_from_slice(&bswap32(&y.encode()));
        b
    }

    /// Gets the affine (x, y) coordinates for this point.
    ///
    /// Values (x, y, r) are returned, with x and y being field elements,
    /// and r a `u32` value that qualifies the outcome:
    ///
    ///  - if the point is the neutral, then x = 0, y = 0 and r = 0x00000000;
    ///
    ///  - otherwise, x and y are the affine coordinates, and r = 0xFFFFFFFF.
    ///
    /// Note that there is no point with x = 0 or with y = 0 on the curve.
    pub fn to_affine(self) -> (GFp, GFp, u32) {
        // Uncompressed format contains both coordinates.
        let bb = self.encode_uncompressed();

        // First byte is 0x00 for the neutral, 0x04 for other points.
        let r = (((bb[0] as i32) - 1) >> 8) as u32;

        // The values necessarily decode successfully.
        let (x, _) = GFp::decode32(&bswap32(&bb[1..33]));
        let (y, _) = GFp::decode32(&bswap32(&bb[33..65]));
        (x, y, r)
    }

    /// Gets the big-endian encoding of the affine x-coordinate of this
    /// point, or `None` for the point-at-infinity.
    pub fn x_bytes(self) -> Option<[u8; 32]> {
        self.x_y_bytes().map(|(x, _)| x)
    }

    /// Gets the big-endian encodings of the affine (x, y) coordinates of
    /// this point, or `None` for the point-at-infinity.
    pub fn x_y_bytes(self) -> Option<([u8; 32], [u8; 32])> {
        let bb = self.encode_uncompressed();
        if bb[0] == 0 {
            return None;
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bb[1..33]);
        y.copy_from_slice(&bb[33..65]);
        Some((x, y))
    }

    /// Sets this instance from the provided affine coordinates.
    ///
    /// If the coordinates designate a valid curve point, then the
    /// function returns 0xFFFFFFFF; otherwise, this instance is set to
    /// the neutral, and the function returns 0x00000000.
    pub fn set_affine(&mut self, x: GFp, y: GFp) -> u32 {
        *self = Self::NEUTRAL;
        let y2 = x * x.square() + Self::B;
        let r = y.square().equals(y2);
        self.X.set_cond(&x, r);
        self.Y.set_cond(&y, r);
        self.Z.set_cond(&GFp::ONE, r);
        r
    }

    /// Creates an instance from the provided affine coordinates.
    ///
    /// The coordinates are verified to comply with the curve equation;
    /// if they do not, then `None` is returned.
    ///
    /// Note: whether the point is on the curve or not may leak through
    /// side channels; however, the actual value of the point should not
    /// leak.
    pub fn from_affine(x: GFp, y: GFp) -> Option<Self> {
        let mut P = Self::NEUTRAL;
        if P.set_affine(x, y) != 0 {
            Some(P)
        } else {
            None
        }
    }

    /// Normalizes the internal representation of this point so that
    /// Z = 1 (or Z = 0 for the neutral, which also keeps X = 0, Y = 1).
    pub fn set_rescale(&mut self) {
        let zn = self.isneutral();
        let iZ = GFp::ONE / self.Z;  // this is 0 if Z = 0
        self.X *= iZ;
        self.Y *= iZ;
        self.Y.set_cond(&GFp::ONE, zn);
        self.Z = GFp::select(&GFp::ONE, &GFp::ZERO, zn);
    }

    /// Returns this point with Z = 1 (see `set_rescale()`).
    #[inline(always)]
    pub fn rescale(self) -> Self {
        let mut r = self;
        r.set_rescale();
        r
    }

    /// Adds point `rhs` to `self`.
    fn set_add(&mut self, rhs: &Self) {
        let (X1, Y1, Z1) = (&self.X, &self.Y, &self.Z);
        let (X2, Y2, Z2) = (&rhs.X, &rhs.Y, &rhs.Z);

        // Formulas from Renes-Costello-Batina 2016:
        // https://eprint.iacr.org/2015/1060
        // (algorithm 7, with some renaming and expression compaction)
        let x1x2 = X1 * X2;
        let y1y2 = Y1 * Y2;
        let z1z2 = Z1 * Z2;
        let C = (X1 + Y1) * (X2 + Y2) - x1x2 - y1y2;  // X1*Y2 + X2*Y1
        let D = (Y1 + Z1) * (Y2 + Z2) - y1y2 - z1z2;  // Y1*Z2 + Y2*Z1
        let E = (X1 + Z1) * (X2 + Z2) - x1x2 - z1z2;  // X1*Z2 + X2*Z1
        let F = x1x2.mul3();
        let G = z1z2.mul21();
        let H = y1y2 + G;
        let I = y1y2 - G;
        let J = E.mul21();
        let X3 = C * I - D * J;
        let Y3 = J * F + I * H;
        let Z3 = H * D + F * C;

        self.X = X3;
        self.Y = Y3;
        self.Z = Z3;
    }

    /// Adds the affine point `rhs` to `self`.
    ///
    /// If the point to add is the neutral, then `rhs.x` and `rhs.y` can
    /// be arbitrary, and `rz` is 0xFFFFFFFF; otherwise, `rhs.x` and `rhs.y`
    /// are the affine coordinates of the point to add, and `rz` is
    /// 0x00000000.
    fn set_add_affine(&mut self, rhs: &PointAffine, rz: u32) {
        let (X1, Y1, Z1) = (&self.X, &self.Y, &self.Z);
        let (X2, Y2) = (&rhs.x, &rhs.y);

        // Same formulas as in set_add(), but modified to account for
        // Z2 = 1 (implicitly). The mixed formulas are NOT complete: when
        // the affine operand is the neutral, the computed output is
        // garbage and must be discarded (conditional select on rz).
        let x1x2 = X1 * X2;
        let y1y2 = Y1 * Y2;
        let C = (X1 + Y1) * (X2 + Y2) - x1x2 - y1y2;  // X1*Y2 + X2*Y1
        let D = Y2 * Z1 + Y1;                         // Y1*Z2 + Y2*Z1
        let E = X2 * Z1 + X1;                         // X1*Z2 + X2*Z1
        let F = x1x2.mul3();
        let G = Z1.mul21();
        let H = y1y2 + G;
        let I = y1y2 - G;
        let J = E.mul21();
        let X3 = C * I - D * J;
        let Y3 = J * F + I * H;
        let Z3 = H * D + F * C;

        // If rhs is the neutral, then we computed the wrong output and
        // we must fix it, namely by discarding the computed values in
        // that case.
        self.X.set_cond(&X3, !rz);
        self.Y.set_cond(&Y3, !rz);
        self.Z.set_cond(&Z3, !rz);
    }

    /// Doubles this point (in place).
    ///
    /// This function is somewhat faster than using plain point addition.
    pub fn set_double(&mut self) {
        let (X, Y, Z) = (&self.X, &self.Y, &self.Z);

        // Formulas from Renes-Costello-Batina 2016:
        // https://eprint.iacr.org/2015/1060
        // (algorithm 9, with some renaming and expression compaction)
        let yy = Y.square();
        let yy8 = yy.mul8();
        let C = Z.square().mul21();
        let Z3 = Y * Z * yy8;
        let D = yy - C.mul3();
        let Y3 = D * (yy + C) + C * yy8;
        let X3 = (D * X * Y).mul2();

        self.X = X3;
        self.Y = Y3;
        self.Z = Z3;
    }

    /// Doubles this point.
    ///
    /// This function is somewhat faster than using plain point addition.
    #[inline(always)]
    pub fn double(self) -> Self {
        let mut r = self;
        r.set_double();
        r
    }

    /// Doubles this point n times (in place).
    pub fn set_xdouble(&mut self, n: u32) {
        for _ in 0..n {
            self.set_double();
        }
    }

    /// Doubles this point n times.
    #[inline(always)]
    pub fn xdouble(self, n: u32) -> Self {
        let mut r = self;
        r.set_xdouble(n);
        r
    }

    /// Negates this point (in place).
    #[inline(always)]
    pub fn set_neg(&mut self) {
        self.Y.set_neg();
    }

    /// Subtracts point `rhs` from `self`.
    fn set_sub(&mut self, rhs: &Self) {
        self.set_add(&-rhs);
    }

    /// Compares two points for equality.
    ///
    /// Returned value is 0xFFFFFFFF if the two points are equal,
    /// 0x00000000 otherwise.
    #[inline]
    pub fn equals(self, rhs: Self) -> u32 {
        // If both points are non-neutral, then their Zs are non-zero
        // and we check that their affine coordinates match.
        // Since Y != 0 for all points, the test on Y cannot match between
        // a neutral and a non-neutral point.
        (self.X * rhs.Z).equals(rhs.X * self.Z)
        & (self.Y * rhs.Z).equals(rhs.Y * self.Z)
    }

    /// Tests whether this point is the neutral (point-at-infinity).
    ///
    /// Returned value is 0xFFFFFFFF for the neutral, 0x00000000 otherwise.
    #[inline(always)]
    pub fn isneutral(self) -> u32 {
        self.Z.iszero()
    }

    /// Tests whether the affine y-coordinate of this point is odd.
    ///
    /// Returned value is 0xFFFFFFFF when y is odd, 0x00000000 otherwise
    /// (including for the neutral, which has no affine coordinates).
    pub fn has_odd_y(self) -> u32 {
        let (_, y, _) = self.to_affine();
        y.isodd()
    }

    /// Conditionally copies the provided point (`P`) into `self`.
    ///
    ///  - If `ctl` is 0xFFFFFFFF, then the value of `P` is copied into
    ///    `self`.
    ///
    ///  - If `ctl` is 0x00000000, then the value of `self` is unchanged.
    ///
    /// Value `ctl` MUST be either 0x00000000 or 0xFFFFFFFF.
    #[inline]
    pub fn set_cond(&mut self, P: &Self, ctl: u32) {
        self.X.set_cond(&P.X, ctl);
        self.Y.set_cond(&P.Y, ctl);
        self.Z.set_cond(&P.Z, ctl);
    }

    /// Returns a point equal to `P0` (if `ctl` = 0x00000000) or `P1` (if
    /// `ctl` = 0xFFFFFFFF).
    ///
    /// Value `ctl` MUST be either 0x00000000 or 0xFFFFFFFF.
    #[inline(always)]
    pub fn select(P0: &Self, P1: &Self, ctl: u32) -> Self {
        let mut P = *P0;
        P.set_cond(P1, ctl);
        P
    }

    /// Conditionally negates this point.
    ///
    /// This point is negated if `ctl` = 0xFFFFFFFF, but kept unchanged
    /// if `ctl` = 0x00000000.
    ///
    /// Value `ctl` MUST be either 0x00000000 or 0xFFFFFFFF.
    #[inline]
    pub fn set_condneg(&mut self, ctl: u32) {
        self.Y.set_cond(&-self.Y, ctl);
    }

    // GLV endomorphism
    // ================
    //
    // Let beta be a cube root of 1 modulo p. The function
    // zeta(x, y) = (beta*x, y) is an endomorphism over the curve;
    // moreover, zeta(P) = lambda*P for the value lambda which is a cube
    // root of 1 modulo n (the curve order). The decomposition of a
    // scalar k into half-width k1 and k2 such that k = k1 + k2*lambda
    // is implemented on the Scalar type (`split_glv()` and
    // `split_glv_vartime()`); the corresponding point transformation
    // lives here.

    const BETA: GFp = GFp::w64be(
        0x7AE96A2B657C0710, 0x6E64479EAC3434E9,
        0x9CF0497512F58995, 0xC1396C28719501EE);

    /// Endomorphism on the group: zeta(x, y) = (beta*x, y), equal to
    /// multiplication by the scalar lambda.
    fn zeta(self) -> Self {
        Self {
            X: self.X * Self::BETA,
            Y: self.Y,
            Z: self.Z,
        }
    }

    /// Rebuilds an ephemeral-point candidate from the signature scalar
    /// `r` and a recovery identifier.
    ///
    /// Bit 0 of `recovery_id` selects the parity of the y-coordinate;
    /// bit 1 indicates that the original x-coordinate had been reduced
    /// modulo n, i.e. that the true x is r + n. An error is reported if
    /// the identifier is not in the 0 to 3 range, if bit 1 is set while
    /// r + n >= p, or if the rebuilt x is not the abscissa of any curve
    /// point.
    ///
    /// This function is not constant-time; signature values are public.
    pub fn recover(r: &Scalar, recovery_id: u8) -> Result<Self, Error> {
        if recovery_id > 3 {
            return Err(Error::InvalidRecoveryId);
        }

        // r < n < p: the scalar bytes always decode as a field element.
        let rb = r.encode32();
        let (mut x, _) = GFp::decode32(&rb);

        if (recovery_id & 2) != 0 {
            // The true x was r + n; it exists only if r < p - n.
            let r0 = u64::from_le_bytes(*<&[u8; 8]>::try_from(&rb[ 0.. 8]).unwrap());
            let r1 = u64::from_le_bytes(*<&[u8; 8]>::try_from(&rb[ 8..16]).unwrap());
            let r2 = u64::from_le_bytes(*<&[u8; 8]>::try_from(&rb[16..24]).unwrap());
            let r3 = u64::from_le_bytes(*<&[u8; 8]>::try_from(&rb[24..32]).unwrap());
            let (_, cc) = crate::backend::subborrow_u64(r0, Self::P_MINUS_N[0], 0);
            let (_, cc) = crate::backend::subborrow_u64(r1, Self::P_MINUS_N[1], cc);
            let (_, cc) = crate::backend::subborrow_u64(r2, Self::P_MINUS_N[2], cc);
            let (_, cc) = crate::backend::subborrow_u64(r3, Self::P_MINUS_N[3], cc);
            if cc == 0 {
                return Err(Error::InvalidRecoveryId);
            }
            x += Self::N_FE;
        }

        // Lift x; take the even root, then fix the parity.
        let (mut y, ok) = (x * x.square() + Self::B).sqrt();
        if ok == 0 {
            return Err(Error::InvalidPoint);
        }
        y.set_cond(&-y, ((recovery_id & 1) as u32).wrapping_neg());

        Ok(Self { X: x, Y: y, Z: GFp::ONE })
    }

    /// Multiplies this point by a scalar (in place).
    ///
    /// This operation is constant-time with regard to both the point
    /// and the scalar value. It uses a 4-bit window of multiples of the
    /// point, processed nibble by nibble from the most significant end
    /// of the scalar; the constant-time window lookup absorbs zero
    /// nibbles by adding the neutral (the complete formulas make that a
    /// no-op).
    pub fn set_mul(&mut self, n: &Scalar) {
        // Precompute small multiples of P, 1P..15P. Past this point it
        // is safe to trample over self.
        let tbl = ProjectiveWindow::make(self);

        let sb = bswap32(&n.encode32());
        *self = Self::NEUTRAL;
        for i in 0..32 {
            // Skip the very first set of doubles: the accumulator is
            // still the point-at-infinity.
            if i != 0 {
                self.set_xdouble(4);
            }
            tbl.set_select_add(self, (sb[i] >> 4) as u32);
            self.set_xdouble(4);
            tbl.set_select_add(self, (sb[i] & 0x0F) as u32);
        }
    }

    /// Multiplies this point by a scalar.
    ///
    /// This operation is constant-time with regard to both the point
    /// and the scalar value.
    #[inline(always)]
    pub fn mul(self, n: &Scalar) -> Self {
        let mut r = self;
        r.set_mul(n);
        r
    }

    /// Sets this point by multiplying the conventional generator by the
    /// provided scalar.
    ///
    /// This operation is constant-time. It is much faster than the
    /// generic multiplication on `Self::BASE`: the two nibbles of each
    /// scalar byte address two independent precomputed windows whose
    /// bases differ by a factor 16, so the whole operation is 64 masked
    /// mixed additions with no doubling at all.
    pub fn set_mulgen(&mut self, n: &Scalar) {
        let tbl = generator_table();

        let sb = bswap32(&n.encode32());
        *self = Self::NEUTRAL;
        let mut t = 64;
        for i in 0..32 {
            t -= 1;
            self.set_lookup_affine_add(&tbl.0[t], (sb[i] >> 4) as u32);
            t -= 1;
            self.set_lookup_affine_add(&tbl.0[t], (sb[i] & 0x0F) as u32);
        }
    }

    /// Creates a point by multiplying the conventional generator by the
    /// provided scalar (constant-time).
    #[inline]
    pub fn mulgen(n: &Scalar) -> Self {
        let mut P = Self::NEUTRAL;
        P.set_mulgen(n);
        P
    }

    /// Creates a point by multiplying the conventional generator by the
    /// provided scalar, in variable time. The same windows as in
    /// `mulgen()` are used, but lookups are direct array accesses and
    /// zero nibbles are skipped.
    ///
    /// THIS FUNCTION IS NOT CONSTANT-TIME; it shall be used only with
    /// public scalars.
    pub fn mulgen_vartime(n: &Scalar) -> Self {
        let tbl = generator_table();

        let sb = bswap32(&n.encode32());
        let mut P = Self::NEUTRAL;
        let mut t = 64;
        for i in 0..32 {
            t -= 1;
            P.set_lookup_affine_add_vartime(&tbl.0[t], (sb[i] >> 4) as u32);
            t -= 1;
            P.set_lookup_affine_add_vartime(&tbl.0[t], (sb[i] & 0x0F) as u32);
        }
        P
    }

    /// Multiplies this point by a scalar (in place), in variable time,
    /// using the curve endomorphism: the scalar is split into two
    /// half-width parts processed with two 4-bit windows (over P and
    /// zeta(P)), four doublings and up to two additions per nibble.
    ///
    /// THIS FUNCTION IS NOT CONSTANT-TIME; it shall be used only with
    /// public data.
    pub fn set_mul_vartime_glv(&mut self, n: &Scalar) {
        // Split the scalar; pick the shorter representation of each half
        // by negating both the half and its point when needed.
        let (mut k1, mut k2) = n.split_glv_vartime();
        let mut P1 = *self;
        let mut P2 = self.zeta();
        if k1.is_greater_than_half_n() != 0 {
            k1.set_neg();
            P1.set_neg();
        }
        if k2.is_greater_than_half_n() != 0 {
            k2.set_neg();
            P2.set_neg();
        }

        let tbl1 = ProjectiveWindow::make(&P1);
        let tbl2 = ProjectiveWindow::make(&P2);

        *self = Self::NEUTRAL;

        // Both halves fit in 128 bits; skip their common leading zero
        // bytes (at least 16 of them).
        let b1 = bswap32(&k1.encode32());
        let b2 = bswap32(&k2.encode32());
        let mut off = 15;
        loop {
            if b1[off] != 0 || b2[off] != 0 {
                break;
            }
            off += 1;
            if off == 32 {
                // k1 = k2 = 0, hence n*P = infinity.
                return;
            }
        }

        for i in off..32 {
            if i != off {
                self.set_xdouble(4);
            }
            tbl1.set_select_add_vartime(self, (b1[i] >> 4) as u32);
            tbl2.set_select_add_vartime(self, (b2[i] >> 4) as u32);
            self.set_xdouble(4);
            tbl1.set_select_add_vartime(self, (b1[i] & 0x0F) as u32);
            tbl2.set_select_add_vartime(self, (b2[i] & 0x0F) as u32);
        }
    }

    /// Multiplies this point by a scalar, in variable time (see
    /// `set_mul_vartime_glv()`).
    ///
    /// THIS FUNCTION IS NOT CONSTANT-TIME; it shall be used only with
    /// public data.
    #[inline(always)]
    pub fn mul_vartime_glv(self, n: &Scalar) -> Self {
        let mut r = self;
        r.set_mul_vartime_glv(n);
        r
    }

    /// Given scalars `u` and `v`, returns the point `u*self + v*G`
    /// (with `G` being the conventional generator point, aka
    /// `Self::BASE`).
    ///
    /// The fixed-base and endomorphism-split variable-base multiplies
    /// are computed separately and added; with the window configuration
    /// used here this is faster than an interleaved Shamir-Strauss
    /// ladder. This function is the hot path of signature verification.
    ///
    /// THIS FUNCTION IS NOT CONSTANT-TIME; it shall be used only with
    /// public data.
    pub fn mul_add_mulgen_vartime(self, u: &Scalar, v: &Scalar) -> Self {
        self.mul_vartime_glv(u) + Self::mulgen_vartime(v)
    }

    /// Lookups a point from an affine window (constant-time) and adds it
    /// to this point, masking the incomplete mixed formulas when the
    /// index is zero.
    #[inline]
    fn set_lookup_affine_add(&mut self, win: &AffineWindow, k: u32) {
        let (P, rz) = win.lookup(k);
        self.set_add_affine(&P, rz);
    }

    /// Adds the entry of index `k` from an affine window to this point,
    /// in variable time. An index of zero is a no-op.
    #[inline]
    fn set_lookup_affine_add_vartime(&mut self, win: &AffineWindow, k: u32) {
        if k == 0 {
            return;
        }
        self.set_add_affine(&win.0[(k - 1) as usize], 0);
    }

    /// Multiplies this point by a scalar with the plain double-and-add
    /// ladder. Reference implementation used to cross-check the window
    /// multipliers.
    #[cfg(test)]
    pub(crate) fn mul_trivial(self, n: &Scalar) -> Self {
        let sb = bswap32(&n.encode32());
        let mut r = Self::NEUTRAL;
        for i in 0..32 {
            for j in (0..8).rev() {
                r.set_double();
                if ((sb[i] >> j) & 1) != 0 {
                    r.set_add(&self);
                }
            }
        }
        r
    }
}

// ========================================================================
// Precomputed windows.

/// Window of the 15 projective multiples [1P, ... 15P] of a point, with
/// 0P supported implicitly by the lookup. The Z-coordinates of entries
/// are not normalized.
pub(crate) struct ProjectiveWindow([Point; 15]);

impl ProjectiveWindow {

    /// Builds the window for the multiples of `P`.
    pub(crate) fn make(P: &Point) -> Self {
        let mut tbl = [*P; 15];
        let mut i = 1;
        while i < 15 {
            tbl[i] = tbl[i >> 1].double();
            tbl[i + 1] = tbl[i] + P;
            i += 2;
        }
        Self(tbl)
    }

    /// Sets `sum = sum + k*P` (constant-time). Index `k` MUST be in the
    /// 0 to 15 range. The lookup is a masked linear scan; for k = 0 the
    /// accumulated addend stays the neutral, which the complete addition
    /// formulas absorb.
    pub(crate) fn set_select_add(&self, sum: &mut Point, k: u32) {
        let mut A = Point::NEUTRAL;
        for i in 0..15 {
            // Values a-b and b-a both have their high bit equal to 0
            // only if a == b.
            let j = (i as u32) + 1;
            let w = !(k.wrapping_sub(j) | j.wrapping_sub(k));
            let w = ((w as i32) >> 31) as u32;
            A.set_cond(&self.0[i], w);
        }
        sum.set_add(&A);
    }

    /// Sets `sum = sum + k*P` in variable time. Index `k` MUST be in the
    /// 0 to 15 range.
    pub(crate) fn set_select_add_vartime(&self, sum: &mut Point, k: u32) {
        if k == 0 {
            return;
        }
        sum.set_add(&self.0[(k - 1) as usize]);
    }
}

/// Window of the 15 affine multiples [1P, ... 15P] of a point
/// (Z = 1 implied).
#[derive(Clone, Copy)]
pub(crate) struct AffineWindow([PointAffine; 15]);

impl AffineWindow {

    /// Lookups the entry of index `k` (constant-time). Index `k` MUST be
    /// in the 0 to 15 range. The returned flag is 0xFFFFFFFF when k = 0,
    /// in which case the returned coordinates are conventional filler
    /// and the caller must discard the result of any addition using
    /// them.
    fn lookup(&self, k: u32) -> (PointAffine, u32) {
        let mut P = PointAffine { x: GFp::ZERO, y: GFp::ONE };
        for i in 0..15 {
            let j = (i as u32) + 1;
            let w = !(k.wrapping_sub(j) | j.wrapping_sub(k));
            let w = ((w as i32) >> 31) as u32;
            P.x.set_cond(&self.0[i].x, w);
            P.y.set_cond(&self.0[i].y, w);
        }
        let fz = (((k as i32) - 1) >> 8) as u32;
        (P, fz)
    }
}

// ========================================================================
// Generator table.
//
// The fixed-base multipliers use 64 interleaved affine windows: window t
// (0 <= t < 64) holds the multiples [1B, ... 15B] of B = (2^(4*t))*G. The
// table weighs about 60 kB and is built exactly once, then shared
// (read-only) by all threads.

pub(crate) struct GeneratorTable([AffineWindow; 64]);

// Serialized blob geometry: 32 "huge" windows (one per scalar byte) of
// 255 points each, every point as x || y in big-endian, 32 bytes per
// coordinate.
const BLOB_LEN: usize = 32 * 255 * 64;

impl GeneratorTable {

    /// Computes the table from the generator: each window is a chain of
    /// 15 complete additions, and the base is multiplied by 16 between
    /// windows. All 960 points are normalized to affine coordinates with
    /// a single batched inversion.
    fn from_generator() -> Box<Self> {
        let mut pts = vec![Point::NEUTRAL; 64 * 15];
        let mut B = Point::BASE;
        for t in 0..64 {
            pts[15 * t] = B;
            for j in 1..15 {
                pts[15 * t + j] = pts[15 * t + j - 1] + B;
            }
            B = pts[15 * t + 14] + B;
        }

        let mut zs: Vec<GFp> = pts.iter().map(|P| P.Z).collect();
        GFp::batch_invert(&mut zs);

        let mut tbl = Self::empty();
        for t in 0..64 {
            for j in 0..15 {
                let P = &pts[15 * t + j];
                let iz = &zs[15 * t + j];
                tbl.0[t].0[j] = PointAffine { x: P.X * iz, y: P.Y * iz };
            }
        }
        tbl
    }

    /// Deserializes the table from the embedded-blob layout (32 huge
    /// windows of 255 affine points each). Even in-memory windows take
    /// the first 15 entries of a huge window; odd windows take the
    /// entries of index 16*j + 15, i.e. the multiples of 16 times the
    /// huge window's base. Panics if the blob does not have the expected
    /// length or contains a non-canonical coordinate.
    pub(crate) fn from_blob(blob: &[u8]) -> Box<Self> {
        assert!(blob.len() == BLOB_LEN,
            "generator table blob has invalid length");

        fn decode_entry(b: &[u8]) -> PointAffine {
            let (x, rx) = GFp::decode32(&bswap32(&b[0..32]));
            let (y, ry) = GFp::decode32(&bswap32(&b[32..64]));
            assert!((rx & ry) != 0,
                "generator table blob contains a corrupt coordinate");
            PointAffine { x, y }
        }

        let mut tbl = Self::empty();
        for i in 0..32 {
            let base = i * 255 * 64;
            for j in 0..15 {
                tbl.0[2 * i].0[j] =
                    decode_entry(&blob[base + 64 * j..base + 64 * j + 64]);
                let k = 16 * (j + 1) - 1;
                tbl.0[2 * i + 1].0[j] =
                    decode_entry(&blob[base + 64 * k..base + 64 * k + 64]);
            }
        }
        tbl
    }

    fn empty() -> Box<Self> {
        let filler = PointAffine { x: GFp::ZERO, y: GFp::ONE };
        Box::new(Self([AffineWindow([filler; 15]); 64]))
    }
}

static GENERATOR_TABLE: OnceLock<Box<GeneratorTable>> = OnceLock::new();

/// Gets the shared generator table, building it from the generator on
/// first use.
fn generator_table() -> &'static GeneratorTable {
    &**GENERATOR_TABLE.get_or_init(GeneratorTable::from_generator)
}

/// Installs the generator table from its serialized blob form, if the
/// table has not been built yet (otherwise this is a no-op; the table is
/// immutable once published). Panics if the blob is malformed.
pub fn init_generator_table_from_blob(blob: &[u8]) {
    let _ = GENERATOR_TABLE.get_or_init(|| GeneratorTable::from_blob(blob));
}

// ========================================================================

impl Add<Point> for Point {
    type Output = Point;

    #[inline(always)]
    fn add(self, other: Point) -> Point {
        let mut r = self;
        r.set_add(&other);
        r
    }
}

impl Add<&Point> for Point {
    type Output = Point;

    #[inline(always)]
    fn add(self, other: &Point) -> Point {
        let mut r = self;
        r.set_add(other);
        r
    }
}

impl Add<Point> for &Point {
    type Output = Point;

    #[inline(always)]
    fn add(self, other: Point) -> Point {
        let mut r = *self;
        r.set_add(&other);
        r
    }
}

impl Add<&Point> for &Point {
    type Output = Point;

    #[inline(always)]
    fn add(self, other: &Point) -> Point {
        let mut r = *self;
        r.set_add(other);
        r
    }
}

impl AddAssign<Point> for Point {
    #[inline(always)]
    fn add_assign(&mut self, other: Point) {
        self.set_add(&other);
    }
}

impl AddAssign<&Point> for Point {
    #[inline(always)]
    fn add_assign(&mut self, other: &Point) {
        self.set_add(other);
    }
}

impl Mul<Scalar> for Point {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: Scalar) -> Point {
        let mut r = self;
        r.set_mul(&other);
        r
    }
}

impl Mul<&Scalar> for Point {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: &Scalar) -> Point {
        let mut r = self;
        r.set_mul(other);
        r
    }
}

impl Mul<Scalar> for &Point {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: Scalar) -> Point {
        let mut r = *self;
        r.set_mul(&other);
        r
    }
}

impl Mul<&Scalar> for &Point {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: &Scalar) -> Point {
        let mut r = *self;
        r.set_mul(other);
        r
    }
}

impl MulAssign<Scalar> for Point {
    #[inline(always)]
    fn mul_assign(&mut self, other: Scalar) {
        self.set_mul(&other);
    }
}

impl MulAssign<&Scalar> for Point {
    #[inline(always)]
    fn mul_assign(&mut self, other: &Scalar) {
        self.set_mul(other);
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: Point) -> Point {
        let mut r = other;
        r.set_mul(&self);
        r
    }
}

impl Mul<&Point> for Scalar {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: &Point) -> Point {
        let mut r = *other;
        r.set_mul(&self);
        r
    }
}

impl Mul<Point> for &Scalar {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: Point) -> Point {
        let mut r = other;
        r.set_mul(self);
        r
    }
}

impl Mul<&Point> for &Scalar {
    type Output = Point;

    #[inline(always)]
    fn mul(self, other: &Point) -> Point {
        let mut r = *other;
        r.set_mul(self);
        r
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline(always)]
    fn neg(self) -> Point {
        let mut r = self;
        r.set_neg();
        r
    }
}

impl Neg for &Point {
    type Output = Point;

    #[inline(always)]
    fn neg(self) -> Point {
        let mut r = *self;
        r.set_neg();
        r
    }
}

impl Sub<Point> for Point {
    type Output = Point;

    #[inline(always)]
    fn sub(self, other: Point) -> Point {
        let mut r = self;
        r.set_sub(&other);
        r
    }
}

impl Sub<&Point> for Point {
    type Output = Point;

    #[inline(always)]
    fn sub(self, other: &Point) -> Point {
        let mut r = self;
        r.set_sub(other);
        r
    }
}

impl Sub<Point> for &Point {
    type Output = Point;

    #[inline(always)]
    fn sub(self, other: Point) -> Point {
        let mut r = *self;
        r.set_sub(&other);
        r
    }
}

impl Sub<&Point> for &Point {
    type Output = Point;

    #[inline(always)]
    fn sub(self, other: &Point) -> Point {
        let mut r = *self;
        r.set_sub(other);
        r
    }
}

impl SubAssign<Point> for Point {
    #[inline(always)]
    fn sub_assign(&mut self, other: Point) {
        self.set_sub(&other);
    }
}

impl SubAssign<&Point> for Point {
    #[inline(always)]
    fn sub_assign(&mut self, other: &Point) {
        self.set_sub(other);
    }
}

// ========================================================================

#[cfg(test)]
mod tests {

    use super::{Point, GeneratorTable, generator_table, bswap32};
    use crate::field::{GFp, Scalar};
    use crate::Error;
    use sha2::{Sha256, Digest};

    // For a point P (randomly generated on the curve with Sage),
    // points i*P for i = 0 to 6, encoded (compressed).
    // (Point 0*P is here represented as 33 bytes of value 0x00.)
    const EPC: [&str; 7] = [
        "000000000000000000000000000000000000000000000000000000000000000000",
        "0285fc56c5d6ccd98a3d6114ab0c8b09cd5e8fd90d6c966ed9f9e192b2f7394288",
        "021e150e1008663caab354d92455310acf5a51d14ccaeb1becb148d7dd797ea55a",
        "02600c54b96805c8adf711ecf035effb42609f4ce58012bef1a68ce643225b6dbf",
        "02caa244ddbf5ed5cb1384a4689eeccaaa084080aa53cca34bc52fbc90a53eb1e1",
        "036bd1675d2445c184e0cd49ed125e98896bb6f0bbd01f3f49df67c8ba58d5e616",
        "0356ffc19eaed6d46bd73a0e3fb47759c9fa58ff10a637f4bf5e1e96e208ad4266",
    ];

    // Same points, but with uncompressed encoding.
    const EPU: [&str; 7] = [
        "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
        "0485fc56c5d6ccd98a3d6114ab0c8b09cd5e8fd90d6c966ed9f9e192b2f73942889b5987ff8b5b16128643b83df26ff76624456270e86b4fe492130f613b950472",
        "041e150e1008663caab354d92455310acf5a51d14ccaeb1becb148d7dd797ea55a233af450e5463a913a53e3ccfc927794b86c439d43ad3152d1b1053c16269b32",
        "04600c54b96805c8adf711ecf035effb42609f4ce58012bef1a68ce643225b6dbfc8458ccba641b7180d47e9c064cb6cf49ed6267dbc4ca4a0b6b59cddf307c1f6",
        "04caa244ddbf5ed5cb1384a4689eeccaaa084080aa53cca34bc52fbc90a53eb1e119d027562b0631e97735b7718890af1118199712d473632c594a56648e89d044",
        "046bd1675d2445c184e0cd49ed125e98896bb6f0bbd01f3f49df67c8ba58d5e616a0102adbee273b6ba30266c336ec5cc2ba3d3b25cbd693aad4720f729e6b5f81",
        "0456ffc19eaed6d46bd73a0e3fb47759c9fa58ff10a637f4bf5e1e96e208ad426642dadd63f7cb8b3b0f77345d98eadf4bbc71e06b6c5186eeaa55291f1328db0f",
    ];

    fn pseudorandom_scalar(sh: &mut Sha256, tag: u64) -> Scalar {
        sh.update(tag.to_le_bytes());
        let v: [u8; 32] = sh.finalize_reset().into();
        Scalar::decode_reduce(&v)
    }

    #[test]
    fn base_arith() {
        let P0 = Point::decode(&[0u8]).unwrap();
        assert!(P0.isneutral() == 0xFFFFFFFF);

        let mut PP = [P0; 7];
        for i in 1..7 {
            let epc = hex::decode(EPC[i]).unwrap();
            let epu = hex::decode(EPU[i]).unwrap();
            let P = Point::decode(&epc).unwrap();
            let Q = Point::decode(&epu).unwrap();
            assert!(P.isneutral() == 0);
            assert!(Q.isneutral() == 0);
            assert!(P.equals(Q) == 0xFFFFFFFF);
            assert!(P.encode_compressed()[..] == epc[..]);
            assert!(P.encode_uncompressed()[..] == epu[..]);
            PP[i] = P;
        }

        let (P1, P2, P3, P4, P5, P6) = (PP[1], PP[2], PP[3], PP[4], PP[5], PP[6]);

        for i in 1..7 {
            assert!(PP[i].equals(PP[i - 1]) == 0);
            let Q = PP[i - 1] + PP[1];
            assert!(PP[i].equals(Q) == 0xFFFFFFFF);
            assert!((Q + Point::NEUTRAL).equals(Q) == 0xFFFFFFFF);
            let R = Q + P0;
            assert!(PP[i].equals(R) == 0xFFFFFFFF);
        }

        let Q2 = P1 + P1;
        assert!(Q2.equals(P2) == 0xFFFFFFFF);
        let R2 = P1.double();
        assert!(R2.equals(P2) == 0xFFFFFFFF);

        let Q3 = P2 + P1;
        assert!(Q3.equals(P3) == 0xFFFFFFFF);
        let R3 = Q2 + P1;
        assert!(R3.equals(P3) == 0xFFFFFFFF);

        let Q4 = Q2.double();
        assert!(Q4.equals(P4) == 0xFFFFFFFF);
        let R4 = P1.xdouble(2);
        assert!(R4.equals(P4) == 0xFFFFFFFF);
        assert!((P1 + Q3).equals(Q4) == 0xFFFFFFFF);

        let Q5 = Q3 + R2;
        assert!(Q5.equals(P5) == 0xFFFFFFFF);
        assert!((Q5 - Q3).equals(Q2) == 0xFFFFFFFF);

        let Q6 = Q3.double();
        assert!(Q6.equals(P6) == 0xFFFFFFFF);
        assert!((Q2 + Q4).equals(Q6) == 0xFFFFFFFF);

        // P + (-P) = infinity; P - P = infinity.
        assert!((P3 + (-P3)).isneutral() == 0xFFFFFFFF);
        assert!((P5 - P5).isneutral() == 0xFFFFFFFF);

        // Rescaling does not change the point.
        let S = (P4 + P5).rescale();
        assert!(S.equals(P4 + P5) == 0xFFFFFFFF);
        assert!(Point::NEUTRAL.rescale().isneutral() == 0xFFFFFFFF);
    }

    #[test]
    fn decode_reject() {
        // Generator round-trips, both formats.
        let gc = Point::BASE.encode_compressed();
        assert!(Point::decode(&gc).unwrap().equals(Point::BASE) == 0xFFFFFFFF);
        assert!(Point::decode(&gc).unwrap().encode_compressed() == gc);
        let gu = Point::BASE.encode_uncompressed();
        assert!(Point::decode(&gu).unwrap().equals(Point::BASE) == 0xFFFFFFFF);
        assert!(Point::decode(&gu).unwrap().encode_uncompressed() == gu);

        // Wrong lengths.
        assert!(Point::decode(&[]).is_none());
        assert!(Point::decode(&gc[..32]).is_none());
        assert!(Point::decode(&gu[..64]).is_none());
        let mut long = [0u8; 66];
        long[..65].copy_from_slice(&gu);
        assert!(Point::decode(&long).is_none());

        // Wrong prefixes.
        let mut bad = gc;
        bad[0] = 0x05;
        assert!(Point::decode(&bad).is_none());
        let mut bad = gu;
        bad[0] = 0x02;
        assert!(Point::decode(&bad).is_none());
        assert!(Point::decode(&[1u8]).is_none());

        // All-zero fixed-size encodings are not valid.
        assert!(Point::decode(&[0u8; 33]).is_none());
        assert!(Point::decode(&[0u8; 65]).is_none());

        // x >= p is rejected (compressed).
        let mut bad = [0xFFu8; 33];
        bad[0] = 0x02;
        assert!(Point::decode(&bad).is_none());

        // x not on the curve: x = 5 has no square root for y.
        let mut bad = [0u8; 33];
        bad[0] = 0x02;
        bad[32] = 5;
        assert!(Point::decode(&bad).is_none());

        // Uncompressed point with mismatched y.
        let mut bad = gu;
        bad[64] ^= 1;
        assert!(Point::decode(&bad).is_none());
    }

    #[test]
    fn mulgen() {
        // Test vector generated randomly with Sage.
        let s = Scalar::w64be(0xF0FCA55C06488D1C, 0x6CA454ED29573B6C,
                              0x89D4F76592F96F10, 0x98BD4A5F08DF863E);
        let enc = hex::decode(
            "0208289c906282497194389ea32bd63518adeae84c179fea6fd2531a71144c94fa")
            .unwrap();

        let R = Point::decode(&enc).unwrap();
        let P = Point::BASE * s;
        assert!(P.equals(R) == 0xFFFFFFFF);
        assert!(P.encode_compressed()[..] == enc[..]);
        let Q = Point::mulgen(&s);
        assert!(Q.equals(R) == 0xFFFFFFFF);
        let V = Point::mulgen_vartime(&s);
        assert!(V.equals(R) == 0xFFFFFFFF);
    }

    #[test]
    fn mul_known_answer() {
        // xn * a for a fixed point a and scalar xn, cross-checked
        // against an independent implementation.
        let a = Point::decode(&hex::decode(
            "046d98654457ff52b8cf1b81265b802a5ba97f9263b1e880449335132591bc450a\
             535c59f7325e5d2bc391fbe83c12787c337e4a98e82a90110123ba37dd769c7d")
            .unwrap()).unwrap();
        let mut xnb = hex::decode(
            "649d4f77c4242df77f2079c914530327a31b876ad2d8ce2a2236d5c6d7b2029b")
            .unwrap();
        xnb.reverse();
        let xn = Scalar::decode(&xnb).unwrap();
        let b = Point::decode(&hex::decode(
            "04237736844d209dc7098a786f20d06fcd070a38bfc11ac651030043191e2a8786\
             ed8c3b8ec06dd57bd06ea66e45492b0fb84e4e1bfb77e21f96baae2a63dec956")
            .unwrap()).unwrap();

        assert!((a * xn).equals(b) == 0xFFFFFFFF);
        assert!(a.mul_vartime_glv(&xn).equals(b) == 0xFFFFFFFF);
        assert!(a.mul_trivial(&xn).equals(b) == 0xFFFFFFFF);
    }

    #[test]
    fn mul_consistency() {
        // The four multipliers must agree on pseudorandom inputs, and
        // the group laws must hold across them.
        let mut sh = Sha256::new();
        for i in 0..10 {
            let s1 = pseudorandom_scalar(&mut sh, 4 * i + 0);
            let s2 = pseudorandom_scalar(&mut sh, 4 * i + 1);
            let P = Point::mulgen(&pseudorandom_scalar(&mut sh, 4 * i + 2));

            let Q1 = P * s1;
            let Q2 = P.mul_vartime_glv(&s1);
            let Q3 = P.mul_trivial(&s1);
            assert!(Q1.equals(Q2) == 0xFFFFFFFF);
            assert!(Q1.equals(Q3) == 0xFFFFFFFF);

            // (s1 + s2)*P = s1*P + s2*P
            let R1 = P * (s1 + s2);
            let R2 = Q1 + P * s2;
            assert!(R1.equals(R2) == 0xFFFFFFFF);

            // s1*(s2*P) = (s1*s2)*P
            let T1 = (P * s2) * s1;
            let T2 = P * (s1 * s2);
            assert!(T1.equals(T2) == 0xFFFFFFFF);

            // Base-point multipliers agree with the generic one.
            let U1 = Point::mulgen(&s1);
            let U2 = Point::BASE * s1;
            let U3 = Point::mulgen_vartime(&s1);
            assert!(U1.equals(U2) == 0xFFFFFFFF);
            assert!(U1.equals(U3) == 0xFFFFFFFF);

            // Addition is commutative and associative.
            assert!((P + Q1).equals(Q1 + P) == 0xFFFFFFFF);
            assert!(((P + Q1) + U1).equals(P + (Q1 + U1)) == 0xFFFFFFFF);

            // Equality of points matches equality of their compressed
            // encodings.
            assert!(Q1.encode_compressed() == Q2.encode_compressed());
            assert!(P.encode_compressed() != Q1.encode_compressed());
        }

        // Edge scalars.
        let P = Point::mulgen(&pseudorandom_scalar(&mut sh, 9999));
        assert!((P * Scalar::ZERO).isneutral() == 0xFFFFFFFF);
        assert!((P * Scalar::ONE).equals(P) == 0xFFFFFFFF);
        let two = Scalar::ONE + Scalar::ONE;
        assert!((P * two).equals(P.double()) == 0xFFFFFFFF);
        assert!(P.mul_vartime_glv(&Scalar::ZERO).isneutral() == 0xFFFFFFFF);
        assert!(Point::mulgen(&Scalar::ZERO).isneutral() == 0xFFFFFFFF);
    }

    #[test]
    fn mul_add_mulgen() {
        let mut sh = Sha256::new();
        for i in 0..10 {
            let A = Point::mulgen(&pseudorandom_scalar(&mut sh, 3 * i + 0));
            let u = pseudorandom_scalar(&mut sh, 3 * i + 1);
            let v = pseudorandom_scalar(&mut sh, 3 * i + 2);

            // Compute u*A + v*B in two different ways; check that they
            // match.
            let R1 = u * A + Point::mulgen(&v);
            let R2 = A.mul_add_mulgen_vartime(&u, &v);
            assert!(R1.equals(R2) == 0xFFFFFFFF);
        }
    }

    #[test]
    fn glv_endomorphism() {
        // s*P = k1*P + k2*(beta-transformed P) for the split halves.
        let mut sh = Sha256::new();
        for i in 0..10 {
            let s = pseudorandom_scalar(&mut sh, 2 * i + 0);
            let P = Point::mulgen(&pseudorandom_scalar(&mut sh, 2 * i + 1));

            let (k1, k2) = s.split_glv_vartime();
            let R = P * k1 + P.zeta() * k2;
            assert!(R.equals(P * s) == 0xFFFFFFFF);

            // zeta(P) = lambda*P.
            assert!(P.zeta().equals(P * Scalar::LAMBDA) == 0xFFFFFFFF);
        }
    }

    #[test]
    fn recover_candidate() {
        let mut sh = Sha256::new();
        for i in 0..10 {
            let k = pseudorandom_scalar(&mut sh, i);
            let R = Point::mulgen(&k);
            let (x, y, ok) = R.to_affine();
            assert!(ok == 0xFFFFFFFF);

            // x < n for all but a cryptographically negligible fraction
            // of points, so the did-reduce bit is 0 here.
            let (r, dr) = Scalar::decode32_reduce(&x.encode());
            assert!(dr == 0);

            let id = if y.isodd() != 0 { 1 } else { 0 };
            let Q = Point::recover(&r, id).unwrap();
            assert!(Q.equals(R) == 0xFFFFFFFF);

            // The complementary parity recovers the negation.
            let Q2 = Point::recover(&r, id ^ 1).unwrap();
            assert!(Q2.equals(-R) == 0xFFFFFFFF);
        }

        // Recovery id out of range.
        assert!(matches!(Point::recover(&Scalar::ONE, 4),
            Err(Error::InvalidRecoveryId)));

        // Bit 1 demands r + n < p, which fails for any r >= p - n;
        // r = n - 1 is far above p - n (about 2^129).
        let big = -Scalar::ONE;
        assert!(matches!(Point::recover(&big, 2),
            Err(Error::InvalidRecoveryId)));
    }

    #[test]
    fn generator_table_blob() {
        // Serialize the 32 huge windows (255 multiples of (2^(8i))*G
        // each) and check that the deserialized table matches the
        // in-process construction.
        let mut pts = vec![Point::NEUTRAL; 32 * 255];
        let mut B = Point::BASE;
        for i in 0..32 {
            pts[255 * i] = B;
            for j in 1..255 {
                pts[255 * i + j] = pts[255 * i + j - 1] + B;
            }
            B = pts[255 * i + 254] + B;
        }
        let mut blob = vec![0u8; 32 * 255 * 64];
        for (i, P) in pts.iter().enumerate() {
            let (x, y) = P.x_y_bytes().unwrap();
            blob[64 * i..64 * i + 32].copy_from_slice(&x);
            blob[64 * i + 32..64 * i + 64].copy_from_slice(&y);
        }

        let tbl = GeneratorTable::from_blob(&blob);
        let live = generator_table();
        for t in 0..64 {
            for j in 0..15 {
                assert!(tbl.0[t].0[j].x.equals(live.0[t].0[j].x) == 0xFFFFFFFF);
                assert!(tbl.0[t].0[j].y.equals(live.0[t].0[j].y) == 0xFFFFFFFF);
            }
        }
    }

    #[test]
    #[should_panic]
    fn generator_table_blob_corrupt() {
        // A coordinate of value p (non-canonical) must abort the load.
        let mut blob = vec![0u8; 32 * 255 * 64];
        let mut pb = [0xFFu8; 32];
        pb[31] = 0x2F;
        pb[30] = 0xFC;
        pb[27] = 0xFE;
        blob[0..32].copy_from_slice(&pb);
        let _ = GeneratorTable::from_blob(&blob);
    }

    #[test]
    fn affine_access() {
        let s = Scalar::w64le(12345, 0, 0, 0);
        let P = Point::mulgen(&s);
        let (x, y, ok) = P.to_affine();
        assert!(ok == 0xFFFFFFFF);
        let Q = Point::from_affine(x, y).unwrap();
        assert!(Q.equals(P) == 0xFFFFFFFF);

        // x_y_bytes matches the uncompressed encoding.
        let (xb, yb) = P.x_y_bytes().unwrap();
        let ub = P.encode_uncompressed();
        assert!(xb[..] == ub[1..33]);
        assert!(yb[..] == ub[33..65]);
        assert!(P.x_bytes().unwrap() == xb);
        assert!(Point::NEUTRAL.x_bytes().is_none());

        // Off-curve coordinates are refused.
        assert!(Point::from_affine(x, y + GFp::ONE).is_none());

        // Parity probe matches the y encoding.
        let odd = (yb[31] & 1) as u32;
        assert!(P.has_odd_y() == odd.wrapping_neg());

        // bswap is its own inverse.
        let r = bswap32(&bswap32(&xb));
        assert!(r == xb);
    }
}
