//! Strict ASN.1/DER codecs.
//!
//! The grammar handled here is deliberately tiny: the ECDSA signature
//! shape `SEQUENCE { r INTEGER, s INTEGER }` (SEC 1, appendix C.8), the
//! SubjectPublicKeyInfo shape for a named-curve EC public key (SEC 1,
//! appendix C.3), and the BIP-0066 signature-encoding validation rule.
//! The reader enforces DER everywhere: definite, minimally-encoded
//! lengths, minimally-encoded non-negative integers, no trailing bytes.
//!
//! Parsing the variant of SubjectPublicKeyInfo where the curve is
//! spelled out as explicit domain parameters is not, and will not be,
//! supported; the named-curve OID is the only accepted form.

use crate::field::Scalar;
use crate::point::bswap32;
use crate::Error;

// Universal tags used by the shapes above.
const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

// id-ecPublicKey (1.2.840.10045.2.1), DER contents.
const OID_EC_PUBLIC_KEY: [u8; 7] = [ 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01 ];

// secp256k1 (1.3.132.0.10), DER contents.
const OID_SECP256K1: [u8; 5] = [ 0x2B, 0x81, 0x04, 0x00, 0x0A ];

// ========================================================================
// Minimal DER reader.

struct Reader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {

    fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    fn empty(&self) -> bool {
        self.off == self.buf.len()
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        if self.off >= self.buf.len() {
            return Err(Error::InvalidSignatureEncoding);
        }
        let b = self.buf[self.off];
        self.off += 1;
        Ok(b)
    }

    // Reads a TLV with the expected tag; returns the value bytes.
    // Lengths use the definite form, minimally encoded (single byte for
    // 0..=127, 0x81-prefixed for 128..=255; nothing in this module can
    // legitimately be longer).
    fn read_tlv(&mut self, tag: u8) -> Result<&'a [u8], Error> {
        if self.read_byte()? != tag {
            return Err(Error::InvalidSignatureEncoding);
        }
        let l = self.read_byte()?;
        let len = match l {
            0x00..=0x7F => l as usize,
            0x81 => {
                let l2 = self.read_byte()?;
                if l2 < 0x80 {
                    // Non-minimal length encoding.
                    return Err(Error::InvalidSignatureEncoding);
                }
                l2 as usize
            }
            _ => return Err(Error::InvalidSignatureEncoding),
        };
        if self.buf.len() - self.off < len {
            return Err(Error::InvalidSignatureEncoding);
        }
        let v = &self.buf[self.off..self.off + len];
        self.off += len;
        Ok(v)
    }
}

// ========================================================================
// Writer helpers. All shapes emitted here are short enough that only
// the one- and two-byte length forms can occur.

fn push_len(out: &mut Vec<u8>, len: usize) {
    debug_assert!(len < 256);
    if len < 128 {
        out.push(len as u8);
    } else {
        out.push(0x81);
        out.push(len as u8);
    }
}

fn push_tlv(out: &mut Vec<u8>, tag: u8, v: &[u8]) {
    out.push(tag);
    push_len(out, v.len());
    out.extend_from_slice(v);
}

// Appends the minimal DER INTEGER encoding of a scalar (unsigned
// big-endian value, zero-stripped, 0x00-padded when the top bit is set).
fn push_scalar_integer(out: &mut Vec<u8>, x: &Scalar) {
    let be = bswap32(&x.encode32());
    let mut k = 0;
    while k < 31 && be[k] == 0 {
        k += 1;
    }
    let v = &be[k..];
    out.push(TAG_INTEGER);
    if (v[0] & 0x80) != 0 {
        push_len(out, v.len() + 1);
        out.push(0x00);
    } else {
        push_len(out, v.len());
    }
    out.extend_from_slice(v);
}

// Decodes a DER INTEGER content into a canonical non-zero scalar.
fn integer_to_scalar(v: &[u8]) -> Result<Scalar, Error> {
    if v.is_empty() {
        return Err(Error::InvalidSignatureEncoding);
    }
    if (v[0] & 0x80) != 0 {
        // Negative integers never appear in valid signatures.
        return Err(Error::InvalidSignatureEncoding);
    }
    let v = if v[0] == 0x00 {
        if v.len() == 1 {
            // A literal zero is a well-formed integer, but not a valid
            // scalar; let the range check below reject it.
            v
        } else if (v[1] & 0x80) == 0 {
            // Non-minimal encoding (superfluous leading zero octet).
            return Err(Error::InvalidSignatureEncoding);
        } else {
            &v[1..]
        }
    } else {
        v
    };
    if v.len() > 32 {
        return Err(Error::InvalidScalar);
    }

    let mut tmp = [0u8; 32];
    tmp[32 - v.len()..].copy_from_slice(v);
    let (x, cc) = Scalar::decode32(&bswap32(&tmp));
    if (cc & !x.iszero()) == 0 {
        return Err(Error::InvalidScalar);
    }
    Ok(x)
}

// ========================================================================
// ECDSA-Sig-Value.

/// Serializes `(r, s)` into a DER `SEQUENCE { r INTEGER, s INTEGER }`.
pub fn encode_der_signature(r: &Scalar, s: &Scalar) -> Vec<u8> {
    let mut body = Vec::with_capacity(70);
    push_scalar_integer(&mut body, r);
    push_scalar_integer(&mut body, s);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(TAG_SEQUENCE);
    push_len(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

/// Parses a DER `SEQUENCE { r INTEGER, s INTEGER }` (an
/// `ECDSA-Sig-Value` without the optional fields), rejecting malformed
/// DER, trailing bytes, and integers outside the range [1, n).
pub fn decode_der_signature(buf: &[u8]) -> Result<(Scalar, Scalar), Error> {
    let mut rd = Reader::new(buf);
    let seq = rd.read_tlv(TAG_SEQUENCE)?;
    if !rd.empty() {
        return Err(Error::InvalidSignatureEncoding);
    }

    let mut inner = Reader::new(seq);
    let rb = inner.read_tlv(TAG_INTEGER)?;
    let sb = inner.read_tlv(TAG_INTEGER)?;
    if !inner.empty() {
        return Err(Error::InvalidSignatureEncoding);
    }

    let r = integer_to_scalar(rb)?;
    let s = integer_to_scalar(sb)?;
    Ok((r, s))
}

// ========================================================================
// SubjectPublicKeyInfo.

/// Serializes an encoded curve point into a SubjectPublicKeyInfo
/// structure with the id-ecPublicKey algorithm and the secp256k1 named
/// curve.
pub fn encode_spki(point: &[u8]) -> Vec<u8> {
    let mut algo = Vec::with_capacity(16);
    push_tlv(&mut algo, TAG_OID, &OID_EC_PUBLIC_KEY);
    push_tlv(&mut algo, TAG_OID, &OID_SECP256K1);

    let mut body = Vec::with_capacity(algo.len() + point.len() + 8);
    push_tlv(&mut body, TAG_SEQUENCE, &algo);
    // BIT STRING with zero unused bits.
    body.push(TAG_BIT_STRING);
    push_len(&mut body, point.len() + 1);
    body.push(0x00);
    body.extend_from_slice(point);

    let mut out = Vec::with_capacity(body.len() + 3);
    out.push(TAG_SEQUENCE);
    push_len(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

/// Parses a SubjectPublicKeyInfo structure, requiring exactly the
/// id-ecPublicKey algorithm with the secp256k1 named curve, and returns
/// the encoded-point contents of the BIT STRING.
pub fn decode_spki(buf: &[u8]) -> Result<&[u8], Error> {
    let mut rd = Reader::new(buf);
    let seq = rd.read_tlv(TAG_SEQUENCE)?;
    if !rd.empty() {
        return Err(Error::InvalidSignatureEncoding);
    }

    let mut inner = Reader::new(seq);
    let algo = inner.read_tlv(TAG_SEQUENCE)?;
    let bits = inner.read_tlv(TAG_BIT_STRING)?;
    if !inner.empty() {
        return Err(Error::InvalidSignatureEncoding);
    }

    let mut ard = Reader::new(algo);
    let oid1 = ard.read_tlv(TAG_OID)?;
    let oid2 = ard.read_tlv(TAG_OID)?;
    if !ard.empty() || oid1 != OID_EC_PUBLIC_KEY || oid2 != OID_SECP256K1 {
        return Err(Error::InvalidSignatureEncoding);
    }

    // The point encoding is a whole number of bytes: no unused bits.
    if bits.is_empty() || bits[0] != 0x00 {
        return Err(Error::InvalidSignatureEncoding);
    }
    Ok(&bits[1..])
}

// ========================================================================
// BIP-0066.

/// Checks the BIP-0066 `IsValidSignatureEncoding` predicate on a
/// signature with its trailing sighash byte. This follows the normative
/// pseudocode of the BIP; the sighash byte itself is opaque and not
/// interpreted.
pub fn is_valid_bip0066(sig: &[u8]) -> bool {
    // Format: 0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S]
    // [sighash]
    // * total-length: 1-byte length descriptor of everything that
    //   follows, excluding the sighash byte.
    // * R and S: arbitrary-length big-endian encoded integers: no more
    //   than 33 bytes here by the length bound, no negative values, no
    //   superfluous padding.

    // Minimum and maximum size constraints.
    if sig.len() < 9 || sig.len() > 73 {
        return false;
    }

    // A signature is of type 0x30 (compound).
    if sig[0] != 0x30 {
        return false;
    }

    // Make sure the length covers the entire signature.
    if sig[1] as usize != sig.len() - 3 {
        return false;
    }

    // Extract the length of the R element.
    let len_r = sig[3] as usize;

    // Make sure the length of the S element is still inside the
    // signature.
    if 5 + len_r >= sig.len() {
        return false;
    }

    // Extract the length of the S element.
    let len_s = sig[5 + len_r] as usize;

    // Verify that the length of the signature matches the sum of the
    // length of the elements.
    if len_r + len_s + 7 != sig.len() {
        return false;
    }

    // Check whether the R element is an integer.
    if sig[2] != 0x02 {
        return false;
    }

    // Zero-length integers are not allowed for R.
    if len_r == 0 {
        return false;
    }

    // Negative numbers are not allowed for R.
    if (sig[4] & 0x80) != 0 {
        return false;
    }

    // Null bytes at the start of R are not allowed, unless R would
    // otherwise be interpreted as a negative number.
    if len_r > 1 && sig[4] == 0x00 && (sig[5] & 0x80) == 0 {
        return false;
    }

    // Check whether the S element is an integer.
    if sig[len_r + 4] != 0x02 {
        return false;
    }

    // Zero-length integers are not allowed for S.
    if len_s == 0 {
        return false;
    }

    // Negative numbers are not allowed for S.
    if (sig[len_r + 6] & 0x80) != 0 {
        return false;
    }

    // Null bytes at the start of S are not allowed, unless S would
    // otherwise be interpreted as a negative number.
    if len_s > 1 && sig[len_r + 6] == 0x00 && (sig[len_r + 7] & 0x80) == 0 {
        return false;
    }

    true
}

// ========================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn sc(v: u64) -> Scalar {
        Scalar::w64le(v, 0, 0, 0)
    }

    #[test]
    fn der_signature_roundtrip() {
        // Small values (single-byte integers).
        let r = sc(1);
        let s = sc(0x7F);
        let enc = encode_der_signature(&r, &s);
        assert!(enc == [ 0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x7F ]);
        let (r2, s2) = decode_der_signature(&enc).unwrap();
        assert!(r.equals(r2) == 0xFFFFFFFF);
        assert!(s.equals(s2) == 0xFFFFFFFF);

        // A value with the top bit set in its leading byte gets a zero
        // pad.
        let t = sc(0x80);
        let enc = encode_der_signature(&r, &t);
        assert!(enc == [ 0x30, 0x07, 0x02, 0x01, 0x01,
                         0x02, 0x02, 0x00, 0x80 ]);
        let (_, t2) = decode_der_signature(&enc).unwrap();
        assert!(t.equals(t2) == 0xFFFFFFFF);

        // Full-width scalars (n - 1 has the top bit set: 33-byte
        // INTEGER, 72-byte signature).
        let u = -Scalar::ONE;
        let enc = encode_der_signature(&u, &u);
        assert!(enc.len() == 72);
        let (u1, u2) = decode_der_signature(&enc).unwrap();
        assert!(u.equals(u1) == 0xFFFFFFFF);
        assert!(u.equals(u2) == 0xFFFFFFFF);
    }

    #[test]
    fn der_signature_reject() {
        let good = encode_der_signature(&sc(0x1234), &sc(0x56));

        // Trailing byte.
        let mut bad = good.clone();
        bad.push(0x00);
        assert!(decode_der_signature(&bad).is_err());

        // Truncation at every possible point.
        for i in 0..good.len() {
            assert!(decode_der_signature(&good[..i]).is_err());
        }

        // Wrong outer tag.
        let mut bad = good.clone();
        bad[0] = 0x31;
        assert!(decode_der_signature(&bad).is_err());

        // Inner garbage after the two integers.
        let mut bad = good.clone();
        bad[1] += 2;
        bad.push(0x05);
        bad.push(0x00);
        assert!(decode_der_signature(&bad).is_err());

        // Negative integer.
        let bad = [ 0x30, 0x06, 0x02, 0x01, 0x81, 0x02, 0x01, 0x01 ];
        assert!(decode_der_signature(&bad).is_err());

        // Non-minimal integer (leading zero before a small byte).
        let bad = [ 0x30, 0x07, 0x02, 0x02, 0x00, 0x01, 0x02, 0x01, 0x01 ];
        assert!(decode_der_signature(&bad).is_err());

        // Zero integers are well-formed DER but invalid scalars.
        let bad = [ 0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01 ];
        assert!(matches!(decode_der_signature(&bad),
            Err(Error::InvalidScalar)));

        // r >= n.
        let mut bad = Vec::from([ 0x30u8, 0x26, 0x02, 0x21, 0x00 ]);
        bad.extend_from_slice(&[0xFFu8; 32]);
        bad.extend_from_slice(&[ 0x02, 0x01, 0x01 ]);
        assert!(matches!(decode_der_signature(&bad),
            Err(Error::InvalidScalar)));

        // Non-minimal length encoding (0x81 with a short length).
        let bad = [ 0x30, 0x81, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01 ];
        assert!(decode_der_signature(&bad).is_err());
    }

    #[test]
    fn spki_roundtrip() {
        let point = [0x04u8; 65];
        let enc = encode_spki(&point);
        let dec = decode_spki(&enc).unwrap();
        assert!(dec == point);

        // Header shape: outer SEQUENCE, algorithm SEQUENCE with the two
        // OIDs.
        assert!(enc[0] == 0x30);
        assert!(&enc[..2 + 2 + 2 + 7] == [
            0x30, 0x56, 0x30, 0x10,
            0x06, 0x07, 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01 ]);

        // Trailing byte.
        let mut bad = enc.clone();
        bad.push(0);
        assert!(decode_spki(&bad).is_err());

        // Wrong curve OID.
        let mut bad = enc.clone();
        let pos = 2 + 2 + 9 + 2;  // first byte of the curve OID contents
        bad[pos + 4] = 0x0B;
        assert!(decode_spki(&bad).is_err());

        // Unused bits in the BIT STRING.
        let mut bad = enc.clone();
        let bpos = 2 + 2 + 0x10 + 2;  // BIT STRING leading octet
        bad[bpos] = 0x01;
        assert!(decode_spki(&bad).is_err());
    }

    #[test]
    fn bip0066_vectors() {
        // A well-formed signature with its sighash byte.
        let mut good = encode_der_signature(&sc(0x1234), &sc(0x56));
        good.push(0x01);
        assert!(is_valid_bip0066(&good));

        // The reject set: every case from the BIP-0066 validation rule.
        let reject: &[&[u8]] = &[
            // Empty and minimum-length violations.
            &[],
            &[ 0x30 ],
            &[ 0x30, 0x05, 0x02, 0x01, 0x01, 0x02, 0x00, 0x01 ],
            // Too long (74 bytes and beyond).
            &[ 0x00; 74 ],
            // Not a compound type.
            &[ 0x31, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01 ],
            // Total length mismatch.
            &[ 0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01 ],
            &[ 0x30, 0x05, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01 ],
            // R length runs past the end.
            &[ 0x30, 0x06, 0x02, 0x05, 0x01, 0x02, 0x01, 0x01, 0x01 ],
            // R+S lengths do not cover the body.
            &[ 0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x02, 0x01, 0x01 ],
            // R is not an INTEGER.
            &[ 0x30, 0x06, 0x03, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01 ],
            // Zero-length R.
            &[ 0x30, 0x06, 0x02, 0x00, 0x02, 0x02, 0x01, 0x01, 0x01 ],
            // Negative R.
            &[ 0x30, 0x06, 0x02, 0x01, 0x81, 0x02, 0x01, 0x01, 0x01 ],
            // Padded R.
            &[ 0x30, 0x07, 0x02, 0x02, 0x00, 0x01, 0x02, 0x01, 0x01, 0x01 ],
            // S is not an INTEGER.
            &[ 0x30, 0x06, 0x02, 0x01, 0x01, 0x04, 0x01, 0x01, 0x01 ],
            // Negative S.
            &[ 0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x81, 0x01 ],
            // Padded S.
            &[ 0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x02, 0x00, 0x01, 0x01 ],
        ];
        for (i, v) in reject.iter().enumerate() {
            assert!(!is_valid_bip0066(v), "case {} wrongly accepted", i);
        }

        // Missing sighash byte: the same bytes parse as plain DER but
        // fail the BIP-0066 length accounting.
        let plain = encode_der_signature(&sc(0x1234), &sc(0x56));
        assert!(!is_valid_bip0066(&plain));
    }
}
