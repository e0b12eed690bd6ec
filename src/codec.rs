use crate::error::{Error, Result};
use crate::protocol::UnblindedSignature;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar, U256};
use sha3::{Digest, Keccak256};

/// Byte width of an encoded scalar.
pub const SCALAR_SIZE: usize = 32;
/// Byte width of an encoded point in the canonical wire format.
pub const POINT_SIZE: usize = 64;
/// Byte width of an encoded point in the SEC1 uncompressed format.
pub const SEC1_POINT_SIZE: usize = 65;
/// Byte width of an encoded signature.
pub const SIGNATURE_SIZE: usize = SCALAR_SIZE + POINT_SIZE;

/// Interprets a byte string (e.g. UTF-8 text) as an unsigned big-endian
/// integer scalar.
///
/// The bytes must fit in the 32-byte scalar width and must name a value
/// below the group order, otherwise interoperability with the hashing in
/// [`scalar_digest`] could not be guaranteed.
pub fn message_to_scalar(msg: &[u8]) -> Result<Scalar> {
    if msg.len() > SCALAR_SIZE {
        return Err(Error::MessageTooLong(msg.len()));
    }
    let mut be = [0u8; SCALAR_SIZE];
    be[SCALAR_SIZE - msg.len()..].copy_from_slice(msg);
    Option::<Scalar>::from(Scalar::from_repr(be.into())).ok_or(Error::NonCanonicalScalar)
}

/// Keccak256 digest of the scalar's minimal big-endian representation.
///
/// Leading zero bytes are stripped before hashing; the zero scalar hashes a
/// single zero byte. Equivalent to writing the scalar as minimal hex, adding
/// one leading `'0'` nibble when the length is odd, and hashing the decoded
/// bytes. This digest is the cross-implementation compatibility contract and
/// must match cooperating implementations bit for bit.
pub fn scalar_digest(m: &Scalar) -> [u8; 32] {
    let be = m.to_bytes();
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
    Keccak256::digest(&be[start..]).into()
}

/// The challenge scalar for a message: [`scalar_digest`] read as an unsigned
/// big-endian integer, reduced into the scalar field.
pub fn hash_to_scalar(m: &Scalar) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&scalar_digest(m).into())
}

/// Encodes a scalar as 32 little-endian bytes.
pub fn scalar_to_bytes(s: &Scalar) -> [u8; SCALAR_SIZE] {
    let mut out: [u8; SCALAR_SIZE] = s.to_bytes().into();
    out.reverse();
    out
}

/// Decodes a scalar from its 32-byte little-endian encoding.
pub fn scalar_from_bytes(b: &[u8]) -> Result<Scalar> {
    if b.len() != SCALAR_SIZE {
        return Err(Error::WrongLength {
            expected: SCALAR_SIZE,
            got: b.len(),
        });
    }
    let mut be = [0u8; SCALAR_SIZE];
    be.copy_from_slice(b);
    be.reverse();
    Option::<Scalar>::from(Scalar::from_repr(be.into())).ok_or(Error::NonCanonicalScalar)
}

pub fn scalar_to_hex(s: &Scalar) -> String {
    hex::encode(scalar_to_bytes(s))
}

pub fn scalar_from_hex(s: &str) -> Result<Scalar> {
    if s.len() != SCALAR_SIZE * 2 {
        return Err(Error::WrongLength {
            expected: SCALAR_SIZE * 2,
            got: s.len(),
        });
    }
    scalar_from_bytes(&hex::decode(s)?)
}

/// Encodes a point in the canonical wire format: the 32-byte little-endian
/// x coordinate followed by the 32-byte little-endian y coordinate, with no
/// prefix byte.
pub fn point_to_bytes(p: &ProjectivePoint) -> Result<[u8; POINT_SIZE]> {
    let encoded = p.to_affine().to_encoded_point(false);
    let x = encoded.x().ok_or(Error::PointAtInfinity)?;
    let y = encoded.y().ok_or(Error::PointAtInfinity)?;

    let mut out = [0u8; POINT_SIZE];
    out[..SCALAR_SIZE].copy_from_slice(x);
    out[..SCALAR_SIZE].reverse();
    out[SCALAR_SIZE..].copy_from_slice(y);
    out[SCALAR_SIZE..].reverse();
    Ok(out)
}

/// Decodes a point from the canonical 64-byte wire format, validating curve
/// membership.
pub fn point_from_bytes(b: &[u8]) -> Result<ProjectivePoint> {
    if b.len() != POINT_SIZE {
        return Err(Error::WrongLength {
            expected: POINT_SIZE,
            got: b.len(),
        });
    }
    let mut x = [0u8; SCALAR_SIZE];
    x.copy_from_slice(&b[..SCALAR_SIZE]);
    x.reverse();
    let mut y = [0u8; SCALAR_SIZE];
    y.copy_from_slice(&b[SCALAR_SIZE..]);
    y.reverse();

    let encoded = EncodedPoint::from_affine_coordinates(&x.into(), &y.into(), false);
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(Error::InvalidPoint)?;
    Ok(ProjectivePoint::from(affine))
}

pub fn point_to_hex(p: &ProjectivePoint) -> Result<String> {
    Ok(hex::encode(point_to_bytes(p)?))
}

pub fn point_from_hex(s: &str) -> Result<ProjectivePoint> {
    if s.len() != POINT_SIZE * 2 {
        return Err(Error::WrongLength {
            expected: POINT_SIZE * 2,
            got: s.len(),
        });
    }
    point_from_bytes(&hex::decode(s)?)
}

/// Encodes a point in the alternate SEC1 uncompressed format: a leading
/// `0x04` byte followed by the big-endian x and y coordinates.
pub fn point_to_sec1_bytes(p: &ProjectivePoint) -> Result<[u8; SEC1_POINT_SIZE]> {
    let encoded = p.to_affine().to_encoded_point(false);
    if encoded.is_identity() {
        return Err(Error::PointAtInfinity);
    }
    let mut out = [0u8; SEC1_POINT_SIZE];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}

/// Decodes a point from the 65-byte SEC1 uncompressed format, validating
/// curve membership.
pub fn point_from_sec1_bytes(b: &[u8]) -> Result<ProjectivePoint> {
    if b.len() != SEC1_POINT_SIZE {
        return Err(Error::WrongLength {
            expected: SEC1_POINT_SIZE,
            got: b.len(),
        });
    }
    let encoded = EncodedPoint::from_bytes(b).map_err(|_| Error::InvalidPoint)?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(Error::InvalidPoint)?;
    Ok(ProjectivePoint::from(affine))
}

pub fn point_to_sec1_hex(p: &ProjectivePoint) -> Result<String> {
    Ok(hex::encode(point_to_sec1_bytes(p)?))
}

pub fn point_from_sec1_hex(s: &str) -> Result<ProjectivePoint> {
    if s.len() != SEC1_POINT_SIZE * 2 {
        return Err(Error::WrongLength {
            expected: SEC1_POINT_SIZE * 2,
            got: s.len(),
        });
    }
    point_from_sec1_bytes(&hex::decode(s)?)
}

/// Encodes a finished signature as 96 bytes: the scalar `s` followed by the
/// point `f`, each in the canonical wire format.
pub fn signature_to_bytes(sig: &UnblindedSignature) -> Result<[u8; SIGNATURE_SIZE]> {
    let mut out = [0u8; SIGNATURE_SIZE];
    out[..SCALAR_SIZE].copy_from_slice(&scalar_to_bytes(&sig.s));
    out[SCALAR_SIZE..].copy_from_slice(&point_to_bytes(&sig.f)?);
    Ok(out)
}

pub fn signature_from_bytes(b: &[u8]) -> Result<UnblindedSignature> {
    if b.len() != SIGNATURE_SIZE {
        return Err(Error::WrongLength {
            expected: SIGNATURE_SIZE,
            got: b.len(),
        });
    }
    let s = scalar_from_bytes(&b[..SCALAR_SIZE])?;
    let f = point_from_bytes(&b[SCALAR_SIZE..])?;
    Ok(UnblindedSignature { s, f })
}

pub fn signature_to_hex(sig: &UnblindedSignature) -> Result<String> {
    Ok(hex::encode(signature_to_bytes(sig)?))
}

/// Decodes a signature from its 192-character hex encoding. Any other
/// length is rejected before any partial decoding happens.
pub fn signature_from_hex(s: &str) -> Result<UnblindedSignature> {
    if s.len() != SIGNATURE_SIZE * 2 {
        return Err(Error::WrongLength {
            expected: SIGNATURE_SIZE * 2,
            got: s.len(),
        });
    }
    signature_from_bytes(&hex::decode(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::random_scalar;
    use k256::elliptic_curve::Field;
    use rand::thread_rng;

    #[test]
    fn keccak_compatibility_vector() {
        let m = message_to_scalar(b"test").unwrap();
        assert_eq!(m, Scalar::from(1952805748u64));

        assert_eq!(
            hex::encode(scalar_digest(&m)),
            "9c22ff5f21f0b81b113e63f7db6da94fedef11b2119b4088b89664fb9a3cb658"
        );

        // the digest is below the group order, so hash_to_scalar keeps it as-is
        let expected =
            Option::<Scalar>::from(Scalar::from_repr(scalar_digest(&m).into())).unwrap();
        assert_eq!(hash_to_scalar(&m), expected);
    }

    #[test]
    fn digest_uses_minimal_parity_padded_bytes() {
        // 0xf74657374 has a 9-nibble minimal hex form and must hash as the
        // five bytes 0f 74 65 73 74, not a zero-padded fixed width.
        let m = Scalar::from(0xf74657374u64);
        let expected: [u8; 32] = Keccak256::digest(&[0x0f, 0x74, 0x65, 0x73, 0x74][..]).into();
        assert_eq!(scalar_digest(&m), expected);
    }

    #[test]
    fn digest_of_zero_hashes_one_zero_byte() {
        let expected: [u8; 32] = Keccak256::digest(&[0x00][..]).into();
        assert_eq!(scalar_digest(&Scalar::ZERO), expected);
    }

    #[test]
    fn message_must_fit_scalar_width() {
        assert!(matches!(
            message_to_scalar(&[0xaa; 33]),
            Err(Error::MessageTooLong(33))
        ));
        assert_eq!(message_to_scalar(&[]).unwrap(), Scalar::ZERO);
    }

    #[test]
    fn scalar_wire_format_is_little_endian() {
        let bytes = scalar_to_bytes(&Scalar::ONE);
        assert_eq!(bytes[0], 1);
        assert!(bytes[1..].iter().all(|&b| b == 0));
        assert_eq!(scalar_to_hex(&Scalar::ONE), format!("01{}", "00".repeat(31)));
    }

    #[test]
    fn scalar_round_trip() {
        let mut rng = thread_rng();
        let s = random_scalar(&mut rng);
        assert_eq!(scalar_from_bytes(&scalar_to_bytes(&s)).unwrap(), s);
        assert_eq!(scalar_from_hex(&scalar_to_hex(&s)).unwrap(), s);
    }

    #[test]
    fn scalar_decode_rejects_bad_input() {
        assert!(matches!(
            scalar_from_bytes(&[0u8; 31]),
            Err(Error::WrongLength { expected: 32, got: 31 })
        ));
        assert!(matches!(
            scalar_from_hex("abcd"),
            Err(Error::WrongLength { .. })
        ));
        // 2^256 - 1 is above the group order
        assert!(matches!(
            scalar_from_bytes(&[0xff; 32]),
            Err(Error::NonCanonicalScalar)
        ));
    }

    #[test]
    fn point_round_trip() {
        let mut rng = thread_rng();
        let p = ProjectivePoint::GENERATOR * random_scalar(&mut rng);

        let bytes = point_to_bytes(&p).unwrap();
        assert_eq!(point_from_bytes(&bytes).unwrap(), p);

        let hex_p = point_to_hex(&p).unwrap();
        assert_eq!(hex_p.len(), POINT_SIZE * 2);
        assert_eq!(point_from_hex(&hex_p).unwrap(), p);
    }

    #[test]
    fn sec1_round_trip() {
        let mut rng = thread_rng();
        let p = ProjectivePoint::GENERATOR * random_scalar(&mut rng);

        let bytes = point_to_sec1_bytes(&p).unwrap();
        assert_eq!(bytes[0], 0x04);
        assert_eq!(point_from_sec1_bytes(&bytes).unwrap(), p);
    }

    #[test]
    fn sec1_generator_vector() {
        assert_eq!(
            point_to_sec1_hex(&ProjectivePoint::GENERATOR).unwrap(),
            "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
    }

    #[test]
    fn point_decode_rejects_off_curve_coordinates() {
        // (1, 1): 1 != 1 + 7
        let mut b = [0u8; POINT_SIZE];
        b[0] = 1;
        b[32] = 1;
        assert!(matches!(point_from_bytes(&b), Err(Error::InvalidPoint)));
    }

    #[test]
    fn identity_has_no_encoding() {
        assert!(matches!(
            point_to_bytes(&ProjectivePoint::IDENTITY),
            Err(Error::PointAtInfinity)
        ));
    }

    #[test]
    fn signature_round_trip() {
        let mut rng = thread_rng();
        let sig = UnblindedSignature {
            s: random_scalar(&mut rng),
            f: ProjectivePoint::GENERATOR * random_scalar(&mut rng),
        };

        let bytes = signature_to_bytes(&sig).unwrap();
        assert_eq!(signature_from_bytes(&bytes).unwrap(), sig);

        let hex_sig = signature_to_hex(&sig).unwrap();
        assert_eq!(hex_sig.len(), SIGNATURE_SIZE * 2);
        assert_eq!(signature_from_hex(&hex_sig).unwrap(), sig);
    }

    #[test]
    fn signature_decode_requires_exact_length() {
        assert!(matches!(
            signature_from_hex(""),
            Err(Error::WrongLength { expected: 192, got: 0 })
        ));
        assert!(matches!(
            signature_from_hex(&"ab".repeat(95)),
            Err(Error::WrongLength { .. })
        ));
        assert!(matches!(
            signature_from_hex(&"ab".repeat(97)),
            Err(Error::WrongLength { .. })
        ));
        assert!(matches!(
            signature_from_bytes(&[0u8; 95]),
            Err(Error::WrongLength { .. })
        ));
    }
}
