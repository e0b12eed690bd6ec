use crate::codec;
use crate::error::{Error, Result};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::rand_core::{CryptoRng, RngCore};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Draws a uniformly random nonzero scalar.
///
/// 32 random bytes are read as an unsigned big-endian integer and reduced
/// into the scalar field; a zero draw is retried. Nonzero is enough for
/// invertibility since the group order is prime.
pub fn random_scalar(rng: &mut (impl CryptoRng + RngCore)) -> Scalar {
    loop {
        let mut buf = [0u8; 32];
        rng.fill_bytes(&mut buf);
        let s = <Scalar as Reduce<U256>>::reduce_bytes(&buf.into());
        if !bool::from(s.is_zero()) {
            return s;
        }
    }
}

/// A signer's long-lived identity: the secret key and its public point
/// `sk·G`. The secret key is never part of any protocol output.
#[derive(Clone, Debug)]
pub struct KeyPair {
    sk: Scalar,
    pk: ProjectivePoint,
}

impl KeyPair {
    pub fn new(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self::from(random_scalar(rng))
    }

    pub fn public_key(&self) -> ProjectivePoint {
        self.pk
    }

    pub fn secret_key(&self) -> &Scalar {
        &self.sk
    }
}

impl From<Scalar> for KeyPair {
    fn from(sk: Scalar) -> Self {
        Self {
            sk,
            pk: ProjectivePoint::GENERATOR * sk,
        }
    }
}

/// The signer's per-session state: a nonce `k` and its public point
/// `k·G`, which is handed to the requester.
///
/// `k` is strictly single-use. Signing two different blinded messages with
/// the same `k` lets anyone holding both transcripts solve a pair of linear
/// equations for the secret key (see the nonce-reuse test below). The
/// signer must discard `k` as soon as the matching [`blind_sign`] call
/// completes; serializing that is the caller's responsibility.
#[derive(Clone, Debug)]
pub struct RequestParameters {
    k: Scalar,
    signer_r: ProjectivePoint,
}

impl RequestParameters {
    pub fn new(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self::from(random_scalar(rng))
    }

    /// The session nonce `k`, held by the signer only.
    pub fn nonce(&self) -> &Scalar {
        &self.k
    }

    /// The public nonce point `k·G`, sent to the requester.
    pub fn signer_r(&self) -> ProjectivePoint {
        self.signer_r
    }
}

impl From<Scalar> for RequestParameters {
    fn from(k: Scalar) -> Self {
        Self {
            k,
            signer_r: ProjectivePoint::GENERATOR * k,
        }
    }
}

/// The requester's ephemeral blinding state, held between [`blind`] and
/// [`unblind`] and consumed by the latter.
#[derive(Clone, Debug)]
pub struct UserSecretData {
    a: Scalar,
    b: Scalar,
    f: ProjectivePoint,
}

/// The finished, publicly verifiable signature.
#[derive(Clone, Debug, PartialEq)]
pub struct UnblindedSignature {
    pub s: Scalar,
    pub f: ProjectivePoint,
}

/// The affine x coordinate reduced mod the group order, or `None` for the
/// point at infinity.
fn x_mod_n(p: &ProjectivePoint) -> Option<Scalar> {
    let encoded = p.to_affine().to_encoded_point(false);
    let x = encoded.x()?;
    Some(<Scalar as Reduce<U256>>::reduce_bytes(x))
}

/// Blinds the message `m` for the signer's public nonce point `signer_r`.
///
/// Draws fresh blinding factors `a` and `b`, computes `f = a·signer_r +
/// b·G` and returns the blinded message `a⁻¹·(f.x mod n)·h(m) mod n`
/// together with the blinding state the requester needs for [`unblind`].
///
/// The blinded message is the only message-derived value the signer ever
/// observes.
pub fn blind(
    rng: &mut (impl CryptoRng + RngCore),
    m: &Scalar,
    signer_r: &ProjectivePoint,
) -> Result<(Scalar, UserSecretData)> {
    let a = random_scalar(rng);
    let b = random_scalar(rng);

    let f = *signer_r * a + ProjectivePoint::GENERATOR * b;
    let rx = x_mod_n(&f).ok_or(Error::PointAtInfinity)?;

    // a is nonzero by construction, so inversion cannot actually fail
    let a_inv = Option::<Scalar>::from(a.invert()).ok_or(Error::ZeroInverse)?;
    let h = codec::hash_to_scalar(m);
    let m_blinded = a_inv * rx * h;

    Ok((m_blinded, UserSecretData { a, b, f }))
}

/// Signs a blinded message with the secret key `sk` and the session nonce
/// `k`: `sk·m_blinded + k mod n`. The nonce must not be used again.
pub fn blind_sign(sk: &Scalar, m_blinded: &Scalar, k: &Scalar) -> Scalar {
    sk * m_blinded + k
}

/// Removes the blinding from the signer's response: `s = a·s_blind + b mod
/// n`, paired with the point `f` fixed at blinding time. The blinding state
/// is consumed.
pub fn unblind(s_blind: &Scalar, user_secret_data: UserSecretData) -> UnblindedSignature {
    let s = user_secret_data.a * s_blind + user_secret_data.b;
    UnblindedSignature {
        s,
        f: user_secret_data.f,
    }
}

/// Verifies a finished signature on `m` against the signer's public key
/// `q`: accepts iff `s·G == f + (f.x mod n)·h(m)·Q` in affine coordinates.
///
/// A well-formed signature that does not match returns `false`; malformed
/// encodings never reach this function, they are rejected while decoding.
pub fn verify(m: &Scalar, sig: &UnblindedSignature, q: &ProjectivePoint) -> bool {
    let rx = match x_mod_n(&sig.f) {
        Some(rx) => rx,
        None => return false,
    };
    let h = codec::hash_to_scalar(m);

    let left = ProjectivePoint::GENERATOR * sig.s;
    let right = sig.f + *q * (rx * h);
    left.to_affine() == right.to_affine()
}

impl Serialize for UnblindedSignature {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex_sig = codec::signature_to_hex(self).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_sig)
    }
}

impl<'de> Deserialize<'de> for UnblindedSignature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_sig = String::deserialize(deserializer)?;
        codec::signature_from_hex(&hex_sig).map_err(serde::de::Error::custom)
    }
}
