mod codec;
mod error;
mod protocol;

pub use crate::codec::{
    hash_to_scalar, message_to_scalar, point_from_bytes, point_from_hex, point_from_sec1_bytes,
    point_from_sec1_hex, point_to_bytes, point_to_hex, point_to_sec1_bytes, point_to_sec1_hex,
    scalar_digest, scalar_from_bytes, scalar_from_hex, scalar_to_bytes, scalar_to_hex,
    signature_from_bytes, signature_from_hex, signature_to_bytes, signature_to_hex, POINT_SIZE,
    SCALAR_SIZE, SEC1_POINT_SIZE, SIGNATURE_SIZE,
};
pub use crate::error::{Error, Result};
pub use crate::protocol::{
    blind, blind_sign, random_scalar, unblind, verify, KeyPair, RequestParameters,
    UnblindedSignature, UserSecretData,
};

pub use k256::{ProjectivePoint, Scalar};
