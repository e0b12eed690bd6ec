use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = BlindSignatureError> = std::result::Result<T, E>;
pub type Error = BlindSignatureError;

#[derive(Error, Debug)]
/// error variants.
pub enum BlindSignatureError {
    #[error("hex decoding failed")]
    Hex(#[from] hex::FromHexError),

    #[error("wrong encoding length: expected {expected}, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("scalar encoding is not a canonical value below the group order")]
    NonCanonicalScalar,

    #[error("bytes do not encode a valid secp256k1 point")]
    InvalidPoint,

    #[error("the point at infinity has no affine encoding")]
    PointAtInfinity,

    #[error("message of {0} bytes does not fit in a 32-byte scalar")]
    MessageTooLong(usize),

    #[error("attempted to invert the zero scalar")]
    ZeroInverse,
}
