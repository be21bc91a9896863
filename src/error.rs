use crate::coin::CoinState;
use crate::commitment::Side;
use blsttc::error::FromBytesError;
use std::array::TryFromSliceError;
use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = BlindSignatureError> = std::result::Result<T, E>;
pub type Error = BlindSignatureError;

#[derive(Error, Debug)]
/// error variants.
pub enum BlindSignatureError {
    #[error("serialized coin is malformed: {0}")]
    InvalidFormat(String),

    #[error("coin signature does not verify against the bank key")]
    InvalidSignature,

    /// A revealed share does not hash to the commitment published in the coin.
    #[error("{side:?} share {index} does not match its published commitment")]
    CommitmentMismatch { side: Side, index: usize },

    #[error("revealed share sets differ in length: {first} vs {second}")]
    LengthMismatch { first: usize, second: usize },

    #[error("owner label must not be empty")]
    InvalidOwner,

    #[error("redundancy factor must be positive")]
    InvalidRedundancy,

    #[error("coin amount must be positive")]
    InvalidAmount,

    #[error("coin is {found:?}, expected {expected:?}")]
    InvalidState {
        expected: CoinState,
        found: CoinState,
    },

    #[error("signed envelope does not carry this coin's blinded digest")]
    EnvelopeMismatch,

    #[error("bytes do not encode a valid scalar")]
    InvalidScalar,

    #[error("bytes do not encode a valid curve point")]
    InvalidPoint,

    #[error("deserialization from bytes failed")]
    BlsttcFromBytes(#[from] FromBytesError),

    #[error("deserialization from bytes failed")]
    InvalidBytes(#[from] TryFromSliceError),
}
