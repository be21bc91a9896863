//! Chaum-style anonymous e-cash with double-spend tracing, on top of BLS
//! blind signatures.
//!
//! A [`Purchaser`] withdraws a [`Coin`] that the [`Bank`] signs blind. A
//! [`Merchant`] accepting the coin asks for one random half of the coin's
//! identity shares. One reveal says nothing about the owner; two reveals of
//! opposite halves let [`detect_cheater`] recover the owner label.

mod bank;
mod blind_sigs;
mod coin;
mod commitment;
mod detector;
mod error;
mod merchant;
mod purchaser;
mod utils;

pub use crate::bank::{Bank, DepositOutcome};
pub use crate::blind_sigs::{BlindingFactor, Envelope, SignedEnvelope};
pub use crate::coin::{Coin, CoinParams, CoinRecord, CoinState, IssuerTag};
pub use crate::commitment::{
    identity_payload, recover_identity, verify_shares, IdentityCommitment, Share, Side,
    DEFAULT_REDUNDANCY, IDENTITY_MARKER,
};
pub use crate::detector::{detect_cheater, Ris, Verdict};
pub use crate::error::{BlindSignatureError, Error, Result};
pub use crate::merchant::{Challenge, FixedChallenge, Merchant, RandomChallenge};
pub use crate::purchaser::Purchaser;
pub use crate::utils::{hash_hex, xor};
