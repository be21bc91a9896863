//! Bank-side audit of a coin that was deposited twice.

use crate::commitment::{recover_identity, Share};
use crate::error::{Error, Result};
use crate::utils::xor;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Revealed identity shares: one full side of a coin's share pairs, as
/// collected by a merchant. Which side it was is deliberately not recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ris(Vec<Share>);

impl Ris {
    pub fn shares(&self) -> &[Share] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Share>> for Ris {
    fn from(shares: Vec<Share>) -> Self {
        Self(shares)
    }
}

/// Who broke the protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The purchaser spent the coin twice; carries the recovered owner label.
    PurchaserCheater(String),
    /// A merchant replayed or forged its reveal.
    MerchantCheater,
}

/// Reconciles two reveals of the same coin.
///
/// Only meaningful once double spending is suspected: two identical
/// reveals are treated as a merchant replaying one acceptance, not as an
/// honest single spend.
pub fn detect_cheater(coin_id: &str, first: &Ris, second: &Ris) -> Result<Verdict> {
    if first.len() != second.len() {
        return Err(Error::LengthMismatch {
            first: first.len(),
            second: second.len(),
        });
    }

    let differing = first
        .shares()
        .iter()
        .zip(second.shares())
        .position(|(a, b)| a != b);

    let verdict = match differing {
        Some(index) => {
            let a = first.shares()[index].as_bytes();
            let b = second.shares()[index].as_bytes();
            match xor(a, b).as_deref().and_then(recover_identity) {
                Some(owner) => Verdict::PurchaserCheater(owner),
                None => Verdict::MerchantCheater,
            }
        }
        None => Verdict::MerchantCheater,
    };

    match &verdict {
        Verdict::PurchaserCheater(_) => info!(coin = %coin_id, "double spend traced to purchaser"),
        Verdict::MerchantCheater => info!(coin = %coin_id, "merchant reveal rejected"),
    }
    Ok(verdict)
}
