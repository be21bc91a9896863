use crate::bank::Bank;
use crate::coin::{Coin, CoinParams};
use crate::error::Result;
use rand::RngCore;
use tracing::debug;

/// The party that withdraws coins under its own identity label.
#[derive(Clone, Debug)]
pub struct Purchaser {
    owner: String,
}

impl Purchaser {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Creates a coin and has `bank` sign it blind. The returned coin is
    /// spendable.
    pub fn withdraw<R: RngCore + ?Sized>(
        &self,
        bank: &Bank,
        amount: u64,
        params: CoinParams,
        rng: &mut R,
    ) -> Result<Coin> {
        let mut coin = Coin::new(&self.owner, amount, bank.public_key(), params, rng)?;
        let envelope = coin.blind()?;
        let signed = bank.sign_envelope(envelope)?;
        coin.receive_signature(signed)?;
        coin.unblind()?;
        debug!(coin = %coin.identifier(), amount, "withdrawal complete");
        Ok(coin)
    }
}
