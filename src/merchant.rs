use crate::coin::{Coin, CoinRecord};
use crate::commitment::{verify_shares, Side};
use crate::detector::Ris;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, warn};

/// Source of a merchant's challenge bit.
///
/// Each merchant owns its own source; two merchants must never share one.
pub trait Challenge {
    fn draw(&mut self) -> Side;
}

/// Uniform random challenge drawn from `R`.
pub struct RandomChallenge<R>(pub R);

impl<R: RngCore> Challenge for RandomChallenge<R> {
    fn draw(&mut self) -> Side {
        Side::from(self.0.gen::<bool>())
    }
}

/// A fresh generator seeded from OS entropy, owned by this challenge alone.
impl Default for RandomChallenge<StdRng> {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Always asks for the same side.
#[derive(Clone, Copy, Debug)]
pub struct FixedChallenge(pub Side);

impl Challenge for FixedChallenge {
    fn draw(&mut self) -> Side {
        self.0
    }
}

/// Accepts coins and collects the revealed identity shares that the bank
/// later needs to audit a double spend.
pub struct Merchant<C = RandomChallenge<StdRng>> {
    challenge: C,
}

impl Merchant {
    pub fn new() -> Self {
        Self::with_challenge(RandomChallenge::default())
    }
}

impl Default for Merchant {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Challenge> Merchant<C> {
    pub fn with_challenge(challenge: C) -> Self {
        Self { challenge }
    }

    /// Runs one acceptance: check the bank's signature, challenge one side
    /// and check every revealed share against the coin's published hashes.
    pub fn accept(&mut self, coin: &Coin) -> Result<Ris> {
        if let Err(e) = coin.verify_signature() {
            warn!(coin = %coin.identifier(), "refusing coin with bad signature");
            return Err(e);
        }

        let record: CoinRecord = coin.canonical().parse()?;
        let side = self.challenge.draw();
        debug!(coin = %record.identifier, "challenge drawn");

        let shares = coin.reveal(side);
        if let Err(e) = verify_shares(side, shares, record.hashes(side)) {
            warn!(coin = %record.identifier, error = %e, "revealed shares do not match commitments");
            return Err(e);
        }

        Ok(Ris::from(shares.to_vec()))
    }
}
