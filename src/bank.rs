use crate::blind_sigs::{Envelope, SignedEnvelope};
use crate::coin::{Coin, CoinRecord};
use crate::commitment::{verify_shares, Side};
use crate::detector::{detect_cheater, Ris, Verdict};
use crate::error::{Error, Result};
use crate::utils::*;
use blsttc::pairing::bls12_381::Fr;
use blsttc::{PublicKey, SecretKey, Signature};
use std::collections::HashMap;
use std::convert::TryFrom;
use tracing::{debug, info, warn};

/// Result of depositing a coin's revealed shares with the bank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepositOutcome {
    /// First time this coin was seen.
    Credited { amount: u64 },
    /// The coin had already been deposited; the audit verdict says who cheated.
    DoubleSpent(Verdict),
}

/// The key authority. Signs envelopes without seeing the coin inside
/// and audits deposits for double spending.
pub struct Bank {
    sk: SecretKey,
    deposits: HashMap<String, Ris>,
}

impl Bank {
    pub fn new() -> Self {
        Self::from(SecretKey::random())
    }

    pub fn public_key(&self) -> PublicKey {
        self.sk.public_key()
    }

    fn sk_bendian(&self) -> Result<Fr> {
        fr_from_be_bytes(self.sk.to_bytes())
    }

    /// Signs blind. Nothing about the envelope's origin is checked since
    /// nothing about it can be learned.
    pub fn sign_envelope(&self, e: Envelope) -> Result<SignedEnvelope> {
        let bs_sig_g2 = sign_g2(e.blinded_msg(), self.sk_bendian()?);
        let signature = Signature::from_bytes(g2_to_be_bytes(bs_sig_g2))?;
        debug!("bank signed a blinded envelope");

        Ok(SignedEnvelope::new(e, signature))
    }

    /// Records a merchant's deposit of `coin` along with the shares the
    /// merchant collected when accepting it.
    ///
    /// A second deposit of the same coin identifier is audited against the
    /// first one instead of being credited.
    pub fn deposit(&mut self, coin: &Coin, ris: Ris) -> Result<DepositOutcome> {
        if coin.bank_key().to_bytes()[..] != self.public_key().to_bytes()[..] {
            warn!(coin = %coin.identifier(), "deposit of coin issued under a foreign key");
            return Err(Error::InvalidSignature);
        }
        coin.verify_signature_with(&self.public_key())?;

        let coin_id = coin.identifier();
        match self.deposits.get(coin_id) {
            Some(previous) => {
                let verdict = detect_cheater(coin_id, previous, &ris)?;
                warn!(coin = %coin_id, ?verdict, "coin deposited twice");
                Ok(DepositOutcome::DoubleSpent(verdict))
            }
            None => {
                if let Err(e) = check_reveal(&coin.record(), &ris) {
                    warn!(coin = %coin_id, error = %e, "deposit reveal does not match the coin");
                    return Err(e);
                }
                self.deposits.insert(coin_id.to_string(), ris);
                info!(coin = %coin_id, amount = coin.amount(), "deposit credited");
                Ok(DepositOutcome::Credited {
                    amount: coin.amount(),
                })
            }
        }
    }

    pub fn is_deposited(&self, coin_id: &str) -> bool {
        self.deposits.contains_key(coin_id)
    }
}

/// A stored reveal must be one full side of the coin's committed shares.
fn check_reveal(record: &CoinRecord, ris: &Ris) -> Result<()> {
    let left = verify_shares(Side::Left, ris.shares(), record.hashes(Side::Left));
    if left.is_ok() {
        return left;
    }
    verify_shares(Side::Right, ris.shares(), record.hashes(Side::Right)).or(left)
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<[u8; 32]> for Bank {
    type Error = Error;

    fn try_from(b: [u8; 32]) -> Result<Self> {
        Ok(Self::from(SecretKey::from_bytes(b)?))
    }
}

impl From<SecretKey> for Bank {
    fn from(sk: SecretKey) -> Self {
        Self {
            sk,
            deposits: HashMap::new(),
        }
    }
}
