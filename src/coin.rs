use crate::blind_sigs::{BlindingFactor, Envelope, SignedEnvelope};
use crate::commitment::{IdentityCommitment, Share, Side, DEFAULT_REDUNDANCY};
use crate::error::{Error, Result};
use crate::utils::{sha256, verify_signature_on_digest};
use blsttc::{PublicKey, Signature};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Tag naming the issuer in a coin's canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuerTag {
    Bank,
}

impl IssuerTag {
    pub fn as_str(self) -> &'static str {
        match self {
            IssuerTag::Bank => "BANK",
        }
    }
}

impl fmt::Display for IssuerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuerTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BANK" => Ok(IssuerTag::Bank),
            other => Err(Error::InvalidFormat(format!("unknown issuer tag {:?}", other))),
        }
    }
}

/// Issuance parameters.
#[derive(Clone, Copy, Debug)]
pub struct CoinParams {
    /// Number of identity share pairs.
    pub redundancy: usize,
    pub issuer: IssuerTag,
}

impl Default for CoinParams {
    fn default() -> Self {
        Self {
            redundancy: DEFAULT_REDUNDANCY,
            issuer: IssuerTag::Bank,
        }
    }
}

/// The public, signable part of a coin.
///
/// Its text form is
/// `<issuer>-<amount>-<identifier>-<left hashes>-<right hashes>`
/// with each hash list joined by `,`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinRecord {
    pub issuer: IssuerTag,
    pub amount: u64,
    pub identifier: String,
    pub left_hashes: Vec<String>,
    pub right_hashes: Vec<String>,
}

impl CoinRecord {
    pub fn hashes(&self, side: Side) -> &[String] {
        match side {
            Side::Left => &self.left_hashes,
            Side::Right => &self.right_hashes,
        }
    }
}

impl fmt::Display for CoinRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.issuer,
            self.amount,
            self.identifier,
            self.left_hashes.join(","),
            self.right_hashes.join(",")
        )
    }
}

impl FromStr for CoinRecord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split('-').collect();
        if fields.len() != 5 {
            return Err(Error::InvalidFormat(format!(
                "expected 5 fields, found {}",
                fields.len()
            )));
        }

        let issuer = fields[0].parse()?;
        let amount = fields[1]
            .parse()
            .map_err(|_| Error::InvalidFormat(format!("bad amount {:?}", fields[1])))?;
        let identifier = fields[2].to_string();
        if identifier.is_empty() {
            return Err(Error::InvalidFormat("empty identifier".to_string()));
        }

        let left_hashes = split_hashes(fields[3])?;
        let right_hashes = split_hashes(fields[4])?;
        if left_hashes.is_empty() || left_hashes.len() != right_hashes.len() {
            return Err(Error::InvalidFormat(format!(
                "unbalanced commitments: {} left, {} right",
                left_hashes.len(),
                right_hashes.len()
            )));
        }

        Ok(Self {
            issuer,
            amount,
            identifier,
            left_hashes,
            right_hashes,
        })
    }
}

fn split_hashes(field: &str) -> Result<Vec<String>> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(',')
        .map(|hash| {
            if is_digest_hex(hash) {
                Ok(hash.to_string())
            } else {
                Err(Error::InvalidFormat(format!("bad commitment {:?}", hash)))
            }
        })
        .collect()
}

// lowercase hex SHA-256, as produced by `hash_hex`
fn is_digest_hex(hash: &str) -> bool {
    hash.len() == 64
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Where a coin is in its issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoinState {
    Created,
    Blinded,
    Signed,
    Spendable,
}

/// A value token whose owner is committed to, not named.
///
/// The issuance material (blinding factor, envelope, blind signature) is
/// dropped as soon as the coin becomes spendable, so a spent coin cannot
/// be linked back to its withdrawal.
#[derive(Clone)]
pub struct Coin {
    identifier: String,
    amount: u64,
    state: CoinState,
    issuer: IssuerTag,
    bank_key: PublicKey,
    identity: IdentityCommitment,
    blinding: Option<BlindingFactor>,
    envelope: Option<Envelope>,
    blind_signature: Option<SignedEnvelope>,
    signature: Option<Signature>,
}

impl Coin {
    pub fn new<R: RngCore + ?Sized>(
        owner: &str,
        amount: u64,
        bank_key: PublicKey,
        params: CoinParams,
        rng: &mut R,
    ) -> Result<Self> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let identity = IdentityCommitment::generate(owner, params.redundancy, rng)?;

        let mut id_bytes = [0u8; 16];
        rng.fill_bytes(&mut id_bytes);
        let identifier = hex::encode(id_bytes);
        debug!(coin = %identifier, amount, "coin created");

        Ok(Self {
            identifier,
            amount,
            state: CoinState::Created,
            issuer: params.issuer,
            bank_key,
            identity,
            blinding: None,
            envelope: None,
            blind_signature: None,
            signature: None,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn bank_key(&self) -> &PublicKey {
        &self.bank_key
    }

    pub fn identity(&self) -> &IdentityCommitment {
        &self.identity
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn state(&self) -> CoinState {
        self.state
    }

    pub fn record(&self) -> CoinRecord {
        CoinRecord {
            issuer: self.issuer,
            amount: self.amount,
            identifier: self.identifier.clone(),
            left_hashes: self.identity.hashes(Side::Left).to_vec(),
            right_hashes: self.identity.hashes(Side::Right).to_vec(),
        }
    }

    pub fn canonical(&self) -> String {
        self.record().to_string()
    }

    /// The message the bank signs: SHA-256 of the canonical form.
    pub fn digest(&self) -> Vec<u8> {
        sha256(self.canonical().as_bytes())
    }

    /// The full share sequence of one side.
    pub fn reveal(&self, side: Side) -> &[Share] {
        self.identity.shares(side)
    }

    /// Blinds the digest with a fresh factor and returns the envelope
    /// to send to the bank.
    pub fn blind(&mut self) -> Result<Envelope> {
        self.blind_with(BlindingFactor::random()?)
    }

    pub fn blind_with(&mut self, blinding: BlindingFactor) -> Result<Envelope> {
        self.expect_state(CoinState::Created)?;
        let envelope = blinding.place_in_envelope(&self.digest())?;
        self.blinding = Some(blinding);
        self.envelope = Some(envelope.clone());
        self.state = CoinState::Blinded;
        debug!(coin = %self.identifier, "coin blinded");
        Ok(envelope)
    }

    /// Accepts the bank's reply. It must be a signature on this coin's
    /// own envelope.
    pub fn receive_signature(&mut self, signed: SignedEnvelope) -> Result<()> {
        self.expect_state(CoinState::Blinded)?;
        if self.envelope.as_ref() != Some(&signed.envelope) {
            return Err(Error::EnvelopeMismatch);
        }
        self.blind_signature = Some(signed);
        self.state = CoinState::Signed;
        Ok(())
    }

    /// Strips the blinding factor. The coin only becomes spendable if the
    /// result verifies under the embedded bank key.
    pub fn unblind(&mut self) -> Result<()> {
        self.expect_state(CoinState::Signed)?;
        let (signed, blinding) = match (&self.blind_signature, &self.blinding) {
            (Some(signed), Some(blinding)) => (signed, blinding),
            _ => {
                return Err(Error::InvalidState {
                    expected: CoinState::Signed,
                    found: self.state(),
                })
            }
        };
        let signature = signed.signature_for_digest(blinding)?;
        if !verify_signature_on_digest(&self.digest(), &signature, &self.bank_key)? {
            return Err(Error::InvalidSignature);
        }
        self.signature = Some(signature);
        self.state = CoinState::Spendable;
        self.blinding = None;
        self.envelope = None;
        self.blind_signature = None;
        debug!(coin = %self.identifier, "coin unblinded and spendable");
        Ok(())
    }

    /// Verifies the coin's signature against its embedded bank key.
    pub fn verify_signature(&self) -> Result<()> {
        self.verify_signature_with(&self.bank_key)
    }

    pub fn verify_signature_with(&self, pk: &PublicKey) -> Result<()> {
        let signature = self.signature.as_ref().ok_or(Error::InvalidSignature)?;
        if verify_signature_on_digest(&self.digest(), signature, pk)? {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }

    fn expect_state(&self, expected: CoinState) -> Result<()> {
        let found = self.state;
        if found == expected {
            Ok(())
        } else {
            Err(Error::InvalidState { expected, found })
        }
    }

    #[cfg(test)]
    pub(crate) fn identity_mut(&mut self) -> &mut IdentityCommitment {
        &mut self.identity
    }

    #[cfg(test)]
    pub(crate) fn set_amount(&mut self, amount: u64) {
        self.amount = amount;
    }

    #[cfg(test)]
    pub(crate) fn set_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
    }
}

// shares and issuance secrets stay out of logs
impl fmt::Debug for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coin")
            .field("identifier", &self.identifier)
            .field("amount", &self.amount)
            .field("issuer", &self.issuer)
            .field("state", &self.state)
            .field("redundancy", &self.identity.redundancy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Bank;
    use crate::utils::hash_hex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::convert::TryFrom;

    fn bank() -> Result<Bank> {
        Bank::try_from(*b"********************************")
    }

    fn signed_coin(bank: &Bank, owner: &str, seed: u64) -> Result<Coin> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut coin = Coin::new(owner, 25, bank.public_key(), CoinParams::default(), &mut rng)?;
        let envelope = coin.blind()?;
        coin.receive_signature(bank.sign_envelope(envelope)?)?;
        coin.unblind()?;
        Ok(coin)
    }

    #[test]
    fn lifecycle_reaches_spendable() -> Result<()> {
        let bank = bank()?;
        let mut rng = StdRng::seed_from_u64(7);
        let mut coin = Coin::new("alice", 10, bank.public_key(), CoinParams::default(), &mut rng)?;
        assert_eq!(coin.state(), CoinState::Created);

        let blinding = BlindingFactor::try_from(*b"11111111111111111111111111111111")?;
        let envelope = coin.blind_with(blinding)?;
        assert_eq!(coin.state(), CoinState::Blinded);

        coin.receive_signature(bank.sign_envelope(envelope)?)?;
        assert_eq!(coin.state(), CoinState::Signed);

        coin.unblind()?;
        assert_eq!(coin.state(), CoinState::Spendable);
        coin.verify_signature()?;
        Ok(())
    }

    #[test]
    fn canonical_form_round_trips_hashes() -> Result<()> {
        let bank = bank()?;
        let mut rng = StdRng::seed_from_u64(8);
        let coin = Coin::new("alice", 42, bank.public_key(), CoinParams::default(), &mut rng)?;

        let record: CoinRecord = coin.canonical().parse()?;
        assert_eq!(record.issuer, IssuerTag::Bank);
        assert_eq!(record.amount, 42);
        assert_eq!(record.identifier, coin.identifier());
        assert_eq!(record.left_hashes, coin.identity().hashes(Side::Left));
        assert_eq!(record.right_hashes, coin.identity().hashes(Side::Right));
        assert!(coin.canonical().starts_with("BANK-42-"));
        Ok(())
    }

    #[test]
    fn spendable_coin_forgets_issuance_material() -> Result<()> {
        let bank = bank()?;
        let coin = signed_coin(&bank, "alice-secret", 16)?;

        assert_eq!(coin.state(), CoinState::Spendable);
        assert!(coin.blinding.is_none());
        assert!(coin.envelope.is_none());
        assert!(coin.blind_signature.is_none());

        let shown = format!("{:?}", coin);
        assert!(!shown.contains("alice-secret"));
        assert!(!shown.contains("BlindingFactor"));
        assert!(!shown.contains("blind_signature"));
        assert!(shown.contains(coin.identifier()));
        Ok(())
    }

    #[test]
    fn parse_accepts_digest_hashes_only() -> Result<()> {
        let h = hash_hex(b"share");
        let good = format!("BANK-5-abc-{}-{}", h, h);
        assert_eq!(good.parse::<CoinRecord>()?.left_hashes, vec![h.clone()]);

        for text in &[
            format!("BANK-5-abc-{},,{}-{},{},{}", h, h, h, h, h),
            format!("BANK-5-abc-h1,h2-{},{}", h, h),
            format!("BANK-5-abc-{}-{}", h.to_uppercase(), h),
            format!("BANK-5-abc-{}-{}", &h[..63], h),
            format!("BANK-5-abc-{}0-{}", h, h),
        ] {
            assert!(
                matches!(text.parse::<CoinRecord>(), Err(Error::InvalidFormat(_))),
                "accepted {}",
                text
            );
        }
        Ok(())
    }

    #[test]
    fn parse_rejects_wrong_issuer() {
        let err = "MINT-5-abc-h1-h2".parse::<CoinRecord>().unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        for text in &[
            "BANK-5-abc-h1",
            "BANK-5-abc-h1-h2-h3",
            "BANK-five-abc-h1-h2",
            "BANK-5--h1-h2",
            "BANK-5-abc-h1,h2-h3",
            "BANK-5-abc--",
        ] {
            assert!(
                matches!(text.parse::<CoinRecord>(), Err(Error::InvalidFormat(_))),
                "accepted {}",
                text
            );
        }
    }

    #[test]
    fn rejects_zero_amount() -> Result<()> {
        let bank = bank()?;
        let mut rng = StdRng::seed_from_u64(9);
        let res = Coin::new("alice", 0, bank.public_key(), CoinParams::default(), &mut rng);
        assert!(matches!(res, Err(Error::InvalidAmount)));
        Ok(())
    }

    #[test]
    fn out_of_order_steps_fail() -> Result<()> {
        let bank = bank()?;
        let mut rng = StdRng::seed_from_u64(10);
        let mut coin = Coin::new("alice", 10, bank.public_key(), CoinParams::default(), &mut rng)?;

        assert!(matches!(
            coin.unblind(),
            Err(Error::InvalidState {
                expected: CoinState::Signed,
                found: CoinState::Created
            })
        ));
        assert!(matches!(coin.verify_signature(), Err(Error::InvalidSignature)));

        coin.blind()?;
        assert!(matches!(coin.blind(), Err(Error::InvalidState { .. })));
        Ok(())
    }

    #[test]
    fn foreign_envelope_is_refused() -> Result<()> {
        let bank = bank()?;
        let mut rng = StdRng::seed_from_u64(11);
        let mut coin = Coin::new("alice", 10, bank.public_key(), CoinParams::default(), &mut rng)?;
        let mut other = Coin::new("bob", 10, bank.public_key(), CoinParams::default(), &mut rng)?;
        coin.blind()?;
        let foreign = bank.sign_envelope(other.blind()?)?;

        assert!(matches!(
            coin.receive_signature(foreign),
            Err(Error::EnvelopeMismatch)
        ));
        assert_eq!(coin.state(), CoinState::Blinded);
        Ok(())
    }

    #[test]
    fn signature_from_other_bank_does_not_unblind() -> Result<()> {
        let bank = bank()?;
        let rogue = Bank::try_from(*b"################################")?;
        let mut rng = StdRng::seed_from_u64(12);
        let mut coin = Coin::new("alice", 10, bank.public_key(), CoinParams::default(), &mut rng)?;
        let envelope = coin.blind()?;
        coin.receive_signature(rogue.sign_envelope(envelope)?)?;

        assert!(matches!(coin.unblind(), Err(Error::InvalidSignature)));
        assert_eq!(coin.state(), CoinState::Signed);
        Ok(())
    }

    #[test]
    fn tampered_digest_fails_verification() -> Result<()> {
        let bank = bank()?;
        let mut coin = signed_coin(&bank, "alice", 13)?;
        coin.verify_signature()?;

        coin.set_amount(1_000_000);
        assert!(matches!(coin.verify_signature(), Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn tampered_signature_fails_verification() -> Result<()> {
        let bank = bank()?;
        let mut coin = signed_coin(&bank, "alice", 14)?;
        let other = signed_coin(&bank, "alice", 15)?;

        let foreign = other.signature().cloned().unwrap();
        coin.set_signature(foreign);
        assert!(matches!(coin.verify_signature(), Err(Error::InvalidSignature)));
        Ok(())
    }
}
