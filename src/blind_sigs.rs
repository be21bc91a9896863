use crate::error::{Error, Result};
use crate::utils::*;
use blsttc::pairing::bls12_381::{Fr, G2};
use blsttc::{SecretKey, Signature};
use std::convert::TryFrom;
use std::convert::TryInto;

/// The purchaser's secret blinding scalar.
///
/// It never leaves the coin that generated it. The bank only ever sees
/// the digest multiplied by this factor.
#[derive(Clone, Debug)]
pub struct BlindingFactor(Fr);

impl BlindingFactor {
    pub fn random() -> Result<Self> {
        let sk = SecretKey::random();
        Ok(Self(fr_from_be_bytes(sk.to_bytes())?))
    }

    pub(crate) fn scalar(&self) -> Fr {
        self.0
    }

    /// Hides `digest` from the bank.
    pub(crate) fn place_in_envelope(&self, digest: &[u8]) -> Result<Envelope> {
        let digest_g2 = hash_to_g2(digest)?;
        Ok(Envelope::from(blind(digest_g2, self.0)))
    }
}

impl TryFrom<[u8; 32]> for BlindingFactor {
    type Error = Error;

    fn try_from(b: [u8; 32]) -> Result<Self> {
        Ok(Self(fr_from_be_bytes(b)?))
    }
}

/// An Envelope holds a coin digest without
/// revealing the digest to the signer.
#[derive(Clone, Debug)]
pub struct Envelope {
    blinded_msg: G2,
}

impl Envelope {
    pub fn blinded_msg(&self) -> G2 {
        self.blinded_msg
    }

    pub fn to_bytes(&self) -> [u8; 96] {
        g2_to_be_bytes(self.blinded_msg)
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes()[..] == other.to_bytes()[..]
    }
}

impl From<G2> for Envelope {
    fn from(blinded_msg: G2) -> Self {
        Self { blinded_msg }
    }
}

impl TryFrom<[u8; 96]> for Envelope {
    type Error = Error;

    fn try_from(b: [u8; 96]) -> Result<Self> {
        Ok(Self::from(g2_from_be_bytes(b)?))
    }
}

impl TryFrom<&[u8]> for Envelope {
    type Error = Error;

    fn try_from(b: &[u8]) -> Result<Self> {
        let bytes: [u8; 96] = b.try_into()?;
        Self::try_from(bytes)
    }
}

/// An Envelope which has the bank's signature written on it.
///
/// The envelope is lined with carbon paper: removing the blinding
/// factor from this signature leaves the bank's signature on the
/// coin digest inside, which the bank has never seen.
#[derive(Clone, Debug)]
pub struct SignedEnvelope {
    pub envelope: Envelope,
    signature: Signature,
}

impl SignedEnvelope {
    pub(crate) fn new(envelope: Envelope, signature: Signature) -> Self {
        Self {
            envelope,
            signature,
        }
    }

    pub fn signature_for_envelope(&self) -> &Signature {
        &self.signature
    }

    pub fn signature_for_digest(&self, blinding_factor: &BlindingFactor) -> Result<Signature> {
        let blinded_sig_g2 = g2_from_be_bytes(self.signature.to_bytes())?;
        let unblinded_sig_g2 = unblind(blinded_sig_g2, blinding_factor.scalar())?;

        Ok(Signature::from_bytes(g2_to_be_bytes(unblinded_sig_g2))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Bank;

    #[test]
    fn unblinded_signature_verifies_on_digest() -> Result<()> {
        let bank = Bank::try_from(*b"********************************")?;
        let blinding = BlindingFactor::try_from(*b"11111111111111111111111111111111")?;
        let digest = sha256(b"a coin digest");

        let envelope = blinding.place_in_envelope(&digest)?;
        let signed = bank.sign_envelope(envelope)?;
        let sig = signed.signature_for_digest(&blinding)?;

        assert!(verify_signature_on_digest(&digest, &sig, &bank.public_key())?);
        Ok(())
    }

    #[test]
    fn envelope_hides_digest() -> Result<()> {
        let bank = Bank::try_from(*b"********************************")?;
        let blinding = BlindingFactor::try_from(*b"11111111111111111111111111111111")?;
        let digest = sha256(b"a coin digest");

        let signed = bank.sign_envelope(blinding.place_in_envelope(&digest)?)?;

        // the signature the bank handed out is not a signature on the digest
        assert!(!verify_signature_on_digest(
            &digest,
            signed.signature_for_envelope(),
            &bank.public_key()
        )?);
        Ok(())
    }

    #[test]
    fn wrong_blinding_factor_gives_bad_signature() -> Result<()> {
        let bank = Bank::try_from(*b"********************************")?;
        let blinding = BlindingFactor::try_from(*b"11111111111111111111111111111111")?;
        let other = BlindingFactor::try_from(*b"22222222222222222222222222222222")?;
        let digest = sha256(b"a coin digest");

        let signed = bank.sign_envelope(blinding.place_in_envelope(&digest)?)?;
        let sig = signed.signature_for_digest(&other)?;

        assert!(!verify_signature_on_digest(&digest, &sig, &bank.public_key())?);
        Ok(())
    }

    #[test]
    fn envelope_bytes_round_trip() -> Result<()> {
        let blinding = BlindingFactor::try_from(*b"11111111111111111111111111111111")?;
        let envelope = blinding.place_in_envelope(b"digest")?;
        let bytes = envelope.to_bytes();
        assert_eq!(Envelope::try_from(&bytes[..])?, envelope);
        assert!(Envelope::try_from(&bytes[..10]).is_err());
        Ok(())
    }
}
