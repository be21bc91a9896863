use crate::error::{Error, Result};
use blst::{blst_hash_to_g2, blst_p2, blst_p2_compress};
use blsttc::ff::{Field, PrimeField}; // for Fr trait
use blsttc::group::{CurveAffine, CurveProjective, EncodedPoint};
use blsttc::pairing::bls12_381::{Fr, FrRepr, G2Affine, G2};
use blsttc::{PublicKey, Signature};
use sha2::{Digest, Sha256};

const HASH_TO_G2_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// One-way commitment hash: lowercase hex of SHA-256.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub(crate) fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// Byte-wise exclusive-or. `None` if the inputs differ in length.
pub fn xor(a: &[u8], b: &[u8]) -> Option<Vec<u8>> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

/// Checks a plain (unblinded) signature over `digest`.
///
/// The signature is an ordinary BLS signature once unblinded, so this is
/// `pair(pk, H(digest)) == pair(g1, sig)` with the same hash-to-G2 used
/// when the digest was blinded.
pub(crate) fn verify_signature_on_digest(
    digest: &[u8],
    sig: &Signature,
    pk: &PublicKey,
) -> Result<bool> {
    let digest_g2 = hash_to_g2(digest)?;
    Ok(pk.verify_g2(sig, digest_g2))
}

pub(crate) fn hash_to_g2(msg: &[u8]) -> Result<G2> {
    let mut point: blst_p2 = Default::default();
    let aug: &[u8] = b"";
    unsafe {
        blst_hash_to_g2(
            &mut point,
            msg.as_ptr(),
            msg.len(),
            HASH_TO_G2_DST.as_ptr(),
            HASH_TO_G2_DST.len(),
            aug.as_ptr(),
            aug.len(),
        )
    };
    let mut compressed = [0u8; 96];
    unsafe { blst_p2_compress(compressed.as_mut_ptr(), &point) }
    g2_from_be_bytes(compressed)
}

/// Reads a big-endian scalar into the little-endian limbs of `FrRepr`.
pub(crate) fn fr_from_be_bytes(bytes: [u8; 32]) -> Result<Fr> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.rchunks(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_be_bytes(word);
    }
    Fr::from_repr(FrRepr(limbs)).map_err(|_| Error::InvalidScalar)
}

// y = x * r
pub(crate) fn blind(g2: G2, r: Fr) -> G2 {
    g2.into_affine().mul(r)
}

// x = y * 1/r
pub(crate) fn unblind(g2: G2, r: Fr) -> Result<G2> {
    let r_inv = r.inverse().ok_or(Error::InvalidScalar)?;
    Ok(g2.into_affine().mul(r_inv))
}

// sig = x * sk, the same operation as blinding with the secret key as factor
pub(crate) fn sign_g2(g2: G2, sk: Fr) -> G2 {
    g2.into_affine().mul(sk)
}

pub(crate) fn g2_from_be_bytes(bytes: [u8; 96]) -> Result<G2> {
    let mut compressed: <G2Affine as CurveAffine>::Compressed = EncodedPoint::empty();
    compressed.as_mut().copy_from_slice(&bytes[..]);
    compressed
        .into_affine()
        .map(|affine| affine.into_projective())
        .map_err(|_| Error::InvalidPoint)
}

pub(crate) fn g2_to_be_bytes(g2: G2) -> [u8; 96] {
    let mut bytes = [0u8; 96];
    bytes.copy_from_slice(g2.into_affine().into_compressed().as_ref());
    bytes
}
