//! Identity-splitting commitments.
//!
//! Every coin carries `k` pairs of secret shares. For each pair,
//! `left[i] ^ right[i] == IDENTITY_MARKER || owner`, so a single side
//! reveals nothing, while two opposite sides of the same position give
//! the owner away. Each share is bound by a published hash.

use crate::error::{Error, Result};
use crate::utils::{hash_hex, xor};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Prefix that marks a successfully recombined identity.
pub const IDENTITY_MARKER: &[u8] = b"IDENTITY:";

/// Number of share pairs per coin when the caller does not choose.
pub const DEFAULT_REDUNDANCY: usize = 8;

/// Which half of the share pairs a merchant asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl From<bool> for Side {
    fn from(left: bool) -> Self {
        if left {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// One secret identity share.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share(Vec<u8>);

impl Share {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn commitment(&self) -> String {
        hash_hex(&self.0)
    }
}

impl From<Vec<u8>> for Share {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// shares are secrets; keep them out of logs and panics
impl std::fmt::Debug for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Share({})", &self.commitment()[..8])
    }
}

/// The marker-prefixed identity every share pair recombines to.
pub fn identity_payload(owner: &str) -> Vec<u8> {
    let mut payload = IDENTITY_MARKER.to_vec();
    payload.extend_from_slice(owner.as_bytes());
    payload
}

/// Inverse of [`identity_payload`]. `None` unless `payload` starts with the
/// marker and the remainder is a non-empty UTF-8 label.
pub fn recover_identity(payload: &[u8]) -> Option<String> {
    if !payload.starts_with(IDENTITY_MARKER) {
        return None;
    }
    let label = &payload[IDENTITY_MARKER.len()..];
    if label.is_empty() {
        return None;
    }
    String::from_utf8(label.to_vec()).ok()
}

#[derive(Clone, Debug)]
pub struct IdentityCommitment {
    left: Vec<Share>,
    right: Vec<Share>,
    left_hashes: Vec<String>,
    right_hashes: Vec<String>,
}

impl IdentityCommitment {
    /// Splits `owner` into `redundancy` random share pairs and commits to
    /// every share.
    pub fn generate<R: RngCore + ?Sized>(
        owner: &str,
        redundancy: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if owner.is_empty() {
            return Err(Error::InvalidOwner);
        }
        if redundancy == 0 {
            return Err(Error::InvalidRedundancy);
        }

        let payload = identity_payload(owner);
        let mut left = Vec::with_capacity(redundancy);
        let mut right = Vec::with_capacity(redundancy);
        for _ in 0..redundancy {
            let mut pad = vec![0u8; payload.len()];
            rng.fill_bytes(&mut pad);
            let complement = xor(&payload, &pad).ok_or(Error::InvalidOwner)?;
            left.push(Share(pad));
            right.push(Share(complement));
        }

        let left_hashes = left.iter().map(Share::commitment).collect();
        let right_hashes = right.iter().map(Share::commitment).collect();

        Ok(Self {
            left,
            right,
            left_hashes,
            right_hashes,
        })
    }

    pub fn redundancy(&self) -> usize {
        self.left.len()
    }

    pub fn shares(&self, side: Side) -> &[Share] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn hashes(&self, side: Side) -> &[String] {
        match side {
            Side::Left => &self.left_hashes,
            Side::Right => &self.right_hashes,
        }
    }

    #[cfg(test)]
    pub(crate) fn hashes_mut(&mut self, side: Side) -> &mut Vec<String> {
        match side {
            Side::Left => &mut self.left_hashes,
            Side::Right => &mut self.right_hashes,
        }
    }
}

/// Checks `shares` against `hashes` position by position.
pub fn verify_shares(side: Side, shares: &[Share], hashes: &[String]) -> Result<()> {
    for (index, share) in shares.iter().enumerate() {
        match hashes.get(index) {
            Some(hash) if *hash == share.commitment() => {}
            _ => return Err(Error::CommitmentMismatch { side, index }),
        }
    }
    if hashes.len() > shares.len() {
        return Err(Error::CommitmentMismatch {
            side,
            index: shares.len(),
        });
    }
    Ok(())
}
