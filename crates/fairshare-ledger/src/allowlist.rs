//! Allowlist gate for gated sales.
//!
//! The gate wraps a [`MembershipProver`] capability and turns a failed
//! proof into [`FairshareError::NotAuthorized`]. The default prover is a
//! SHA-256 Merkle proof checker against the root committed in the sale
//! config; proof construction lives outside the engine.

use sha2::{Digest, Sha256};
use tracing::warn;

use fairshare_types::{AccountId, FairshareError, MembershipProver, Result};

/// Authorizes pledges for gated sales.
#[derive(Debug)]
pub struct AllowlistGate<P: MembershipProver> {
    prover: P,
}

impl<P: MembershipProver> AllowlistGate<P> {
    #[must_use]
    pub fn new(prover: P) -> Self {
        Self { prover }
    }

    /// Check that `participant` belongs to the allowlist.
    ///
    /// # Errors
    /// [`FairshareError::NotAuthorized`] on a failed or missing proof.
    pub fn authorize(&self, participant: AccountId, proof: &[u8]) -> Result<()> {
        if self.prover.verify(&participant, proof) {
            Ok(())
        } else {
            warn!(%participant, "allowlist proof rejected");
            Err(FairshareError::NotAuthorized(participant))
        }
    }
}

/// SHA-256 Merkle membership prover.
///
/// Leaf = `sha256(domain tag || account bytes)`; interior nodes hash the pair in sorted
/// order, so a proof is just the concatenated 32-byte sibling hashes from
/// leaf to root, no direction bits needed.
#[derive(Debug, Clone, Copy)]
pub struct MerkleProver {
    root: [u8; 32],
}

impl MerkleProver {
    #[must_use]
    pub fn new(root: [u8; 32]) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    /// Leaf hash for an account.
    #[must_use]
    pub fn leaf(account: &AccountId) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"fairshare:allowlist:v1:");
        hasher.update(account.as_bytes());
        hasher.finalize().into()
    }

    /// Sorted-pair interior hash.
    #[must_use]
    pub fn node(a: [u8; 32], b: [u8; 32]) -> [u8; 32] {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut hasher = Sha256::new();
        hasher.update(lo);
        hasher.update(hi);
        hasher.finalize().into()
    }
}

impl MembershipProver for MerkleProver {
    fn verify(&self, identity: &AccountId, proof: &[u8]) -> bool {
        // Proofs are a whole number of 32-byte siblings.
        if proof.len() % 32 != 0 {
            return false;
        }
        let mut acc = Self::leaf(identity);
        for sibling in proof.chunks_exact(32) {
            let mut sib = [0u8; 32];
            sib.copy_from_slice(sibling);
            acc = Self::node(acc, sib);
        }
        acc == self.root
    }
}

impl std::fmt::Display for MerkleProver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "merkle:{}", hex::encode(&self.root[..8]))
    }
}
