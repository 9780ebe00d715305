//! Capability traits at the engine's trust boundaries.
//!
//! The engine decides amounts; these collaborators move value, gate
//! privileged operations, and verify allowlist membership. Their internals
//! (payment rails, key management, proof construction) live outside this
//! workspace.

use crate::{AccountId, AssetAmount, CurrencyAmount, Result};

/// Moves currency and asset between external accounts and engine custody.
///
/// A reported failure maps to `FS_ERR_601 TransferFailed` and is fatal to
/// the calling operation. The engine always sets its bookkeeping flag
/// **before** invoking a transfer and never rolls the flag back, so a
/// failing capability cannot re-enter and double-pay.
pub trait TransferCapability {
    /// Pull currency from an external account into custody.
    fn collect_currency(&mut self, from: AccountId, amount: CurrencyAmount) -> Result<()>;

    /// Pay currency out of custody.
    fn transfer_currency(&mut self, to: AccountId, amount: CurrencyAmount) -> Result<()>;

    /// Pull asset units from an external account into custody.
    fn collect_asset(&mut self, from: AccountId, amount: AssetAmount) -> Result<()>;

    /// Pay asset units out of custody.
    fn transfer_asset(&mut self, to: AccountId, amount: AssetAmount) -> Result<()>;
}

/// Gates the privileged operations: `set_windows`, `open`, `finalize`.
pub trait AuthorityCapability {
    /// Whether `caller` holds administrative authority over the sale.
    fn authorize(&self, caller: &AccountId) -> bool;
}

/// Answers allowlist membership queries for gated sales.
///
/// The proof encoding is owned by the prover implementation; the engine
/// treats it as opaque bytes.
pub trait MembershipProver {
    /// Whether `identity` belongs to the allowlist, given `proof`.
    fn verify(&self, identity: &AccountId, proof: &[u8]) -> bool;
}

/// The single designated administrative identity.
#[derive(Debug, Clone, Copy)]
pub struct SingleAdmin(pub AccountId);

impl AuthorityCapability for SingleAdmin {
    fn authorize(&self, caller: &AccountId) -> bool {
        *caller == self.0
    }
}
