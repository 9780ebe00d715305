//! Test helpers shared across the workspace (behind the `test-helpers`
//! feature): a recording transfer capability with failure injection, and
//! trivial membership provers.

use crate::{
    AccountId, AssetAmount, CurrencyAmount, FairshareError, MembershipProver, Result,
    TransferCapability,
};

/// In-memory transfer capability that records every movement and can be
/// told to fail the next currency or asset transfer.
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    pub currency_in: Vec<(AccountId, CurrencyAmount)>,
    pub currency_out: Vec<(AccountId, CurrencyAmount)>,
    pub asset_in: Vec<(AccountId, AssetAmount)>,
    pub asset_out: Vec<(AccountId, AssetAmount)>,
    /// When set, the next `transfer_currency` fails and the flag clears.
    pub fail_next_currency: bool,
    /// When set, the next `transfer_asset` fails and the flag clears.
    pub fail_next_asset: bool,
}

impl RecordingTransfer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total currency paid out to `account`.
    #[must_use]
    pub fn currency_paid_to(&self, account: AccountId) -> CurrencyAmount {
        self.currency_out
            .iter()
            .filter(|(to, _)| *to == account)
            .map(|(_, amount)| amount)
            .sum()
    }

    /// Total asset paid out to `account`.
    #[must_use]
    pub fn asset_paid_to(&self, account: AccountId) -> AssetAmount {
        self.asset_out
            .iter()
            .filter(|(to, _)| *to == account)
            .map(|(_, amount)| amount)
            .sum()
    }

    /// Total currency paid out to anyone.
    #[must_use]
    pub fn total_currency_out(&self) -> CurrencyAmount {
        self.currency_out.iter().map(|(_, amount)| amount).sum()
    }

    /// Total asset paid out to anyone.
    #[must_use]
    pub fn total_asset_out(&self) -> AssetAmount {
        self.asset_out.iter().map(|(_, amount)| amount).sum()
    }
}

impl TransferCapability for RecordingTransfer {
    fn collect_currency(&mut self, from: AccountId, amount: CurrencyAmount) -> Result<()> {
        self.currency_in.push((from, amount));
        Ok(())
    }

    fn transfer_currency(&mut self, to: AccountId, amount: CurrencyAmount) -> Result<()> {
        if self.fail_next_currency {
            self.fail_next_currency = false;
            return Err(FairshareError::TransferFailed {
                reason: format!("injected currency failure paying {to}"),
            });
        }
        self.currency_out.push((to, amount));
        Ok(())
    }

    fn collect_asset(&mut self, from: AccountId, amount: AssetAmount) -> Result<()> {
        self.asset_in.push((from, amount));
        Ok(())
    }

    fn transfer_asset(&mut self, to: AccountId, amount: AssetAmount) -> Result<()> {
        if self.fail_next_asset {
            self.fail_next_asset = false;
            return Err(FairshareError::TransferFailed {
                reason: format!("injected asset failure paying {to}"),
            });
        }
        self.asset_out.push((to, amount));
        Ok(())
    }
}

/// Prover that admits every identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllProver;

impl MembershipProver for AllowAllProver {
    fn verify(&self, _identity: &AccountId, _proof: &[u8]) -> bool {
        true
    }
}

/// Prover that rejects every identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllProver;

impl MembershipProver for DenyAllProver {
    fn verify(&self, _identity: &AccountId, _proof: &[u8]) -> bool {
        false
    }
}
