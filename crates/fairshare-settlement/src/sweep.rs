//! Sweep finalizer — the one-shot issuer-side settlement.
//!
//! Runs once the participant windows have closed. Sends the issuer's
//! proceeds, disposes of unsold asset, and handles the failed-raise branch.
//! The engine sets `finalized` before any transfer here is attempted.

use serde::{Deserialize, Serialize};
use tracing::info;

use fairshare_types::{
    AccountId, AssetAmount, CurrencyAmount, Result, SaleConfig, TransferCapability, mul_div,
};

/// What the sweep moved, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Currency sent to the issuer.
    pub currency_swept: CurrencyAmount,
    /// Unsold asset sent to the disposal sink.
    pub asset_burned: AssetAmount,
    /// Asset returned to the issuer on a failed raise.
    pub asset_returned: AssetAmount,
}

/// Computes and executes the final issuer-side settlement.
#[derive(Debug, Clone, Copy)]
pub struct SweepFinalizer {
    issuer: AccountId,
    burn_sink: AccountId,
    asset_pool: AssetAmount,
    funding_target: CurrencyAmount,
    min_viable_raise: CurrencyAmount,
}

impl SweepFinalizer {
    #[must_use]
    pub fn from_config(config: &SaleConfig) -> Self {
        Self {
            issuer: config.issuer,
            burn_sink: config.burn_sink,
            asset_pool: config.asset_pool,
            funding_target: config.funding_target,
            min_viable_raise: config.min_viable_raise,
        }
    }

    /// Execute the sweep against the final total and the currency actually
    /// held in custody.
    ///
    /// - Failed raise: the whole pool goes back to the issuer, no currency.
    /// - Viable, at or under target: the issuer receives the full total;
    ///   the unsold fraction `pool * (target - total) / target` burns.
    /// - Overflowing: the issuer receives `min(target, held)` — capping at
    ///   the held balance absorbs aggregate truncation dust already paid
    ///   out in refunds; no asset is disposed, the pool was fully
    ///   allocated pro-rata.
    ///
    /// # Errors
    /// [`FairshareError::TransferFailed`](fairshare_types::FairshareError::TransferFailed)
    /// if the capability reports failure; the engine's `finalized` flag is
    /// already set at that point and is not rolled back.
    pub fn finalize<T: TransferCapability>(
        &self,
        total_pledged: CurrencyAmount,
        held_currency: CurrencyAmount,
        transfer: &mut T,
    ) -> Result<SweepOutcome> {
        let outcome = if total_pledged < self.min_viable_raise {
            transfer.transfer_asset(self.issuer, self.asset_pool)?;
            SweepOutcome {
                currency_swept: 0,
                asset_burned: 0,
                asset_returned: self.asset_pool,
            }
        } else if total_pledged <= self.funding_target {
            transfer.transfer_currency(self.issuer, total_pledged)?;
            let unsold = self.funding_target - total_pledged;
            // unsold <= funding_target, so the quotient fits.
            let burned = mul_div(self.asset_pool, unsold, self.funding_target).unwrap_or(0);
            if burned > 0 {
                transfer.transfer_asset(self.burn_sink, burned)?;
            }
            SweepOutcome {
                currency_swept: total_pledged,
                asset_burned: burned,
                asset_returned: 0,
            }
        } else {
            let swept = self.funding_target.min(held_currency);
            if swept > 0 {
                transfer.transfer_currency(self.issuer, swept)?;
            }
            SweepOutcome {
                currency_swept: swept,
                asset_burned: 0,
                asset_returned: 0,
            }
        };

        info!(
            total_pledged,
            currency_swept = outcome.currency_swept,
            asset_burned = outcome.asset_burned,
            asset_returned = outcome.asset_returned,
            "sweep finalized"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairshare_types::testkit::RecordingTransfer;
    use fairshare_types::{SaleId, SaleMode};

    fn finalizer() -> (SweepFinalizer, AccountId, AccountId) {
        let issuer = AccountId::new();
        let burn_sink = AccountId::new();
        let sweeper = SweepFinalizer::from_config(&SaleConfig {
            sale_id: SaleId::new(),
            asset_id: "FRS".to_string(),
            asset_pool: 1_000,
            funding_target: 100,
            min_viable_raise: 50,
            issuer,
            burn_sink,
            min_pledge: 1,
            max_pledge: 1_000,
            mode: SaleMode::Open,
        });
        (sweeper, issuer, burn_sink)
    }

    #[test]
    fn failed_raise_returns_pool() {
        let (sweeper, issuer, _) = finalizer();
        let mut transfer = RecordingTransfer::new();
        let outcome = sweeper.finalize(40, 40, &mut transfer).unwrap();
        assert_eq!(outcome.currency_swept, 0);
        assert_eq!(outcome.asset_burned, 0);
        assert_eq!(outcome.asset_returned, 1_000);
        assert_eq!(transfer.asset_paid_to(issuer), 1_000);
        assert_eq!(transfer.total_currency_out(), 0);
    }

    #[test]
    fn under_target_burns_unsold_fraction() {
        let (sweeper, issuer, burn_sink) = finalizer();
        let mut transfer = RecordingTransfer::new();
        // Raised 60 of 100: 40% of the pool is unsold.
        let outcome = sweeper.finalize(60, 60, &mut transfer).unwrap();
        assert_eq!(outcome.currency_swept, 60);
        assert_eq!(outcome.asset_burned, 400);
        assert_eq!(transfer.currency_paid_to(issuer), 60);
        assert_eq!(transfer.asset_paid_to(burn_sink), 400);
    }

    #[test]
    fn exactly_at_target_burns_nothing() {
        let (sweeper, issuer, burn_sink) = finalizer();
        let mut transfer = RecordingTransfer::new();
        let outcome = sweeper.finalize(100, 100, &mut transfer).unwrap();
        assert_eq!(outcome.currency_swept, 100);
        assert_eq!(outcome.asset_burned, 0);
        assert_eq!(transfer.currency_paid_to(issuer), 100);
        assert_eq!(transfer.asset_paid_to(burn_sink), 0);
    }

    #[test]
    fn overflow_sweeps_target_no_burn() {
        let (sweeper, issuer, _) = finalizer();
        let mut transfer = RecordingTransfer::new();
        // Total 120, refunds of 20 already paid: held = 100.
        let outcome = sweeper.finalize(120, 100, &mut transfer).unwrap();
        assert_eq!(outcome.currency_swept, 100);
        assert_eq!(outcome.asset_burned, 0);
        assert_eq!(transfer.currency_paid_to(issuer), 100);
    }

    #[test]
    fn overflow_capped_at_held_balance() {
        let (sweeper, issuer, _) = finalizer();
        let mut transfer = RecordingTransfer::new();
        // Dust already left custody: held is below the nominal target.
        let outcome = sweeper.finalize(120, 97, &mut transfer).unwrap();
        assert_eq!(outcome.currency_swept, 97);
        assert_eq!(transfer.currency_paid_to(issuer), 97);
    }

    #[test]
    fn outcome_serde_roundtrip() {
        let outcome = SweepOutcome {
            currency_swept: 100,
            asset_burned: 0,
            asset_returned: 0,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        let back: SweepOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
    }

    #[test]
    fn threshold_boundary_is_viable_at_sweep() {
        let (sweeper, issuer, burn_sink) = finalizer();
        let mut transfer = RecordingTransfer::new();
        let outcome = sweeper.finalize(50, 50, &mut transfer).unwrap();
        assert_eq!(outcome.currency_swept, 50);
        assert_eq!(outcome.asset_burned, 500);
        assert_eq!(outcome.asset_returned, 0);
        assert_eq!(transfer.currency_paid_to(issuer), 50);
        assert_eq!(transfer.asset_paid_to(burn_sink), 500);
    }
}
