//! Conservation invariant checker.
//!
//! Tracks every movement of currency and asset across the custody boundary
//! and re-derives the invariants after settlement:
//!
//! ```text
//! currency collected == total pledged
//! currency paid out  <= currency collected
//! asset collected    == asset pool (once the sale is open)
//! asset paid out     <= asset collected
//! ```
//!
//! If these ever break, the accounting itself has gone wrong — this is the
//! safety net behind the per-operation checks, not a replacement for them.

use fairshare_types::{AssetAmount, CurrencyAmount, FairshareError, Result};

/// Running totals of value in and out of engine custody.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservationTracker {
    currency_in: u128,
    currency_out: u128,
    asset_in: u128,
    asset_out: u128,
}

impl ConservationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_currency_in(&mut self, amount: CurrencyAmount) {
        self.currency_in += u128::from(amount);
    }

    pub fn record_currency_out(&mut self, amount: CurrencyAmount) {
        self.currency_out += u128::from(amount);
    }

    pub fn record_asset_in(&mut self, amount: AssetAmount) {
        self.asset_in += u128::from(amount);
    }

    pub fn record_asset_out(&mut self, amount: AssetAmount) {
        self.asset_out += u128::from(amount);
    }

    /// Currency currently in custody. The inflow is a sum of checked `u64`
    /// pledges, so the narrow always succeeds.
    #[must_use]
    pub fn held_currency(&self) -> CurrencyAmount {
        u64::try_from(self.currency_in.saturating_sub(self.currency_out)).unwrap_or(u64::MAX)
    }

    /// Asset currently in custody.
    #[must_use]
    pub fn held_asset(&self) -> AssetAmount {
        u64::try_from(self.asset_in.saturating_sub(self.asset_out)).unwrap_or(u64::MAX)
    }

    /// Verify the currency side against the ledger's total.
    ///
    /// # Errors
    /// [`FairshareError::ConservationViolation`] describing the imbalance.
    pub fn verify_currency(&self, total_pledged: CurrencyAmount) -> Result<()> {
        if self.currency_in != u128::from(total_pledged) {
            return Err(violation(format!(
                "currency collected {} != total pledged {total_pledged}",
                self.currency_in
            )));
        }
        if self.currency_out > self.currency_in {
            return Err(violation(format!(
                "currency paid out {} exceeds collected {}",
                self.currency_out, self.currency_in
            )));
        }
        Ok(())
    }

    /// Verify the asset side against the configured pool.
    ///
    /// # Errors
    /// [`FairshareError::ConservationViolation`] describing the imbalance.
    pub fn verify_asset(&self, asset_pool: AssetAmount) -> Result<()> {
        if self.asset_in != u128::from(asset_pool) {
            return Err(violation(format!(
                "asset collected {} != pool {asset_pool}",
                self.asset_in
            )));
        }
        if self.asset_out > self.asset_in {
            return Err(violation(format!(
                "asset paid out {} exceeds collected {}",
                self.asset_out, self.asset_in
            )));
        }
        Ok(())
    }
}

fn violation(reason: String) -> FairshareError {
    FairshareError::ConservationViolation { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_holds_nothing() {
        let tracker = ConservationTracker::new();
        assert_eq!(tracker.held_currency(), 0);
        assert_eq!(tracker.held_asset(), 0);
        tracker.verify_currency(0).unwrap();
    }

    #[test]
    fn held_balances_net_in_and_out() {
        let mut tracker = ConservationTracker::new();
        tracker.record_currency_in(120);
        tracker.record_currency_out(20);
        tracker.record_asset_in(1_000);
        tracker.record_asset_out(500);
        assert_eq!(tracker.held_currency(), 100);
        assert_eq!(tracker.held_asset(), 500);
    }

    #[test]
    fn verify_passes_when_balanced() {
        let mut tracker = ConservationTracker::new();
        tracker.record_currency_in(120);
        tracker.record_currency_out(120);
        tracker.record_asset_in(1_000);
        tracker.record_asset_out(1_000);
        tracker.verify_currency(120).unwrap();
        tracker.verify_asset(1_000).unwrap();
    }

    #[test]
    fn verify_fails_on_currency_mismatch() {
        let mut tracker = ConservationTracker::new();
        tracker.record_currency_in(100);
        let err = tracker.verify_currency(120).unwrap_err();
        assert!(matches!(err, FairshareError::ConservationViolation { .. }));
    }

    #[test]
    fn verify_fails_on_overdrawn_asset() {
        let mut tracker = ConservationTracker::new();
        tracker.record_asset_in(1_000);
        tracker.record_asset_out(1_001);
        let err = tracker.verify_asset(1_000).unwrap_err();
        assert!(matches!(err, FairshareError::ConservationViolation { .. }));
    }
}
