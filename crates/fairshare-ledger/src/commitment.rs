//! Commitment ledger — per-participant pledge bookkeeping.
//!
//! Records are created lazily on first pledge and never deleted. The
//! `claimed` and `overflow_refunded` flags are one-way: settlement marks
//! them through the record's own transition methods, which reject a second
//! attempt, so double-payment cannot pass the bookkeeping layer regardless
//! of caller discipline.
//!
//! The ledger enforces the per-participant bounds only. Phase, start, and
//! allowlist preconditions belong to the engine, which sequences them
//! before calling [`CommitmentLedger::record_pledge`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use fairshare_types::{AccountId, CurrencyAmount, FairshareError, Result};

/// One participant's standing in the sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PledgeRecord {
    pledged: CurrencyAmount,
    claimed: bool,
    overflow_refunded: bool,
}

impl PledgeRecord {
    /// Cumulative pledge. Monotonic during pledging, frozen after.
    #[must_use]
    pub fn pledged(&self) -> CurrencyAmount {
        self.pledged
    }

    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    #[must_use]
    pub fn is_overflow_refunded(&self) -> bool {
        self.overflow_refunded
    }

    /// One-way transition to claimed.
    ///
    /// # Errors
    /// [`FairshareError::AlreadyClaimed`] if the flag is already set.
    pub fn mark_claimed(&mut self, participant: AccountId) -> Result<()> {
        if self.claimed {
            return Err(FairshareError::AlreadyClaimed(participant));
        }
        self.claimed = true;
        Ok(())
    }

    /// One-way transition to overflow-refunded.
    ///
    /// # Errors
    /// [`FairshareError::AlreadyRefunded`] if the flag is already set.
    pub fn mark_refunded(&mut self, participant: AccountId) -> Result<()> {
        if self.overflow_refunded {
            return Err(FairshareError::AlreadyRefunded(participant));
        }
        self.overflow_refunded = true;
        Ok(())
    }
}

/// Records each participant's cumulative pledge and the running total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentLedger {
    min_pledge: CurrencyAmount,
    max_pledge: CurrencyAmount,
    records: HashMap<AccountId, PledgeRecord>,
    total_pledged: CurrencyAmount,
}

impl CommitmentLedger {
    #[must_use]
    pub fn new(min_pledge: CurrencyAmount, max_pledge: CurrencyAmount) -> Self {
        Self {
            min_pledge,
            max_pledge,
            records: HashMap::new(),
            total_pledged: 0,
        }
    }

    /// Record a pledge, creating the participant's record on first contact.
    ///
    /// The cumulative pledge after this call must land inside
    /// `[min_pledge, max_pledge]`. There is deliberately no cap on the
    /// running total: pledges past the funding target are resolved by
    /// settlement, not rejected here.
    ///
    /// Returns the participant's new cumulative pledge.
    ///
    /// # Errors
    /// - [`FairshareError::PledgeOutOfRange`] if the bounds are violated;
    ///   the record and total are left unchanged.
    /// - [`FairshareError::AmountOverflow`] if a 64-bit total would overflow.
    pub fn record_pledge(
        &mut self,
        participant: AccountId,
        amount: CurrencyAmount,
    ) -> Result<CurrencyAmount> {
        let would_hold = self.would_accept(&participant, amount)?;

        let new_total = self
            .total_pledged
            .checked_add(amount)
            .ok_or(FairshareError::AmountOverflow)?;

        self.records.entry(participant).or_default().pledged = would_hold;
        self.total_pledged = new_total;

        info!(%participant, amount, cumulative = would_hold, total = new_total, "pledge recorded");
        Ok(would_hold)
    }

    /// Pure precheck: the cumulative pledge this amount would produce, or
    /// the rejection [`record_pledge`](Self::record_pledge) would return.
    ///
    /// The engine runs this before pulling currency into custody so a
    /// bounds rejection never strands collected funds.
    pub fn would_accept(
        &self,
        participant: &AccountId,
        amount: CurrencyAmount,
    ) -> Result<CurrencyAmount> {
        let current = self
            .records
            .get(participant)
            .map_or(0, PledgeRecord::pledged);
        let would_hold = current
            .checked_add(amount)
            .ok_or(FairshareError::AmountOverflow)?;

        if would_hold < self.min_pledge || would_hold > self.max_pledge {
            return Err(FairshareError::PledgeOutOfRange {
                min: self.min_pledge,
                max: self.max_pledge,
                would_hold,
            });
        }
        Ok(would_hold)
    }

    /// Look up a participant's record.
    #[must_use]
    pub fn record(&self, participant: &AccountId) -> Option<&PledgeRecord> {
        self.records.get(participant)
    }

    /// Mutable access for settlement's one-way flag transitions.
    pub fn record_mut(&mut self, participant: &AccountId) -> Option<&mut PledgeRecord> {
        self.records.get_mut(participant)
    }

    /// Sum of all recorded pledges.
    #[must_use]
    pub fn total_pledged(&self) -> CurrencyAmount {
        self.total_pledged
    }

    /// Number of participants with a record.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.records.len()
    }

    /// Iterate over all records.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &PledgeRecord)> {
        self.records.iter()
    }

    /// Re-derive the running total from the records. Used by the
    /// conservation checks; a mismatch means the ledger itself is corrupt.
    ///
    /// # Errors
    /// [`FairshareError::Internal`] describing the mismatch.
    pub fn check_total(&self) -> Result<()> {
        let derived: u128 = self
            .records
            .values()
            .map(|r| u128::from(r.pledged))
            .sum();
        if derived != u128::from(self.total_pledged) {
            return Err(FairshareError::Internal(format!(
                "ledger total {} != sum of records {derived}",
                self.total_pledged
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> CommitmentLedger {
        CommitmentLedger::new(10, 100)
    }

    #[test]
    fn first_pledge_creates_record() {
        let mut led = ledger();
        let p = AccountId::new();
        assert_eq!(led.record_pledge(p, 40).unwrap(), 40);
        assert_eq!(led.record(&p).unwrap().pledged(), 40);
        assert_eq!(led.total_pledged(), 40);
        assert_eq!(led.participant_count(), 1);
    }

    #[test]
    fn pledges_accumulate() {
        let mut led = ledger();
        let p = AccountId::new();
        led.record_pledge(p, 40).unwrap();
        assert_eq!(led.record_pledge(p, 30).unwrap(), 70);
        assert_eq!(led.total_pledged(), 70);
        assert_eq!(led.participant_count(), 1);
    }

    #[test]
    fn below_minimum_rejected() {
        let mut led = ledger();
        let p = AccountId::new();
        let err = led.record_pledge(p, 5).unwrap_err();
        assert!(matches!(
            err,
            FairshareError::PledgeOutOfRange { would_hold: 5, .. }
        ));
        assert!(led.record(&p).is_none());
        assert_eq!(led.total_pledged(), 0);
    }

    #[test]
    fn over_maximum_rejected_and_state_unchanged() {
        let mut led = ledger();
        let p = AccountId::new();
        led.record_pledge(p, 100).unwrap();

        let err = led.record_pledge(p, 1).unwrap_err();
        assert!(matches!(
            err,
            FairshareError::PledgeOutOfRange {
                would_hold: 101,
                ..
            }
        ));
        assert_eq!(led.record(&p).unwrap().pledged(), 100);
        assert_eq!(led.total_pledged(), 100);
    }

    #[test]
    fn exactly_max_pledge_allowed() {
        let mut led = ledger();
        let p = AccountId::new();
        assert_eq!(led.record_pledge(p, 100).unwrap(), 100);
    }

    #[test]
    fn total_allowed_past_any_target() {
        // The ledger has no aggregate cap; overflow is settlement's job.
        let mut led = ledger();
        for _ in 0..50 {
            led.record_pledge(AccountId::new(), 100).unwrap();
        }
        assert_eq!(led.total_pledged(), 5_000);
        led.check_total().unwrap();
    }

    #[test]
    fn claim_flag_is_one_way() {
        let mut led = ledger();
        let p = AccountId::new();
        led.record_pledge(p, 50).unwrap();

        let record = led.record_mut(&p).unwrap();
        record.mark_claimed(p).unwrap();
        let err = record.mark_claimed(p).unwrap_err();
        assert!(matches!(err, FairshareError::AlreadyClaimed(id) if id == p));
        // The pledge itself is untouched by the flag transition.
        assert_eq!(led.record(&p).unwrap().pledged(), 50);
    }

    #[test]
    fn refund_flag_is_one_way() {
        let mut led = ledger();
        let p = AccountId::new();
        led.record_pledge(p, 50).unwrap();

        let record = led.record_mut(&p).unwrap();
        record.mark_refunded(p).unwrap();
        let err = record.mark_refunded(p).unwrap_err();
        assert!(matches!(err, FairshareError::AlreadyRefunded(id) if id == p));
    }

    #[test]
    fn check_total_matches_records() {
        let mut led = ledger();
        led.record_pledge(AccountId::new(), 30).unwrap();
        led.record_pledge(AccountId::new(), 70).unwrap();
        led.check_total().unwrap();
    }

    #[test]
    fn would_accept_has_no_effect() {
        let led = ledger();
        let p = AccountId::new();
        assert_eq!(led.would_accept(&p, 50).unwrap(), 50);
        assert!(led.would_accept(&p, 5).is_err());
        assert!(led.record(&p).is_none());
        assert_eq!(led.total_pledged(), 0);
    }

    #[test]
    fn ledger_serde_roundtrip() {
        let mut led = ledger();
        let p = AccountId::new();
        led.record_pledge(p, 60).unwrap();
        let json = serde_json::to_string(&led).unwrap();
        let back: CommitmentLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_pledged(), 60);
        assert_eq!(back.record(&p).unwrap().pledged(), 60);
    }
}
