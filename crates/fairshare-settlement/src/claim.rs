//! Claim processor — at-most-once claim and overflow-refund execution.
//!
//! Ordering invariant, load-bearing: the one-way flag on the participant's
//! record is set **before** any external transfer is invoked. A transfer
//! capability that fails (or tries to re-enter) finds the participant
//! already marked settled; the engine surfaces `TransferFailed` and never
//! rolls the flag back or retries. That is the one operation in the system
//! whose failure leaves a participant marked without funds — a documented
//! manual-remediation case, accepted over re-entrancy-prone retry loops.

use tracing::{info, warn};

use fairshare_ledger::PledgeRecord;
use fairshare_types::{
    AccountId, CurrencyAmount, FairshareError, Result, TransferCapability,
};

use crate::calculator::{Settlement, SettlementCalculator};

/// Executes claims and overflow refunds against the final ledger total.
pub struct ClaimProcessor<'a, T: TransferCapability> {
    calculator: &'a SettlementCalculator,
    transfer: &'a mut T,
    /// Gated sales defer the refund component to the overflow window;
    /// open sales pay both sides in the single claim call.
    gated: bool,
}

impl<'a, T: TransferCapability> ClaimProcessor<'a, T> {
    pub fn new(calculator: &'a SettlementCalculator, transfer: &'a mut T, gated: bool) -> Self {
        Self {
            calculator,
            transfer,
            gated,
        }
    }

    /// Claim a participant's settlement. Returns the (refund, asset) pair
    /// actually transferred — in gated viable raises the refund component
    /// is deferred and reported as zero here.
    ///
    /// # Errors
    /// - [`FairshareError::NoCommitment`] for a zero recorded pledge
    /// - [`FairshareError::AlreadyClaimed`] on a repeat claim
    /// - [`FairshareError::TransferFailed`] if the capability fails after
    ///   the claim was marked
    pub fn claim(
        &mut self,
        participant: AccountId,
        record: &mut PledgeRecord,
        total_pledged: CurrencyAmount,
    ) -> Result<Settlement> {
        let pledged = record.pledged();
        if pledged == 0 {
            return Err(FairshareError::NoCommitment(participant));
        }

        // Mark before transferring.
        record.mark_claimed(participant)?;

        let settlement = self.calculator.settle(pledged, total_pledged);
        let raise_failed = total_pledged < self.calculator.min_viable_raise();

        let paid = if self.gated {
            if raise_failed {
                // The full pledge comes back here and the refund is fully
                // resolved, so the overflow window must not re-trigger for
                // this participant. The pledge amount itself is never
                // zeroed: a refund computed later must still see history.
                record.mark_refunded(participant)?;
                self.pay(participant, settlement)?
            } else {
                // Asset only; the currency refund, if any, belongs to the
                // overflow-refund window.
                self.pay(
                    participant,
                    Settlement {
                        refund: 0,
                        asset: settlement.asset,
                    },
                )?
            }
        } else {
            self.pay(participant, settlement)?
        };

        info!(
            %participant,
            refund = paid.refund,
            asset = paid.asset,
            "claim settled"
        );
        Ok(paid)
    }

    /// Pay the overflow refund (gated mode). Returns the amount refunded.
    ///
    /// # Errors
    /// - [`FairshareError::NoCommitment`] for a zero recorded pledge
    /// - [`FairshareError::AlreadyRefunded`] on a repeat refund (including
    ///   a refund already resolved by a failed-raise claim)
    /// - [`FairshareError::NotOverflowing`] if the total never reached the
    ///   funding target
    /// - [`FairshareError::TransferFailed`] if the capability fails after
    ///   the refund was marked
    pub fn overflow_refund(
        &mut self,
        participant: AccountId,
        record: &mut PledgeRecord,
        total_pledged: CurrencyAmount,
    ) -> Result<CurrencyAmount> {
        let pledged = record.pledged();
        if pledged == 0 {
            return Err(FairshareError::NoCommitment(participant));
        }
        if record.is_overflow_refunded() {
            return Err(FairshareError::AlreadyRefunded(participant));
        }
        if total_pledged < self.calculator.funding_target() {
            return Err(FairshareError::NotOverflowing);
        }

        // Mark before transferring.
        record.mark_refunded(participant)?;

        let settlement = self.calculator.settle(pledged, total_pledged);
        if settlement.refund > 0 {
            self.transfer
                .transfer_currency(participant, settlement.refund)
                .inspect_err(|_| {
                    warn!(%participant, "refund transfer failed after marking");
                })?;
        }

        info!(%participant, refund = settlement.refund, "overflow refund settled");
        Ok(settlement.refund)
    }

    /// Transfer the nonzero components of a settlement: asset first, then
    /// the currency refund.
    fn pay(&mut self, participant: AccountId, settlement: Settlement) -> Result<Settlement> {
        if settlement.asset > 0 {
            self.transfer
                .transfer_asset(participant, settlement.asset)
                .inspect_err(|_| {
                    warn!(%participant, "asset transfer failed after marking");
                })?;
        }
        if settlement.refund > 0 {
            self.transfer
                .transfer_currency(participant, settlement.refund)
                .inspect_err(|_| {
                    warn!(%participant, "refund transfer failed after marking");
                })?;
        }
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairshare_ledger::CommitmentLedger;
    use fairshare_types::testkit::RecordingTransfer;
    use fairshare_types::{SaleConfig, SaleId, SaleMode};

    fn calculator(mode: SaleMode) -> SettlementCalculator {
        SettlementCalculator::from_config(&SaleConfig {
            sale_id: SaleId::new(),
            asset_id: "FRS".to_string(),
            asset_pool: 1_000,
            funding_target: 100,
            min_viable_raise: 50,
            issuer: AccountId::new(),
            burn_sink: AccountId::new(),
            min_pledge: 1,
            max_pledge: 1_000,
            mode,
        })
    }

    fn gated_mode() -> SaleMode {
        SaleMode::Gated {
            allowlist_root: [0u8; 32],
        }
    }

    fn pledge(ledger: &mut CommitmentLedger, amount: u64) -> AccountId {
        let p = AccountId::new();
        ledger.record_pledge(p, amount).unwrap();
        p
    }

    #[test]
    fn open_claim_pays_both_sides() {
        let calc = calculator(SaleMode::Open);
        let mut transfer = RecordingTransfer::new();
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 60);
        // Second participant pushes the total to 120 (overflowing).
        pledge(&mut ledger, 60);

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, false);
        let paid = proc
            .claim(p, ledger.record_mut(&p).unwrap(), 120)
            .unwrap();

        assert_eq!(paid.refund, 10);
        assert_eq!(paid.asset, 500);
        assert_eq!(transfer.currency_paid_to(p), 10);
        assert_eq!(transfer.asset_paid_to(p), 500);
        assert!(ledger.record(&p).unwrap().is_claimed());
    }

    #[test]
    fn second_claim_rejected_without_payment() {
        let calc = calculator(SaleMode::Open);
        let mut transfer = RecordingTransfer::new();
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 60);

        {
            let mut proc = ClaimProcessor::new(&calc, &mut transfer, false);
            proc.claim(p, ledger.record_mut(&p).unwrap(), 60).unwrap();
        }
        let before = transfer.total_currency_out() + transfer.total_asset_out();

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, false);
        let err = proc
            .claim(p, ledger.record_mut(&p).unwrap(), 60)
            .unwrap_err();
        assert!(matches!(err, FairshareError::AlreadyClaimed(id) if id == p));
        assert_eq!(
            transfer.total_currency_out() + transfer.total_asset_out(),
            before
        );
    }

    #[test]
    fn gated_viable_claim_defers_refund() {
        let calc = calculator(gated_mode());
        let mut transfer = RecordingTransfer::new();
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 60);
        pledge(&mut ledger, 60);

        let paid = {
            let mut proc = ClaimProcessor::new(&calc, &mut transfer, true);
            proc.claim(p, ledger.record_mut(&p).unwrap(), 120)
                .unwrap()
        };

        assert_eq!(paid.refund, 0, "refund deferred to the overflow window");
        assert_eq!(paid.asset, 500);
        assert_eq!(transfer.currency_paid_to(p), 0);
        assert!(!ledger.record(&p).unwrap().is_overflow_refunded());

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, true);
        let refunded = proc
            .overflow_refund(p, ledger.record_mut(&p).unwrap(), 120)
            .unwrap();
        assert_eq!(refunded, 10);
        assert_eq!(transfer.currency_paid_to(p), 10);
    }

    #[test]
    fn gated_failed_raise_resolves_refund_in_claim() {
        let calc = calculator(gated_mode());
        let mut transfer = RecordingTransfer::new();
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 40);

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, true);
        let paid = proc
            .claim(p, ledger.record_mut(&p).unwrap(), 40)
            .unwrap();

        assert_eq!(paid.refund, 40);
        assert_eq!(paid.asset, 0);
        assert!(ledger.record(&p).unwrap().is_overflow_refunded());

        // The overflow window must not re-trigger for this participant.
        let err = proc
            .overflow_refund(p, ledger.record_mut(&p).unwrap(), 40)
            .unwrap_err();
        assert!(matches!(err, FairshareError::AlreadyRefunded(_)));
        assert_eq!(transfer.currency_paid_to(p), 40);
    }

    #[test]
    fn overflow_refund_requires_overflow() {
        let calc = calculator(gated_mode());
        let mut transfer = RecordingTransfer::new();
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 60);

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, true);
        // Total 60: viable but not overflowing.
        let err = proc
            .overflow_refund(p, ledger.record_mut(&p).unwrap(), 60)
            .unwrap_err();
        assert!(matches!(err, FairshareError::NotOverflowing));
        assert!(!ledger.record(&p).unwrap().is_overflow_refunded());
    }

    #[test]
    fn overflow_refund_at_exact_target_pays_zero() {
        // total == funding_target: no overflow refund owed, but the call
        // succeeds and marks the flag.
        let calc = calculator(gated_mode());
        let mut transfer = RecordingTransfer::new();
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 100);

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, true);
        let refunded = proc
            .overflow_refund(p, ledger.record_mut(&p).unwrap(), 100)
            .unwrap();
        assert_eq!(refunded, 0);
        assert!(ledger.record(&p).unwrap().is_overflow_refunded());
        assert_eq!(transfer.total_currency_out(), 0);
    }

    #[test]
    fn transfer_failure_leaves_participant_marked() {
        let calc = calculator(SaleMode::Open);
        let mut transfer = RecordingTransfer::new();
        transfer.fail_next_asset = true;
        let mut ledger = CommitmentLedger::new(1, 1_000);
        let p = pledge(&mut ledger, 60);

        let mut proc = ClaimProcessor::new(&calc, &mut transfer, false);
        let err = proc
            .claim(p, ledger.record_mut(&p).unwrap(), 60)
            .unwrap_err();
        assert!(matches!(err, FairshareError::TransferFailed { .. }));

        // Marked settled, nothing received — the documented manual
        // remediation case. A retry is rejected rather than double-paying.
        assert!(ledger.record(&p).unwrap().is_claimed());
        let err = proc
            .claim(p, ledger.record_mut(&p).unwrap(), 60)
            .unwrap_err();
        assert!(matches!(err, FairshareError::AlreadyClaimed(_)));
    }
}
