//! Pro-rata settlement calculator — the pure accounting core.
//!
//! Given one participant's final pledge and the final total, computes the
//! (refund, asset) split. Integer arithmetic only; every division truncates
//! toward zero. Aggregate truncation dust is absorbed at sweep, never by
//! reverting a claim.

use serde::{Deserialize, Serialize};

use fairshare_types::{
    AssetAmount, CurrencyAmount, SaleConfig, constants::REFUND_ROUNDING_UNIT, mul_div,
};

/// One participant's settlement: what comes back and what was bought.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Currency returned to the participant.
    pub refund: CurrencyAmount,
    /// Asset units allocated to the participant.
    pub asset: AssetAmount,
}

/// Pure function object encoding the pro-rata and rounding policy.
///
/// Valid for claim payout only once pledging has closed (the total is then
/// final); may be queried against a provisional total at any time as a
/// simulation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SettlementCalculator {
    funding_target: CurrencyAmount,
    min_viable_raise: CurrencyAmount,
    asset_pool: AssetAmount,
    /// Open mode rounds refunds down to [`REFUND_ROUNDING_UNIT`]; gated
    /// mode deliberately does not. The asymmetry is a recorded product
    /// decision carried over unchanged — do not unify it here.
    rounds_refund: bool,
}

impl SettlementCalculator {
    #[must_use]
    pub fn from_config(config: &SaleConfig) -> Self {
        Self {
            funding_target: config.funding_target,
            min_viable_raise: config.min_viable_raise,
            asset_pool: config.asset_pool,
            rounds_refund: !config.mode.is_gated(),
        }
    }

    /// Compute the (refund, asset) pair for one participant.
    ///
    /// - Zero pledge: nothing owed either way.
    /// - Failed raise (`total < min_viable_raise`): full refund, no asset.
    /// - Viable raise: `spend = min(pledged, pledged * target / total)` is
    ///   the participant's pro-rata share of the target, capped so nobody
    ///   spends more than they pledged; the refund is the remainder
    ///   (rounded down in open mode, the dust staying in the pool); the
    ///   allocation is `asset_pool * spend / target`.
    #[must_use]
    pub fn settle(&self, pledged: CurrencyAmount, total_pledged: CurrencyAmount) -> Settlement {
        if pledged == 0 {
            return Settlement::default();
        }
        if total_pledged < self.min_viable_raise {
            return Settlement {
                refund: pledged,
                asset: 0,
            };
        }

        // pledged <= total_pledged, so the share is at most funding_target
        // and the narrow back to u64 always succeeds.
        let share = mul_div(pledged, self.funding_target, total_pledged).unwrap_or(u64::MAX);
        let spend = pledged.min(share);

        let mut refund = pledged - spend;
        if self.rounds_refund {
            refund -= refund % REFUND_ROUNDING_UNIT;
        }

        // spend <= funding_target, so the allocation is at most asset_pool.
        let asset = mul_div(self.asset_pool, spend, self.funding_target).unwrap_or(0);

        Settlement { refund, asset }
    }

    #[must_use]
    pub fn funding_target(&self) -> CurrencyAmount {
        self.funding_target
    }

    #[must_use]
    pub fn min_viable_raise(&self) -> CurrencyAmount {
        self.min_viable_raise
    }

    #[must_use]
    pub fn asset_pool(&self) -> AssetAmount {
        self.asset_pool
    }
}
