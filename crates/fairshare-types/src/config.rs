//! Sale configuration and phase window boundaries.
//!
//! [`SaleConfig`] is immutable after construction; [`PhaseWindows`] is set
//! exactly once by the authority before the sale opens and never reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AccountId, AssetAmount, AssetId, CurrencyAmount, FairshareError, Result, SaleId,
};

/// Which participation regime the sale runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleMode {
    /// Anyone may pledge; one claim window pays both asset and refund.
    Open,
    /// Only participants with a valid allowlist membership proof may pledge;
    /// overflow refunds are claimable through a separate, later window.
    Gated {
        /// Merkle root committing to the allowlist.
        allowlist_root: [u8; 32],
    },
}

impl SaleMode {
    #[must_use]
    pub fn is_gated(&self) -> bool {
        matches!(self, Self::Gated { .. })
    }
}

/// Immutable terms of one sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Identifies this sale in events and logs.
    pub sale_id: SaleId,
    /// The asset being sold (symbol or external contract handle).
    pub asset_id: AssetId,
    /// Total asset units offered. Pulled into custody when the sale opens.
    pub asset_pool: AssetAmount,
    /// Currency amount the sale aims to raise. Caps per-participant spend
    /// pro-rata once total pledges exceed it.
    pub funding_target: CurrencyAmount,
    /// Minimum total raise for the sale to count as successful.
    pub min_viable_raise: CurrencyAmount,
    /// Receives the raised currency at sweep (and the pool back on failure).
    pub issuer: AccountId,
    /// Disposal destination for unsold asset units.
    pub burn_sink: AccountId,
    /// Lower bound on a participant's cumulative pledge.
    pub min_pledge: CurrencyAmount,
    /// Upper bound on a participant's cumulative pledge.
    pub max_pledge: CurrencyAmount,
    /// Open or gated participation.
    pub mode: SaleMode,
}

impl SaleConfig {
    /// Check the construction invariants.
    ///
    /// # Errors
    /// Returns [`FairshareError::InvalidConfig`] naming the violated
    /// invariant.
    pub fn validate(&self) -> Result<()> {
        if self.funding_target == 0 {
            return Err(invalid("funding_target must be positive"));
        }
        if self.asset_pool == 0 {
            return Err(invalid("asset_pool must be positive"));
        }
        if self.min_viable_raise > self.funding_target {
            return Err(invalid("min_viable_raise must not exceed funding_target"));
        }
        if self.min_pledge >= self.max_pledge {
            return Err(invalid("min_pledge must be below max_pledge"));
        }
        Ok(())
    }
}

/// The wall-clock boundaries of the sale, strictly increasing.
///
/// `overflow_refund_open` is present exactly when the sale is gated; the
/// open mode pays refunds inside the claim window and has no separate
/// refund boundary. `settle_close` ends all participant windows and is the
/// earliest instant the issuer sweep becomes legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWindows {
    /// Pledging admits amounts while `pledge_open < now <= pledge_close`.
    pub pledge_open: DateTime<Utc>,
    /// After this instant the total is frozen for settlement.
    pub pledge_close: DateTime<Utc>,
    /// Claims are accepted once `now > claim_open`.
    pub claim_open: DateTime<Utc>,
    /// Gated mode only: overflow refunds accepted once past this instant.
    pub overflow_refund_open: Option<DateTime<Utc>>,
    /// End of all participant windows; the sweep is legal after this.
    pub settle_close: DateTime<Utc>,
}

impl PhaseWindows {
    /// Check strict ordering and agreement with the sale mode.
    ///
    /// # Errors
    /// Returns [`FairshareError::InvalidConfig`] naming the violated
    /// invariant.
    pub fn validate(&self, mode: &SaleMode) -> Result<()> {
        if self.pledge_open >= self.pledge_close {
            return Err(invalid("pledge_open must precede pledge_close"));
        }
        if self.pledge_close > self.claim_open {
            return Err(invalid("pledge_close must not follow claim_open"));
        }
        match (mode, self.overflow_refund_open) {
            (SaleMode::Open, Some(_)) => {
                return Err(invalid("open mode has no overflow refund window"));
            }
            (SaleMode::Gated { .. }, None) => {
                return Err(invalid("gated mode requires an overflow refund window"));
            }
            (SaleMode::Gated { .. }, Some(refund_open)) => {
                if refund_open < self.claim_open {
                    return Err(invalid("overflow_refund_open must not precede claim_open"));
                }
                if refund_open >= self.settle_close {
                    return Err(invalid("overflow_refund_open must precede settle_close"));
                }
            }
            (SaleMode::Open, None) => {}
        }
        if self.claim_open >= self.settle_close {
            return Err(invalid("claim_open must precede settle_close"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> FairshareError {
    FairshareError::InvalidConfig {
        reason: reason.to_string(),
    }
}
