//! Sale lifecycle phases and the wall-clock phase derivation.
//!
//! A sale moves through non-overlapping phases, forward only:
//! **NOT_OPENED → PLEDGING → AWAITING_CLAIM → CLAIMING →
//! (OVERFLOW_REFUNDING, gated mode) → CLOSED**
//!
//! During PLEDGING, currency commitments flow into the ledger.
//! During CLAIMING, participants draw their pro-rata asset allocation
//! (and, in open mode, their refund in the same call).
//! During OVERFLOW_REFUNDING (gated mode only), the excess over the funding
//! target becomes claimable as a separate refund.
//! Once CLOSED, only the one-shot issuer sweep remains.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PhaseWindows;

/// The sale phases, ordered. Derived `Ord` follows declaration order, so
/// `phase >= SalePhase::Claiming` reads as "the claim window has opened".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SalePhase {
    /// Before the pledge window opens.
    NotOpened,
    /// Accepting pledges into the commitment ledger.
    Pledging,
    /// Pledges frozen; claims not yet open. The total is final here.
    AwaitingClaim,
    /// Participants may claim their settlement.
    Claiming,
    /// Gated mode only: overflow refunds are claimable (claims continue).
    OverflowRefunding,
    /// All participant windows closed; only the issuer sweep remains.
    Closed,
}

impl fmt::Display for SalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpened => write!(f, "NOT_OPENED"),
            Self::Pledging => write!(f, "PLEDGING"),
            Self::AwaitingClaim => write!(f, "AWAITING_CLAIM"),
            Self::Claiming => write!(f, "CLAIMING"),
            Self::OverflowRefunding => write!(f, "OVERFLOW_REFUNDING"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Pure mapping from wall-clock time and configured boundaries to the
/// current [`SalePhase`]. Holds no state beyond the boundaries themselves.
///
/// Boundary semantics are strict: a window named `x_open` admits the
/// operation while `x_open < now`, and a pledge is valid while
/// `pledge_open < now <= pledge_close`. Whether overflow refunds exist at
/// all is determined by the windows: `overflow_refund_open` is present
/// exactly when the sale is gated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhaseClock {
    windows: PhaseWindows,
}

impl PhaseClock {
    #[must_use]
    pub fn new(windows: PhaseWindows) -> Self {
        Self { windows }
    }

    #[must_use]
    pub fn windows(&self) -> &PhaseWindows {
        &self.windows
    }

    /// Derive the phase at `now`. Monotonic in `now` by construction: the
    /// boundaries are strictly increasing, so later instants never map to
    /// an earlier phase.
    #[must_use]
    pub fn phase_at(&self, now: DateTime<Utc>) -> SalePhase {
        let w = &self.windows;
        if now <= w.pledge_open {
            return SalePhase::NotOpened;
        }
        if now <= w.pledge_close {
            return SalePhase::Pledging;
        }
        if now <= w.claim_open {
            return SalePhase::AwaitingClaim;
        }
        if now > w.settle_close {
            return SalePhase::Closed;
        }
        match w.overflow_refund_open {
            Some(refund_open) if now > refund_open => SalePhase::OverflowRefunding,
            _ => SalePhase::Claiming,
        }
    }
}
