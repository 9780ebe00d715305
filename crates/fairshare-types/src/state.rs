//! Mutable sale lifecycle state.
//!
//! `started` and `finalized` are one-way flags: each transitions
//! `false → true` exactly once, by the authority-only open action and the
//! sweep respectively. Records are never deleted and flags never cleared,
//! preserving auditability.

use serde::{Deserialize, Serialize};

use crate::CurrencyAmount;

/// Snapshot of the sale's lifecycle flags and running total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleState {
    /// Set once by the authority-only open action.
    pub started: bool,
    /// Set once by the sweep finalizer.
    pub finalized: bool,
    /// Sum of all recorded pledges. Monotonic during pledging, frozen after.
    pub total_pledged: CurrencyAmount,
}
