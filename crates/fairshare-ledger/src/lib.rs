//! # fairshare-ledger
//!
//! **Pledge intake plane**: the commitment ledger and the allowlist gate.
//!
//! ## Architecture
//!
//! The intake plane sits between the caller and the settlement plane:
//! 1. **AllowlistGate**: gated sales only — verifies a membership proof
//!    before any bookkeeping happens
//! 2. **CommitmentLedger**: per-participant cumulative pledges, one-way
//!    claim/refund flags, and the running total
//!
//! ## Pledge Flow
//!
//! ```text
//! caller → PhaseClock check → AllowlistGate.authorize() (gated)
//!        → TransferCapability.collect_currency()
//!        → CommitmentLedger.record_pledge()
//! ```
//!
//! The engine in `fairshare-settlement` sequences these steps; nothing in
//! this crate consults the clock or moves value.

pub mod allowlist;
pub mod commitment;

pub use allowlist::{AllowlistGate, MerkleProver};
pub use commitment::{CommitmentLedger, PledgeRecord};
