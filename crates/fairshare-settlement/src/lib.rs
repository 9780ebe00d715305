//! # fairshare-settlement
//!
//! **Settlement plane**: pro-rata accounting, claim/refund execution, the
//! issuer sweep, and the [`SaleEngine`] facade that sequences everything.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────────────────────────┐
//!  caller ─────► │            SaleEngine            │
//!                │  (authority, phase clock, time   │
//!                │   high-water mark, event log)    │
//!                └──┬──────────┬──────────┬─────────┘
//!                   │          │          │
//!          CommitmentLedger    │     ConservationTracker
//!          (fairshare-ledger)  │
//!                   ┌──────────┴──────────┐
//!                   │                     │
//!           SettlementCalculator    SweepFinalizer
//!                   │
//!             ClaimProcessor ──► TransferCapability
//! ```
//!
//! The calculator is the only place the pro-rata formula lives; the claim
//! processor and the sweep both consume it. Every external value movement
//! goes through the caller-supplied [`TransferCapability`], and every
//! settled-state flag is set **before** the corresponding transfer runs.
//!
//! [`TransferCapability`]: fairshare_types::TransferCapability

pub mod calculator;
pub mod claim;
pub mod conservation;
pub mod engine;
pub mod sweep;

pub use calculator::{Settlement, SettlementCalculator};
pub use claim::ClaimProcessor;
pub use conservation::ConservationTracker;
pub use engine::SaleEngine;
pub use sweep::{SweepFinalizer, SweepOutcome};
