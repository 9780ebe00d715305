//! # fairshare-types
//!
//! Shared types, errors, and configuration for the **Fairshare**
//! allocation-and-settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`SaleId`]
//! - **Amounts**: [`CurrencyAmount`], [`AssetAmount`], [`mul_div`]
//! - **Configuration**: [`SaleConfig`], [`SaleMode`], [`PhaseWindows`]
//! - **Phase model**: [`SalePhase`], [`PhaseClock`]
//! - **Lifecycle state**: [`SaleState`]
//! - **Capabilities**: [`TransferCapability`], [`AuthorityCapability`],
//!   [`MembershipProver`], [`SingleAdmin`]
//! - **Events**: [`SaleEvent`]
//! - **Errors**: [`FairshareError`] with `FS_ERR_` prefix codes
//! - **Constants**: rounding quantum and engine identity

pub mod amount;
pub mod capability;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod phase;
pub mod state;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;

// Re-export all primary types at crate root for ergonomic imports:
//   use fairshare_types::{SaleConfig, SalePhase, FairshareError, ...};

pub use amount::*;
pub use capability::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use phase::*;
pub use state::*;

// Constants are accessed via `fairshare_types::constants::FOO`
// (not re-exported to avoid name collisions).
