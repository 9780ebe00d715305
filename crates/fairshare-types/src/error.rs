//! Error types for the Fairshare engine.
//!
//! All errors use the `FS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Configuration / window errors
//! - 2xx: Authorization errors
//! - 3xx: Phase / lifecycle errors
//! - 4xx: Pledge errors
//! - 5xx: Claim / refund errors
//! - 6xx: Sweep / transfer errors
//! - 9xx: General / internal errors
//!
//! Every rejection leaves engine state unchanged, with one documented
//! exception: `TransferFailed` surfaces after the claimed/refunded/finalized
//! flag has already been set (mark-then-transfer, no rollback).

use thiserror::Error;

use crate::{AccountId, CurrencyAmount, SalePhase};

/// Central error enum for all Fairshare operations.
#[derive(Debug, Error)]
pub enum FairshareError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// Constructor or window invariants violated.
    #[error("FS_ERR_100: Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Phase windows may only be set once, before the sale opens.
    #[error("FS_ERR_101: Phase windows already set")]
    WindowsAlreadySet,

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// Caller lacks required authority or allowlist proof.
    #[error("FS_ERR_200: Not authorized: {0}")]
    NotAuthorized(AccountId),

    // =================================================================
    // Phase / Lifecycle Errors (3xx)
    // =================================================================
    /// Operation attempted outside its valid clock phase.
    #[error("FS_ERR_300: Wrong phase: expected {expected}, got {actual}")]
    WrongPhase {
        expected: SalePhase,
        actual: SalePhase,
    },

    /// The sale has not been opened by the authority yet.
    #[error("FS_ERR_301: Sale not started")]
    NotStarted,

    /// The sale was already opened; the open action is single-shot.
    #[error("FS_ERR_302: Sale already started")]
    AlreadyStarted,

    // =================================================================
    // Pledge Errors (4xx)
    // =================================================================
    /// Pledge amount violates the per-participant bounds.
    #[error(
        "FS_ERR_400: Pledge out of range: cumulative {would_hold} outside [{min}, {max}]"
    )]
    PledgeOutOfRange {
        min: CurrencyAmount,
        max: CurrencyAmount,
        would_hold: CurrencyAmount,
    },

    // =================================================================
    // Claim / Refund Errors (5xx)
    // =================================================================
    /// Claim or refund attempted with zero recorded pledge.
    #[error("FS_ERR_500: No commitment recorded for {0}")]
    NoCommitment(AccountId),

    /// The claimed flag was already set for this participant.
    #[error("FS_ERR_501: Already claimed: {0}")]
    AlreadyClaimed(AccountId),

    /// The overflow-refunded flag was already set for this participant.
    #[error("FS_ERR_502: Already refunded: {0}")]
    AlreadyRefunded(AccountId),

    /// Overflow refund attempted while total pledges are below the target.
    #[error("FS_ERR_503: Not overflowing: total pledged is below the funding target")]
    NotOverflowing,

    // =================================================================
    // Sweep / Transfer Errors (6xx)
    // =================================================================
    /// The finalized flag was already set; the sweep is single-shot.
    #[error("FS_ERR_600: Sale already finalized")]
    AlreadyFinalized,

    /// The external transfer capability reported failure **after** state was
    /// marked settled. Requires manual remediation; never retried or rolled
    /// back, so a re-entrant retry loop cannot form.
    #[error("FS_ERR_601: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Integer arithmetic overflowed a 64-bit amount.
    #[error("FS_ERR_900: Amount overflow")]
    AmountOverflow,

    /// Unrecoverable internal error.
    #[error("FS_ERR_901: Internal error: {0}")]
    Internal(String),

    /// Conservation invariant violated — critical safety alert.
    #[error("FS_ERR_902: Conservation violation: {reason}")]
    ConservationViolation { reason: String },
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FairshareError>;
