//! Engine notifications for downstream indexers.
//!
//! Events are emitted synchronously with each successful state change and
//! appended to the engine's journal; they are never emitted for rejected
//! operations.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetAmount, CurrencyAmount, SaleId};

/// A notification of one successful state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    /// The authority opened the sale; the full pool is now in custody.
    SaleOpened {
        sale_id: SaleId,
        asset_pool: AssetAmount,
    },
    /// A pledge was recorded against a participant.
    PledgeRecorded {
        participant: AccountId,
        amount: CurrencyAmount,
    },
    /// Asset units were paid to a participant.
    AssetClaimed {
        participant: AccountId,
        amount: AssetAmount,
    },
    /// Currency was refunded to a participant.
    CurrencyRefunded {
        participant: AccountId,
        amount: CurrencyAmount,
    },
    /// The issuer sweep completed; the sale is finalized.
    SaleFinalized {
        currency_swept: CurrencyAmount,
        asset_burned: AssetAmount,
    },
}
