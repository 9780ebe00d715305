//! System-wide constants for the Fairshare engine.

/// Open-mode refunds are rounded down to a multiple of this many smallest
/// currency units; the remainder stays in the pool as dust and is absorbed
/// at sweep. Gated mode deliberately does not round (see the settlement
/// calculator).
pub const REFUND_ROUNDING_UNIT: u64 = 10;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Fairshare";
