//!
//! Constants which directly impact consensus and are shared by all networks.
//!

/// The block header version accepted by consensus
pub const BLOCK_VERSION: u16 = 1;

/// The transaction version accepted by consensus
pub const TX_VERSION: u16 = 0;

/// Threshold for transaction lock time. Values below are interpreted as a blue score,
/// values at or above as a timestamp in milliseconds
pub const LOCK_TIME_THRESHOLD: u64 = 500_000_000_000;

/// The number of smallest units in one coin
pub const SOMPI_PER_KESTREL: u64 = 100_000_000;

/// The maximum amount of sompi in circulation
pub const MAX_SOMPI: u64 = 29_000_000_000 * SOMPI_PER_KESTREL;

/// Sequence value marking an input as opted out of lock time enforcement
pub const MAX_TX_IN_SEQUENCE_NUM: u64 = u64::MAX;

/// Bit set in an input sequence to disable its relative lock
pub const SEQUENCE_LOCK_TIME_DISABLED: u64 = 1 << 63;

/// Mask extracting the relative lock (in DAA score units) from an input sequence
pub const SEQUENCE_LOCK_TIME_MASK: u64 = 0x0000_0000_ffff_ffff;
