//!
//! Conversions between the compact (`bits`) difficulty encoding and big integer targets,
//! plus the work implied by a target.
//!

pub mod compact;

pub use compact::{big_to_compact, calc_work, compact_to_big, target_from_le_bytes};
pub use num::BigInt;
