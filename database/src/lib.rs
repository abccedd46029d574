mod access;
mod errors;
mod item;
mod key;
mod staging;

pub mod prelude {
    pub use super::access::MemoryDbAccess;
    pub use super::errors::{StoreError, StoreErrorPredicates, StoreResult, StoreResultExt, StoreResultUnitExt};
    pub use super::item::MemoryDbItem;
    pub use super::key::{DbKey, StoreKey};
    pub use super::staging::{StagingDbAccess, StagingDbItem};
}
