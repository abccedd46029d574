pub mod staging;
pub mod stores;
