mod pow_validation;
mod processor;
mod validate_in_context;
mod validate_in_isolation;

pub use processor::HeaderProcessor;
