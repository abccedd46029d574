mod processor;
mod utxo_validation;

pub use processor::VirtualStateProcessor;
