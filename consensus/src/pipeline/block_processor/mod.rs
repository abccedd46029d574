mod processor;

pub use processor::BlockProcessor;
