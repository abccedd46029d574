pub mod block_processor;
pub mod body_processor;
pub mod header_processor;
pub mod virtual_processor;
