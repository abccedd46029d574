pub mod block;
pub mod coinbase;
pub mod tx;
