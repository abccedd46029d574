pub mod block_depth;
pub mod coinbase;
pub mod dag_topology;
pub mod difficulty;
pub mod ghostdag;
pub mod past_median_time;
pub mod transaction_validator;
pub mod window;
