//! # Block validation pipeline
//!
//! Blocks are validated in stages, each stage reading the DAG through a [`StagingArea`](model::staging::StagingArea)
//! and staging whatever it computes into it:
//!
//! - header in isolation: structure only, no DAG state
//! - proof of work, pruning point violation and difficulty: requires the parent headers
//! - header in context: GHOSTDAG, median time, mergeset size and the bounded merge depth rule
//! - body in isolation: transactions against the header and each other
//! - body in context: transactions against the DAG (finality, coinbase blue score, parent bodies)
//!
//! The [`BlockProcessor`](pipeline::block_processor::BlockProcessor) owns the order of stages and is the
//! only place staged data gets committed. Block templates are built on top of the virtual state by the
//! [`VirtualStateProcessor`](pipeline::virtual_processor::VirtualStateProcessor).

pub mod consensus;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod processes;
