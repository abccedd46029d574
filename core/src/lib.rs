//!
//! Shared utilities for the Kestrel workspace: the logging facade, assertion
//! helpers used across test suites and wall-clock time primitives.
//!

extern crate self as kestrel_core;

pub mod assert;
pub mod log;
pub mod time;
