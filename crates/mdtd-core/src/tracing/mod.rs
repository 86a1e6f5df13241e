//! Tracing setup for MDTD binaries and tests.

pub mod setup;

pub use setup::{init_tracing, init_tracing_with_filter};
