//! Tracing/logging setup shared by the larder binaries.

mod tracing_init;

pub use tracing_init::init;
