//! Shared tracing setup for the watchtower binaries.

mod subscriber;

pub use subscriber::{init as init_tracing, init_with_level};
