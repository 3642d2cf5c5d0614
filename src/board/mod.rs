//! Board discovery

pub mod registry;

pub use registry::*;
