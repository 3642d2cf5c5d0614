//! Error handling for unoq-link

pub mod types;

pub use types::*;
