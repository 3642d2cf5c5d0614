//! Utility functions and helpers used throughout unoq-link

pub mod logging;
