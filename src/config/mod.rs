//! Configuration management for unoq-link

pub mod app_config;

pub use app_config::*;
