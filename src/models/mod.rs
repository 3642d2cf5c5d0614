//! Data models and types used throughout unoq-link

pub mod app;
pub mod board;
pub mod events;

// Re-export commonly used types
pub use app::*;
pub use board::*;
pub use events::*;
