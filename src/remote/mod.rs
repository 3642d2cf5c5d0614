//! Client side of the board orchestrator API
//!
//! This module provides the request/response client and the push-event
//! stream client. Both resolve their target from the connection session on
//! every call.

pub mod client;
pub mod sse;
pub mod stream;

pub use client::{API_VERSION, RequestClient, api_url};
pub use stream::{EventStreamClient, StreamHandlers, Subscription};
