//! Local port forwarding to USB-attached boards

pub mod helper;
pub mod manager;

pub use helper::{AdbHelper, ForwardHelper};
pub use manager::{Tunnel, TunnelManager, pick_local_port};
