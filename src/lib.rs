//! cohost_linux_rs - Linux client for a live voice co-host session.
//!
//! Streams the local microphone to a remote conversational agent over a
//! websocket and plays the agent's streamed audio replies gaplessly, while
//! pushing status and volume telemetry to the dashboard UI process.

pub mod audio;
pub mod config;
pub mod net_link;
pub mod protocol;
pub mod session;
pub mod session_log;
pub mod ui_bridge;
