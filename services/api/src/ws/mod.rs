//! WebSocket Session Management
//!
//! This module contains the core logic for handling live dialogue sessions
//! over WebSockets. It is structured into submodules for clarity:
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the WebSocket connection lifecycle, from handshake to termination.
//! - `turn`: Runs a single user utterance through the dialogue controller.

pub mod protocol;
pub mod session;
mod turn;

pub use session::ws_handler;
