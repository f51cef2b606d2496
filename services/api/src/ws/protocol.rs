//! Defines the WebSocket message protocol between the channel client and the API server.
//!
//! The channel client is whatever terminates speech: a telephony bridge, a
//! browser, or a test harness. Either way, what crosses this boundary is
//! text.

use crate::models;
use serde::{Deserialize, Serialize};
use smartauction_core::session::DialogueSession;
use uuid::Uuid;

/// Messages sent from the client to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Attaches to an existing session. This must be the first message.
    #[serde(rename = "init")]
    Init {
        /// The identifier of the session to attach to (created via REST).
        session_id: Option<Uuid>,
    },
    /// One user utterance, already transcribed to text.
    #[serde(rename = "user_message")]
    UserMessage { text: String },
}

/// Messages sent from the server to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms successful session attachment and provides the current state.
    Initialized {
        session_id: Uuid,
        dialogue: DialogueSession,
        history: Vec<models::Message>,
    },
    /// Pushes the updated dialogue state after a turn.
    StateUpdate { state: DialogueSession },
    /// One spoken/text reply from the agent.
    Reply { text: String },
    /// The exit flow completed; the session is over.
    SessionEnded { message: String },
    /// Reports a fatal error to the client.
    Error { message: String },
}
