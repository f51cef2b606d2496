//! Runs a single user utterance through the dialogue controller.

use crate::{
    models::{MessageRole, SessionStatus},
    state::AppState,
    ws::{protocol::ServerMessage, session::send_msg},
};
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use smartauction_core::{Command, session::DialogueSession};
use std::sync::Arc;
use uuid::Uuid;

/// Handles one turn of the conversation.
///
/// This involves:
/// 1. Recording the user utterance in the transcript.
/// 2. Advancing the dialogue state through the controller (which dispatches
///    any webhook the transition requires).
/// 3. Persisting the new dialogue state snapshot.
/// 4. Recording and sending the agent's replies.
///
/// Returns `true` when the exit flow completed and the session is over.
pub async fn handle_turn(
    state: &Arc<AppState>,
    session_id: Uuid,
    history: &mut Vec<crate::models::Message>,
    dialogue: &mut DialogueSession,
    user_text: &str,
    socket_tx: &mut SplitSink<WebSocket, Message>,
) -> Result<bool> {
    // Add the new user message to the database and local history.
    let new_user_msg = state
        .db
        .add_message(session_id, MessageRole::User, user_text)
        .await?;
    history.push(new_user_msg);

    let commands = state.controller.handle_utterance(dialogue, user_text).await;

    // Snapshot the state before replying, so a dropped connection can
    // resume from exactly this point.
    state.db.save_dialogue_state(session_id, dialogue).await?;
    send_msg(
        socket_tx,
        ServerMessage::StateUpdate {
            state: dialogue.clone(),
        },
    )
    .await?;

    let mut ended = false;
    for command in commands {
        match command {
            Command::Say(text) => {
                let new_agent_msg = state
                    .db
                    .add_message(session_id, MessageRole::Agent, &text)
                    .await?;
                history.push(new_agent_msg);
                send_msg(socket_tx, ServerMessage::Reply { text }).await?;
            }
            Command::EndSession(message) => {
                let new_agent_msg = state
                    .db
                    .add_message(session_id, MessageRole::Agent, &message)
                    .await?;
                history.push(new_agent_msg);
                state
                    .db
                    .update_session_status(session_id, SessionStatus::Ended)
                    .await?;
                send_msg(socket_tx, ServerMessage::SessionEnded { message }).await?;
                ended = true;
            }
        }
    }

    Ok(ended)
}
