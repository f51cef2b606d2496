//! Manages the primary WebSocket connection lifecycle for a dialogue session.

use super::{
    protocol::{ClientMessage, ServerMessage},
    turn::handle_turn,
};
use crate::{models, state::AppState};
use anyhow::{Context, Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use smartauction_core::session::DialogueSession;
use std::sync::Arc;
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// This function is the entry point for a new connection. It performs the
/// initial handshake to load the session state and then spawns the main
/// dialogue loop.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let temp_id: u32 = rand::random();
    tracing::Span::current().record("session_id", &temp_id.to_string());
    info!("New WebSocket connection. Awaiting initialization...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    // The first message from the client must be an `init` message.
    let init_result = match socket_rx.next().await {
        Some(Ok(Message::Text(text))) => initialize_session_state(&text, &state).await,
        Some(Ok(_)) => Err(anyhow!("First message was not a text `init` message.")),
        _ => {
            info!("Client disconnected before sending init message.");
            return;
        }
    };

    let (session_id, dialogue, history) = match init_result {
        Ok(initialized) => initialized,
        Err(e) => {
            error!("Session initialization failed: {:?}", e);
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    // Confirm success and hand the client the state it is resuming into.
    if send_msg(
        &mut socket_tx,
        ServerMessage::Initialized {
            session_id,
            dialogue: dialogue.clone(),
            history: history.clone(),
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Initialized message to client.");
        return;
    }

    // Spawn the main session loop in a separate, instrumented task.
    let session_span = tracing::info_span!("dialogue_runtime", %session_id);
    tokio::spawn(
        async move {
            if let Err(e) =
                run_dialogue_session(state, socket_tx, socket_rx, session_id, dialogue, history)
                    .await
            {
                error!(error = ?e, "Dialogue session terminated with error.");
            }
            info!("Dialogue session finished.");
        }
        .instrument(session_span),
    );
}

/// Parses the `init` message and loads the corresponding session state from the database.
async fn initialize_session_state(
    init_text: &str,
    state: &Arc<AppState>,
) -> Result<(Uuid, DialogueSession, Vec<models::Message>)> {
    let init_msg: ClientMessage = serde_json::from_str(init_text)?;
    let session_id = if let ClientMessage::Init { session_id } = init_msg {
        session_id.context("`session_id` is required for `init`")?
    } else {
        return Err(anyhow!("First message must be `init`"));
    };

    tracing::Span::current().record("session_id", &session_id.to_string());
    info!("Attaching to session");

    let dialogue = state
        .db
        .get_latest_dialogue_state(session_id)
        .await?
        .context("Session state not found")?;
    let history = state.db.get_session_messages(session_id).await?;
    Ok((session_id, dialogue, history))
}

/// The main event loop for an active WebSocket session.
///
/// Turns are strictly sequential: one utterance is fully processed and
/// persisted before the next is read from the socket.
async fn run_dialogue_session(
    state: Arc<AppState>,
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut socket_rx: SplitStream<WebSocket>,
    session_id: Uuid,
    mut dialogue: DialogueSession,
    mut history: Vec<models::Message>,
) -> Result<()> {
    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) else {
                    warn!("Ignoring malformed client message.");
                    continue;
                };
                match msg {
                    ClientMessage::UserMessage { text } => {
                        let ended = handle_turn(
                            &state,
                            session_id,
                            &mut history,
                            &mut dialogue,
                            &text,
                            &mut socket_tx,
                        )
                        .await?;
                        if ended {
                            info!("Exit flow completed. Closing session.");
                            break;
                        }
                    }
                    ClientMessage::Init { .. } => {
                        warn!("Ignoring duplicate init message post-handshake.");
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client sent close frame. Shutting down session.");
                break;
            }
            Ok(Message::Binary(_)) => {
                warn!("Ignoring binary frame; this channel carries text only.");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }

    info!("WebSocket connection closed and dialogue session terminated.");
    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
