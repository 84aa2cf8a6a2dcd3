//! WebSocket play channel: upgrade, message loop, and the session ticker.
//!
//! Each client message is parsed as JSON and forwarded to core logic; we
//! reply with a single JSON message per request. The connection also runs
//! the once-per-second ticker for whichever session it is driving; the
//! interval dies with the connection, and ticks outside the question loop
//! are no-ops, so nothing leaks and no time is charged between questions.

use std::sync::Arc;
use std::time::Duration;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "wordquest_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "wordquest_backend", "WebSocket connected");
  // The session this connection is driving; set by start_drill and kept on
  // every subsequent session-scoped message.
  let mut active_session: Option<String> = None;
  let mut ticker = tokio::time::interval(Duration::from_secs(1));

  loop {
    tokio::select! {
      _ = ticker.tick() => {
        if let Some(id) = &active_session {
          tick_session(&state, id).await;
        }
      }
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            // Parse, dispatch, serialize response.
            let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target = "wordquest_backend", "WS received: {:?}", &incoming);
                handle_client_ws(incoming, &state, &mut active_session).await
              }
              Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
            };

            let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
              serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
            });

            if let Err(e) = socket.send(Message::Text(out)).await {
              error!(target: "wordquest_backend", error = %e, "WS send error");
              break;
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
    }
  }
  info!(target: "wordquest_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, active_session))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  active_session: &mut Option<String>,
) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartDrill { drill_id, player, preview } => {
      match start_session(state, drill_id.as_deref(), player, preview).await {
        Ok(session) => {
          tracing::info!(target: "session", id = %session.id, drill = %session.drill_id, "WS session started");
          *active_session = Some(session.id.clone());
          ServerWsMessage::Session { session }
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Next { session_id } => {
      *active_session = Some(session_id.clone());
      match session_next(state, &session_id).await {
        Ok(session) => ServerWsMessage::Session { session },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Back { session_id } => {
      *active_session = Some(session_id.clone());
      match session_back(state, &session_id).await {
        Ok(session) => ServerWsMessage::Session { session },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Answer { session_id, input } => {
      *active_session = Some(session_id.clone());
      match session_answer(state, &session_id, input).await {
        Ok(step) => ServerWsMessage::Answer { outcome: step.outcome, session: step.session },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Retake { session_id } => {
      *active_session = Some(session_id.clone());
      match session_retake(state, &session_id).await {
        Ok(session) => ServerWsMessage::Session { session },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Exit { session_id } => {
      let ok = session_exit(state, &session_id).await;
      if active_session.as_deref() == Some(session_id.as_str()) {
        *active_session = None;
      }
      ServerWsMessage::Exited { ok }
    }

    ClientWsMessage::Leaderboard { drill_id } => {
      let entries = leaderboard(state, &drill_id).await;
      tracing::info!(target: "session", drill = %drill_id, count = entries.len(), "WS leaderboard served");
      ServerWsMessage::Leaderboard { entries }
    }
  }
}
