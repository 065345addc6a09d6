//! WebSocket handler streaming lifecycle events
//!
//! Read-only: the client receives a status snapshot on connect, then every
//! [`LifecycleEvent`] as it happens, each followed by a fresh snapshot.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use botrunner_core::{BotStatus, LifecycleEvent};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::AppState;

/// Server-to-client message
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventMessage {
    Status { status: BotStatus },
    Event { event: LifecycleEvent },
}

/// WebSocket upgrade handler
pub async fn events_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before the snapshot so nothing falls in between
    let mut events = state.bot.subscribe();

    debug!("Events client connected");

    if send(&mut sender, &snapshot(&state)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                let messages = match event {
                    Ok(event) => vec![EventMessage::Event { event }, snapshot(&state)],
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!("Events client lagged by {} events", count);
                        vec![snapshot(&state)]
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                for message in &messages {
                    if send(&mut sender, message).await.is_err() {
                        debug!("Events client went away");
                        return;
                    }
                }
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Read-only endpoint
                }
                Some(Err(e)) => {
                    debug!("Events socket error: {}", e);
                    break;
                }
            }
        }
    }

    debug!("Events client disconnected");
}

fn snapshot(state: &AppState) -> EventMessage {
    EventMessage::Status {
        status: state.bot.status(),
    }
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &EventMessage,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize event message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use botrunner_core::BotPhase;

    #[test]
    fn messages_are_tagged() {
        let event = EventMessage::Event {
            event: LifecycleEvent::Stopped { graceful: true },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["event"]["type"], "stopped");
        assert_eq!(json["event"]["graceful"], true);

        let status = EventMessage::Status {
            status: BotStatus {
                running: false,
                info: None,
                has_token: false,
                phase: BotPhase::Idle,
                last_error: None,
            },
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["status"]["phase"], "idle");
    }
}
