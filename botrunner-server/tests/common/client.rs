//! WebSocket test client for the lifecycle events endpoint
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::SplitStream;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read side of a `/ws/events` connection
#[allow(dead_code)]
pub struct EventsClient {
    stream: SplitStream<WsStream>,
    // Kept so the socket is not closed from our side
    _sink: futures::stream::SplitSink<WsStream, Message>,
}

#[allow(dead_code)]
impl EventsClient {
    /// Connect and consume the initial status snapshot
    pub async fn connect(addr: SocketAddr) -> (Self, serde_json::Value) {
        let url = format!("ws://{}/ws/events", addr);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        let mut client = Self {
            stream,
            _sink: sink,
        };

        let first = client.recv().await;
        assert_eq!(first["type"], "status", "Expected status snapshot on connect");
        (client, first)
    }

    /// Receive the next JSON message
    pub async fn recv(&mut self) -> serde_json::Value {
        let next = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return text.to_string(),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => panic!("WebSocket error: {}", e),
                    None => panic!("WebSocket closed"),
                }
            }
        })
        .await
        .expect("Timed out waiting for an events message");
        serde_json::from_str(&next).expect("Failed to parse JSON")
    }

    /// Receive messages until a lifecycle event of `kind` arrives
    pub async fn recv_event(&mut self, kind: &str) -> serde_json::Value {
        loop {
            let message = self.recv().await;
            if message["type"] == "event" && message["event"]["type"] == kind {
                return message["event"].clone();
            }
        }
    }
}
