//! `GET /ws`: streams every live-data swap to the client as JSON

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::routes::AppState;
use crate::state::LiveEvent;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

type WsSender = SplitSink<WebSocket, Message>;

async fn send_event(sender: &mut WsSender, event: &LiveEvent) -> bool {
    let msg = serde_json::to_string(event).unwrap_or_else(|e| {
        warn!("Failed to serialize ws event: {}", e);
        "{}".to_string()
    });
    sender.send(Message::Text(msg)).await.is_ok()
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.live.subscribe();

    // Current state first so the client isn't empty until the next tick
    let initial = [
        LiveEvent::Latency(state.live.latency()),
        LiveEvent::Historical(state.live.historical()),
        LiveEvent::Adapter(state.live.adapter()),
    ];
    for event in &initial {
        if !send_event(&mut sender, event).await {
            return;
        }
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "WebSocket client lagging, dropped events");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(pong) = pong_for(&text) {
                        let _ = sender.send(Message::Text(pong)).await;
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// `{"type":"ping","data":{"timestamp":n}}` or plain `ping`
fn pong_for(text: &str) -> Option<String> {
    if text == "ping" {
        return Some("pong".to_string());
    }
    let msg = serde_json::from_str::<serde_json::Value>(text).ok()?;
    if msg.get("type").and_then(|t| t.as_str()) != Some("ping") {
        return None;
    }
    let timestamp = msg
        .pointer("/data/timestamp")
        .and_then(|t| t.as_i64())
        .unwrap_or(0);
    Some(json!({ "type": "pong", "data": { "timestamp": timestamp } }).to_string())
}
