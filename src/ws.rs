pub mod audience;
pub mod group;
pub mod handlers;
pub mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;

use crate::protocol::{BridgeEvent, OutboundAction};
use crate::state::AppState;
use crate::transport::BridgeTransport;

/// State shared by the HTTP and WebSocket routes
#[derive(Clone)]
pub struct ServerState {
    pub app: Arc<AppState>,
    pub bridge: Arc<BridgeTransport>,
}

/// WebSocket upgrade handler for chat-platform bridges
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
) -> impl IntoResponse {
    tracing::info!("Bridge connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    action: &OutboundAction,
) -> Result<(), axum::Error> {
    match serde_json::to_string(action) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to serialize action: {}", e);
            Ok(())
        }
    }
}

/// Handle one bridge connection: forward outbound actions, dispatch inbound events
async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (mut sender, mut receiver) = socket.split();
    let mut outbound_rx = state.bridge.subscribe();

    tracing::info!("Bridge connected");

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Ok(action) => {
                        if send_json(&mut sender, &action).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Bridge lagged behind, {} action(s) dropped", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received event: {}", text);

                        match serde_json::from_str::<BridgeEvent>(&text) {
                            Ok(event) => {
                                if let Some(reply) =
                                    handlers::handle_event(event, &state.app, &state.bridge).await
                                {
                                    if send_json(&mut sender, &reply).await.is_err() {
                                        tracing::error!("Failed to send reply");
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse bridge event: {}", e);
                                let error = OutboundAction::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid event format: {}", e),
                                };
                                let _ = send_json(&mut sender, &error).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Bridge closed the connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("Bridge disconnected");
}
