use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use vortex_shared::{ClientMsg, ConnectionId, ErrorMsg, ServerMsg};

use crate::assets::Assets;
use crate::broadcast::Gateway;
use crate::game_loop::GameCommand;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub gateway: Gateway,
    pub assets: Assets,
    pub connection_semaphore: Arc<Semaphore>,
    pub max_message_bytes: usize,
    pub max_parse_errors: u32,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    let permit = match app_state.connection_semaphore.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!("Connection refused: server full");
            return (StatusCode::SERVICE_UNAVAILABLE, "server full").into_response();
        }
    };
    ws.max_message_size(app_state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, app_state, permit))
}

async fn handle_socket(socket: WebSocket, app_state: AppState, _permit: OwnedSemaphorePermit) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe first so nothing between the welcome snapshot and the first
    // delta is lost.
    let mut broadcast_rx = app_state.gateway.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::Join { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!("Player {} connected", my_id);

    if !send_msg(&mut sink, &ServerMsg::Welcome(welcome)).await {
        leave(&app_state, my_id).await;
        return;
    }

    let mut parse_errors: u32 = 0;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > app_state.max_message_bytes {
                            tracing::warn!(
                                "Player {} sent {} bytes (max {}), closing",
                                my_id,
                                text.len(),
                                app_state.max_message_bytes
                            );
                            break;
                        }
                        match serde_json::from_str::<ClientMsg>(text.as_str()) {
                            Ok(ClientMsg::AddCircle(request)) => {
                                let _ = app_state
                                    .game_tx
                                    .send(GameCommand::Launch { conn: my_id, request })
                                    .await;
                            }
                            Err(e) => {
                                parse_errors += 1;
                                tracing::debug!("Player {} sent undecodable message: {}", my_id, e);
                                let reply = ServerMsg::Error(ErrorMsg {
                                    message: format!("malformed message: {}", e),
                                });
                                if !send_msg(&mut sink, &reply).await {
                                    break;
                                }
                                if parse_errors >= app_state.max_parse_errors {
                                    tracing::warn!(
                                        "Player {} exceeded {} parse errors, closing",
                                        my_id,
                                        app_state.max_parse_errors
                                    );
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(outbound) => {
                        if !outbound.audience.includes(my_id) {
                            continue;
                        }
                        if sink.send(Message::Text(outbound.payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Player {} lagged by {} messages", my_id, n);
                        // Continue - every list message is full state, dropping is fine
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = sink.close().await;
    leave(&app_state, my_id).await;
}

async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode message: {}", e);
            false
        }
    }
}

async fn leave(app_state: &AppState, my_id: ConnectionId) {
    let _ = app_state
        .game_tx
        .send(GameCommand::Leave { conn: my_id })
        .await;
    tracing::info!("Player {} disconnected", my_id);
}
