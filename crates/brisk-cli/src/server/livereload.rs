// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! WebSocket handler for live reload functionality.

use axum::extract::ws::{Message, WebSocket};
use brisk::RecompileScheduler;
use std::sync::Arc;

/// Bridges one WebSocket to a broadcaster session until either side closes.
///
/// The session is registered on entry and removed on exit. If the
/// broadcaster drops the session first (client not keeping up), the channel
/// closes and the socket is closed with it.
pub async fn handle_websocket(mut socket: WebSocket, scheduler: Arc<RecompileScheduler>) {
    let (id, mut rx) = scheduler.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    // Dropped by the broadcaster
                    break;
                };
                let payload = match event.to_json() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!("Failed to encode reload event: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Clients only listen
                    }
                    Some(Err(_)) => break,
                }
            }
        }
    }

    scheduler.broadcaster().remove(id);
}
