//! Room sync sockets (`GET /ws/{room_id}`).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use runwatch_models::{RoomId, SyncMessage};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::hub::RoomHub;
use crate::metrics;
use crate::state::AppState;

/// Global counter for active room sockets.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// A socket's claim on a room: its hub subscription and its share of the
/// active-connections gauge. Dropping it gives both back, including when the
/// handshake never completes.
struct RoomMembership {
    hub: Arc<RoomHub>,
    room: RoomId,
    receiver: Option<broadcast::Receiver<String>>,
}

impl RoomMembership {
    async fn join(hub: Arc<RoomHub>, room: RoomId) -> Self {
        let receiver = hub.subscribe(room.as_str()).await;
        let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_ws_active_connections(count);
        metrics::record_ws_connection();
        Self {
            hub,
            room,
            receiver: Some(receiver),
        }
    }
}

impl Drop for RoomMembership {
    fn drop(&mut self) {
        let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_ws_active_connections(count);

        // The receiver must be gone before the room can be pruned
        self.receiver.take();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let hub = Arc::clone(&self.hub);
            let room = self.room.clone();
            runtime.spawn(async move { hub.release(room.as_str()).await });
        }
    }
}

/// Upgrade to a room socket.
///
/// The subscription is taken before the upgrade completes so nothing
/// published after the handshake is missed.
pub async fn ws_room(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let room = RoomId::parse(&room_id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let membership = RoomMembership::join(Arc::clone(&state.hub), room).await;

    Ok(ws.on_upgrade(move |socket| handle_room_socket(socket, membership, state)))
}

async fn handle_room_socket(socket: WebSocket, mut membership: RoomMembership, state: AppState) {
    let room = membership.room.clone();
    let Some(mut subscription) = membership.receiver.take() else {
        return;
    };
    info!(room_id = %room, "Room socket connected");
    let (mut sender, mut receiver) = socket.split();

    let forward_room = room.clone();
    let mut forward = tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(room_id = %forward_room, skipped, "Room socket lagging, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut forward_done = false;
    loop {
        tokio::select! {
            _ = &mut forward => {
                forward_done = true;
                break;
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match SyncMessage::decode(&text) {
                    Ok(message) => {
                        let message_type = message.message_type();
                        metrics::record_ws_message_received(message_type.as_str());
                        if let SyncMessage::Emergency(summon) = &message {
                            warn!(room_id = %room, zone = %summon.zone, sender = %summon.sender, "Emergency summon");
                        }
                        state.hub.publish(room.as_str(), &message).await;
                    }
                    Err(e) => debug!(room_id = %room, error = %e, "Ignoring unrecognized room message"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(room_id = %room, error = %e, "Room socket read failed");
                    break;
                }
            },
        }
    }

    if !forward_done {
        forward.abort();
        // Let the aborted task drop its receiver before pruning
        let _ = forward.await;
    }
    drop(membership);
    info!(room_id = %room, "Room socket disconnected");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_unused_membership_releases_room() {
        let hub = Arc::new(RoomHub::new());
        let room = RoomId::parse("WATCH-AAA111").unwrap();

        let membership = RoomMembership::join(Arc::clone(&hub), room.clone()).await;
        assert_eq!(hub.subscriber_count(room.as_str()).await, 1);
        drop(membership);

        tokio::time::timeout(Duration::from_secs(5), async {
            while hub.room_count().await > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
