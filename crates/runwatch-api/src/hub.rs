//! Room hub: one broadcast channel per room.

use std::collections::HashMap;

use runwatch_models::SyncMessage;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::metrics;

/// Messages buffered per room before slow subscribers start lagging.
const ROOM_CHANNEL_CAPACITY: usize = 64;

/// Fan-out of encoded sync messages to every socket of a room.
#[derive(Debug, Default)]
pub struct RoomHub {
    rooms: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a room, creating it on first use.
    pub async fn subscribe(&self, room_id: &str) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish to every subscriber of `room_id`. Returns how many received it.
    pub async fn publish(&self, room_id: &str, message: &SyncMessage) -> usize {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(room_id, error = %e, "Failed to encode sync message");
                return 0;
            }
        };

        let delivered = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id) {
                Some(tx) => tx.send(text).unwrap_or(0),
                None => return 0,
            }
        };

        metrics::record_room_broadcast(message.message_type().as_str(), delivered);
        if delivered == 0 {
            self.release(room_id).await;
        }
        debug!(room_id, delivered, "Room broadcast");
        delivered
    }

    /// Drop the room once its last subscriber has gone.
    pub async fn release(&self, room_id: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms
            .get(room_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            rooms.remove(room_id);
            debug!(room_id, "Room pruned");
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn subscriber_count(&self, room_id: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map_or(0, |tx| tx.receiver_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_room_only() {
        let hub = RoomHub::new();
        let mut a = hub.subscribe("WATCH-AAA111").await;
        let mut b = hub.subscribe("WATCH-BBB222").await;

        let delivered = hub
            .publish("WATCH-AAA111", &SyncMessage::emergency("stacks", "desk"))
            .await;
        assert_eq!(delivered, 1);

        let text = a.recv().await.unwrap();
        assert!(matches!(SyncMessage::decode(&text).unwrap(), SyncMessage::Emergency(_)));
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_room_is_noop() {
        let hub = RoomHub::new();
        assert_eq!(hub.publish("nowhere", &SyncMessage::emergency("stacks", "desk")).await, 0);
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_room_pruned() {
        let hub = RoomHub::new();
        let first = hub.subscribe("WATCH-AAA111").await;
        let second = hub.subscribe("WATCH-AAA111").await;
        assert_eq!(hub.subscriber_count("WATCH-AAA111").await, 2);

        drop(first);
        hub.release("WATCH-AAA111").await;
        assert_eq!(hub.room_count().await, 1);

        drop(second);
        hub.release("WATCH-AAA111").await;
        assert_eq!(hub.room_count().await, 0);
    }
}
