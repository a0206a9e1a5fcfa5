//! Sync channel: join a room, send, dispatch inbound messages.

use std::sync::Arc;

use runwatch_models::{RoomId, SyncMessage, SyncMessageType};
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::reconnect::ReconnectPolicy;
use super::state::{ConnectionEvent, ConnectionState};
use super::transport::RoomTransport;
use crate::error::{ClientError, ClientResult};
use crate::metrics::{record_reconnect, record_sync_message};

/// Outbound messages buffered while a send is in flight.
const OUTBOUND_BUFFER_SIZE: usize = 32;

/// Receives every decoded inbound message.
pub type InboundHandler = Arc<dyn Fn(SyncMessage) + Send + Sync>;

/// An encoded message queued for the socket. `written` is answered once the
/// text has been handed to the connection; dropping it unanswered means the
/// message never left.
struct Outbound {
    text: String,
    written: Option<oneshot::Sender<()>>,
}

struct Membership {
    room: RoomId,
    outbound: mpsc::Sender<Outbound>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

/// Duplex channel bound to at most one room at a time.
pub struct SyncChannel {
    transport: Arc<dyn RoomTransport>,
    policy: Arc<dyn ReconnectPolicy>,
    handler: Arc<RwLock<Option<InboundHandler>>>,
    /// Reported while not bound to a room
    idle: watch::Sender<ConnectionState>,
    membership: Option<Membership>,
}

impl SyncChannel {
    pub fn new(transport: Arc<dyn RoomTransport>, policy: Arc<dyn ReconnectPolicy>) -> Self {
        let (idle, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            policy,
            handler: Arc::new(RwLock::new(None)),
            idle,
            membership: None,
        }
    }

    /// Install the inbound message handler, replacing any previous one.
    pub async fn on_message(&self, handler: InboundHandler) {
        *self.handler.write().await = Some(handler);
    }

    /// Bind to `room`. Any connection to a previous room is closed first.
    pub fn join(&mut self, room: RoomId) {
        self.leave();

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let task = tokio::spawn(run_connection(
            room.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.policy),
            Arc::clone(&self.handler),
            state_tx,
            outbound_rx,
        ));

        info!(room_id = %room, "Joined room");
        self.membership = Some(Membership {
            room,
            outbound: outbound_tx,
            state: state_rx,
            task,
        });
    }

    /// Drop the current room, if any.
    pub fn leave(&mut self) {
        if let Some(membership) = self.membership.take() {
            membership.task.abort();
            info!(room_id = %membership.room, "Left room");
        }
    }

    /// Send a message to the room.
    ///
    /// An `EMERGENCY` summon is refused with [`ClientError::ChannelNotOpen`]
    /// unless the connection is open, and resolves only once written to the
    /// socket; a summon caught by a dropping connection is refused, never
    /// replayed later. A `STATE` message while not open is dropped.
    pub async fn send(&self, message: &SyncMessage) -> ClientResult<()> {
        let message_type = message.message_type();
        let open = self.state().is_open();

        let Some(membership) = self.membership.as_ref().filter(|_| open) else {
            if message_type == SyncMessageType::Emergency {
                warn!("Emergency summon refused, room channel not open");
                return Err(ClientError::ChannelNotOpen);
            }
            debug!(message_type = message_type.as_str(), "Room channel not open, dropping message");
            return Ok(());
        };

        let text = message.encode()?;
        let (written, confirmed) = match message_type {
            SyncMessageType::Emergency => {
                let (tx, rx) = oneshot::channel();
                (Some(tx), Some(rx))
            }
            SyncMessageType::State => (None, None),
        };

        let refused = || match message_type {
            SyncMessageType::Emergency => ClientError::ChannelNotOpen,
            SyncMessageType::State => ClientError::transport("room channel closed"),
        };
        membership
            .outbound
            .send(Outbound { text, written })
            .await
            .map_err(|_| refused())?;

        if let Some(confirmed) = confirmed {
            if confirmed.await.is_err() {
                warn!("Emergency summon lost, room channel dropped");
                return Err(refused());
            }
        }

        record_sync_message(message_type.as_str(), "out");
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        match &self.membership {
            Some(m) => *m.state.borrow(),
            None => ConnectionState::Disconnected,
        }
    }

    /// Watch connection state changes of the current room.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        match &self.membership {
            Some(m) => m.state.clone(),
            None => self.idle.subscribe(),
        }
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.membership.as_ref().map(|m| &m.room)
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        if let Some(membership) = self.membership.take() {
            membership.task.abort();
        }
    }
}

fn transition(state_tx: &watch::Sender<ConnectionState>, event: ConnectionEvent) {
    state_tx.send_if_modified(|state| match state.on(event) {
        Some(next) if next != *state => {
            *state = next;
            true
        }
        _ => false,
    });
}

/// Connect, pump messages until the connection drops, wait, repeat.
async fn run_connection(
    room: RoomId,
    transport: Arc<dyn RoomTransport>,
    policy: Arc<dyn ReconnectPolicy>,
    handler: Arc<RwLock<Option<InboundHandler>>>,
    state_tx: watch::Sender<ConnectionState>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    let mut attempt: u32 = 0;

    loop {
        transition(&state_tx, ConnectionEvent::Connect);

        match transport.connect(&room).await {
            Ok(mut conn) => {
                attempt = 0;
                transition(&state_tx, ConnectionEvent::Opened);
                info!(room_id = %room, "Room channel open");

                loop {
                    tokio::select! {
                        // Notice a dead connection before writing to it
                        biased;
                        incoming = conn.recv() => match incoming {
                            Some(Ok(text)) => dispatch(&handler, &text).await,
                            Some(Err(e)) => {
                                warn!(room_id = %room, error = %e, "Room channel read failed");
                                break;
                            }
                            None => {
                                info!(room_id = %room, "Room channel closed by server");
                                break;
                            }
                        },
                        out = outbound.recv() => match out {
                            Some(Outbound { text, written }) => {
                                if let Err(e) = conn.send(text).await {
                                    warn!(room_id = %room, error = %e, "Room channel write failed");
                                    break;
                                }
                                if let Some(written) = written {
                                    let _ = written.send(());
                                }
                            }
                            None => {
                                conn.close().await;
                                transition(&state_tx, ConnectionEvent::Closed);
                                return;
                            }
                        },
                    }
                }
                conn.close().await;
            }
            Err(e) => {
                warn!(room_id = %room, error = %e, "Room channel connect failed");
            }
        }

        transition(&state_tx, ConnectionEvent::Closed);

        // Whatever was queued for the lost connection is refused, not replayed
        let mut dropped = 0usize;
        while outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(room_id = %room, dropped, "Discarded messages queued for closed room channel");
        }

        attempt = attempt.saturating_add(1);
        let Some(delay) = policy.next_delay(attempt) else {
            warn!(room_id = %room, attempt, "Giving up on room channel");
            return;
        };
        info!(room_id = %room, attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
        record_reconnect();
        tokio::time::sleep(delay).await;
    }
}

async fn dispatch(handler: &RwLock<Option<InboundHandler>>, text: &str) {
    let message = match SyncMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "Ignoring unrecognized room message");
            return;
        }
    };

    record_sync_message(message.message_type().as_str(), "in");
    if let Some(handler) = handler.read().await.as_ref() {
        handler(message);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use runwatch_models::{BehaviorStatus, StateSnapshot};
    use tokio::time::Instant;

    use super::*;
    use crate::sync::memory;
    use crate::sync::FixedDelay;

    fn channel() -> (SyncChannel, Arc<memory::MemoryTransport>, memory::Acceptor) {
        let (transport, acceptor) = memory::transport();
        let channel = SyncChannel::new(transport.clone(), Arc::new(FixedDelay::default()));
        (channel, transport, acceptor)
    }

    async fn wait_for(channel: &SyncChannel, want: ConnectionState) {
        let mut rx = channel.subscribe_state();
        rx.wait_for(|s| *s == want).await.unwrap();
    }

    fn room() -> RoomId {
        RoomId::parse("WATCH-ABC123").unwrap()
    }

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            status: BehaviorStatus::RunningDetected,
            message: "Running detected! Please walk for safety.".into(),
            streak: 0,
            alert_snapshot_url: None,
            zone_name: "stacks".into(),
            movement_speed: 12.0,
            noise_level: 50.0,
            room_id: "WATCH-ABC123".into(),
        }
    }

    #[tokio::test]
    async fn test_emergency_refused_when_not_joined() {
        let (channel, transport, _acceptor) = channel();
        let err = channel
            .send(&SyncMessage::emergency("stacks", "desk"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ChannelNotOpen));
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_emergency_refused_while_connecting() {
        let (mut channel, _transport, _acceptor) = channel();
        // No connection is ever accepted
        channel.join(room());
        wait_for(&channel, ConnectionState::Connecting).await;

        let err = channel
            .send(&SyncMessage::emergency("stacks", "desk"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ChannelNotOpen));
    }

    #[tokio::test]
    async fn test_emergency_sent_when_open() {
        let (mut channel, _transport, acceptor) = channel();
        let mut peer = acceptor.accept();
        channel.join(room());
        wait_for(&channel, ConnectionState::Open).await;

        channel
            .send(&SyncMessage::emergency("stacks", "desk"))
            .await
            .unwrap();

        let text = peer.from_client.recv().await.unwrap();
        let msg = SyncMessage::decode(&text).unwrap();
        assert_eq!(msg.message_type(), SyncMessageType::Emergency);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_on_dying_connection_refused() {
        let (mut channel, _transport, acceptor) = channel();
        let first = acceptor.accept();
        channel.join(room());
        wait_for(&channel, ConnectionState::Open).await;

        let mut second = acceptor.accept();
        drop(first);
        let err = channel
            .send(&SyncMessage::emergency("stacks", "desk"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ChannelNotOpen));

        wait_for(&channel, ConnectionState::Disconnected).await;
        wait_for(&channel, ConnectionState::Open).await;
        channel.send(&SyncMessage::state(snapshot())).await.unwrap();

        // The refused summon is not replayed on the new connection
        let text = second.from_client.recv().await.unwrap();
        assert_eq!(
            SyncMessage::decode(&text).unwrap().message_type(),
            SyncMessageType::State
        );
    }

    #[tokio::test]
    async fn test_inbound_dispatched_to_handler() {
        let (mut channel, _transport, acceptor) = channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel
            .on_message(Arc::new(move |msg: SyncMessage| {
                let _ = tx.send(msg);
            }))
            .await;

        let peer = acceptor.accept();
        channel.join(room());
        wait_for(&channel, ConnectionState::Open).await;

        peer.to_client.send("garbage".into()).unwrap();
        peer.to_client
            .send(SyncMessage::state(snapshot()).encode().unwrap())
            .unwrap();
        let bare = serde_json::to_string(&snapshot()).unwrap();
        peer.to_client.send(bare).unwrap();

        assert_eq!(rx.recv().await.unwrap(), SyncMessage::State(snapshot()));
        assert_eq!(rx.recv().await.unwrap(), SyncMessage::State(snapshot()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_fixed_delay() {
        let (mut channel, transport, acceptor) = channel();
        let first = acceptor.accept();
        channel.join(room());
        wait_for(&channel, ConnectionState::Open).await;
        assert_eq!(transport.attempts(), 1);

        let _second = acceptor.accept();
        let dropped_at = Instant::now();
        drop(first);
        wait_for(&channel, ConnectionState::Disconnected).await;
        wait_for(&channel, ConnectionState::Open).await;

        assert_eq!(transport.attempts(), 2);
        assert!(dropped_at.elapsed() >= Duration::from_secs(3));
        assert_eq!(channel.room(), Some(&room()));
    }

    #[tokio::test]
    async fn test_rejoin_replaces_room() {
        let (mut channel, _transport, acceptor) = channel();
        let _first = acceptor.accept();
        channel.join(room());
        wait_for(&channel, ConnectionState::Open).await;

        let other = RoomId::parse("WATCH-ZZZ999").unwrap();
        let _second = acceptor.accept();
        channel.join(other.clone());
        assert_eq!(channel.room(), Some(&other));
        wait_for(&channel, ConnectionState::Open).await;

        channel.leave();
        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert_eq!(channel.room(), None);
    }
}
