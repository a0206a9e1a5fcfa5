//! Detection controller: a single dispatcher loop around the [`Session`].
//!
//! Frames, ticks, room messages and network completions all arrive as
//! [`ControllerEvent`]s and are handled one at a time, so the session needs
//! no locking. Network work is spawned; its result comes back as an event
//! tagged with the session generation it was issued under.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use runwatch_detect::{
    noise_level, DetectionRequest, FrameInput, FrameOutcome, GridConfig, Session,
};
use runwatch_models::{
    DetectionResult, LandmarkSet, RoomId, SnapshotUpload, StateSnapshot, SyncMessage, ZoneLayout,
};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::feedback::{emergency_cues, state_cues, FeedbackCue};
use crate::http::IngestClient;
use crate::metrics::{record_emission, record_emission_failure, record_stale_result};
use crate::sync::{FixedDelay, SyncChannel, WsTransport};

/// Controller event queue depth.
const EVENT_BUFFER_SIZE: usize = 256;

/// Frequency-domain audio magnitudes, read on demand.
pub trait AudioSource: Send {
    /// `None` when the microphone is unavailable.
    fn magnitudes(&mut self) -> Option<Vec<u8>>;
}

/// Still-frame capture for evidence snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The capture source has a current frame with non-zero dimensions.
    fn is_ready(&self) -> bool;

    /// Encode the current frame as a data URL.
    async fn capture(&self) -> Option<String>;
}

/// Something the user should be told.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// An action was refused
    Refused(String),
    /// A freshly issued dashboard access code, shown once
    AccessCode(String),
}

/// Receives everything the controller wants displayed.
pub trait StatusSink: Send {
    fn state(&mut self, state: &StateSnapshot);

    fn feedback(&mut self, cue: &FeedbackCue);

    fn notice(&mut self, notice: Notice);

    /// Per-frame overlay data.
    fn frame(&mut self, _outcome: &FrameOutcome) {}
}

/// Inputs to the dispatcher loop.
#[derive(Debug)]
pub enum ControllerEvent {
    Start,
    Stop,
    /// Pose-estimator output for the current video frame
    Frame(Option<LandmarkSet>),
    SetZone(String),
    AddZone(String),
    /// Select a zone, creating it if unknown
    UseZone(String),
    SetGrid(GridConfig),
    JoinRoom(RoomId),
    LeaveRoom,
    /// Summon help to the current zone
    SummonHelp { sender: String },
    RefreshLayout,
    ResetAccessCode,
    /// Inbound room message
    Sync(SyncMessage),
    /// Server answer to a reading
    Completed {
        generation: u64,
        grid_epoch: u64,
        cell: Option<u32>,
        result: DetectionResult,
    },
    LayoutLoaded(ZoneLayout),
    AccessCodeIssued(String),
    Shutdown,
}

/// Cloneable sender into a running controller.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerEvent>,
}

impl ControllerHandle {
    pub async fn send(&self, event: ControllerEvent) -> ClientResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| ClientError::transport("controller stopped"))
    }
}

/// Owns the session and every collaborator.
pub struct Controller {
    session: Session,
    client: IngestClient,
    channel: SyncChannel,
    audio: Box<dyn AudioSource>,
    snapshots: Arc<dyn SnapshotSource>,
    sink: Box<dyn StatusSink>,
    tick_interval: Duration,
    clock: Instant,
    events_tx: mpsc::Sender<ControllerEvent>,
    events_rx: mpsc::Receiver<ControllerEvent>,
}

impl Controller {
    pub fn new(
        config: &ClientConfig,
        audio: Box<dyn AudioSource>,
        snapshots: Arc<dyn SnapshotSource>,
        sink: Box<dyn StatusSink>,
    ) -> ClientResult<Self> {
        let channel = SyncChannel::new(
            Arc::new(WsTransport::new(config.server_url.clone())),
            Arc::new(FixedDelay(config.reconnect_delay)),
        );
        Self::with_channel(config, channel, audio, snapshots, sink)
    }

    /// Build with a caller-supplied room channel.
    pub fn with_channel(
        config: &ClientConfig,
        channel: SyncChannel,
        audio: Box<dyn AudioSource>,
        snapshots: Arc<dyn SnapshotSource>,
        sink: Box<dyn StatusSink>,
    ) -> ClientResult<Self> {
        let session = Session::new(config.detection.clone())?;
        let client = IngestClient::new(config)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);

        Ok(Self {
            session,
            client,
            channel,
            audio,
            snapshots,
            sink,
            tick_interval: config.detection.tick_interval,
            clock: Instant::now(),
            events_tx,
            events_rx,
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.events_tx.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until [`ControllerEvent::Shutdown`].
    pub async fn run(mut self) {
        let inbound = self.events_tx.clone();
        self.channel
            .on_message(Arc::new(move |msg: SyncMessage| {
                if inbound.try_send(ControllerEvent::Sync(msg)).is_err() {
                    warn!("Controller queue full, dropping room message");
                }
            }))
            .await;

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.events_rx.recv() => match event {
                    None | Some(ControllerEvent::Shutdown) => break,
                    Some(ControllerEvent::Start) => {
                        self.session.start();
                        ticker.reset();
                    }
                    Some(event) => self.handle_event(event).await,
                },
                _ = ticker.tick(), if self.session.is_live() => self.on_tick(),
            }
        }

        self.session.stop();
        self.channel.leave();
        info!("Controller stopped");
    }

    async fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Stop => self.session.stop(),
            ControllerEvent::Frame(landmarks) => self.on_frame(landmarks),
            ControllerEvent::SetZone(name) => {
                if let Err(e) = self.session.set_zone(&name) {
                    self.sink.notice(Notice::Refused(e.to_string()));
                }
            }
            ControllerEvent::AddZone(name) => {
                if let Err(e) = self.session.add_zone(&name) {
                    self.sink.notice(Notice::Refused(e.to_string()));
                }
            }
            ControllerEvent::UseZone(name) => {
                if let Err(e) = self.session.use_zone(&name) {
                    self.sink.notice(Notice::Refused(e.to_string()));
                }
            }
            ControllerEvent::SetGrid(grid) => {
                if let Err(e) = self.session.set_grid(grid) {
                    self.sink.notice(Notice::Refused(e.to_string()));
                }
            }
            ControllerEvent::JoinRoom(room) => self.channel.join(room),
            ControllerEvent::LeaveRoom => self.channel.leave(),
            ControllerEvent::SummonHelp { sender } => {
                let zone = self.session.zone().label();
                let summon = SyncMessage::emergency(zone, sender);
                if let Err(e) = self.channel.send(&summon).await {
                    self.sink.notice(Notice::Refused(e.to_string()));
                }
            }
            ControllerEvent::RefreshLayout => self.spawn_layout_fetch(),
            ControllerEvent::ResetAccessCode => self.spawn_access_reset(),
            ControllerEvent::Sync(message) => self.on_sync(message),
            ControllerEvent::Completed {
                generation,
                grid_epoch,
                cell,
                result,
            } => {
                let now = self.now();
                if self
                    .session
                    .apply_result(generation, grid_epoch, cell, result.clone(), now)
                {
                    self.sink.state(&result);
                } else {
                    record_stale_result();
                }
            }
            ControllerEvent::LayoutLoaded(layout) => {
                let added = self.session.merge_layout(&layout.zones);
                debug!(added, "Zone layout merged");
            }
            ControllerEvent::AccessCodeIssued(code) => {
                self.sink.notice(Notice::AccessCode(code));
            }
            // Handled by the loop
            ControllerEvent::Start | ControllerEvent::Shutdown => {}
        }
    }

    fn on_frame(&mut self, landmarks: Option<LandmarkSet>) {
        let noise = self.noise();
        let frame = FrameInput {
            at: self.now(),
            landmarks,
        };
        let outcome = self.session.on_frame(frame, noise);
        self.sink.frame(&outcome);

        if let Some(request) = outcome.request {
            self.dispatch(request);
        }
    }

    fn on_tick(&mut self) {
        let noise = self.noise();
        let now = self.now();
        if let Some(request) = self.session.on_tick(now, noise) {
            self.dispatch(request);
        }
    }

    fn on_sync(&mut self, message: SyncMessage) {
        match message {
            SyncMessage::State(state) => {
                self.session.apply_sync_state(state.clone());
                self.sink.state(&state);
                for cue in state_cues(&state) {
                    self.sink.feedback(&cue);
                }
            }
            SyncMessage::Emergency(summon) => {
                warn!(zone = %summon.zone, sender = %summon.sender, "Emergency summon received");
                for cue in emergency_cues(&summon) {
                    self.sink.feedback(&cue);
                }
            }
        }
    }

    /// Send a reading in the background. Failures are logged and dropped;
    /// the next heartbeat reports again.
    fn dispatch(&self, request: DetectionRequest) {
        record_emission(request.trigger.as_str());

        let client = self.client.clone();
        let snapshots = Arc::clone(&self.snapshots);
        let events = self.events_tx.clone();
        let room = self.channel.room().cloned();

        tokio::spawn(async move {
            let snapshot_url = if request.attach_snapshot {
                capture_snapshot(&client, snapshots.as_ref(), &request.zone).await
            } else {
                None
            };

            let reading = request.to_reading(snapshot_url, room.as_ref());
            match client.post_reading(&reading).await {
                Ok(result) => {
                    let _ = events
                        .send(ControllerEvent::Completed {
                            generation: request.generation,
                            grid_epoch: request.grid_epoch,
                            cell: request.cell,
                            result,
                        })
                        .await;
                }
                Err(e) => {
                    warn!(zone = %reading.zone_name, error = %e, "Failed to send reading");
                    record_emission_failure("post_reading");
                }
            }
        });
    }

    fn spawn_layout_fetch(&self) {
        let client = self.client.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            match client.fetch_zone_layout().await {
                Ok(layout) => {
                    let _ = events.send(ControllerEvent::LayoutLoaded(layout)).await;
                }
                Err(e) => warn!(error = %e, "Failed to fetch zone layout"),
            }
        });
    }

    fn spawn_access_reset(&self) {
        let client = self.client.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            match client.reset_access_code().await {
                Ok(response) => {
                    let _ = events
                        .send(ControllerEvent::AccessCodeIssued(response.code))
                        .await;
                }
                Err(e) => warn!(error = %e, "Failed to reset access code"),
            }
        });
    }

    fn noise(&mut self) -> f64 {
        noise_level(self.audio.magnitudes().as_deref())
    }

    fn now(&self) -> Duration {
        self.clock.elapsed()
    }
}

/// Capture and upload an evidence frame. Any failure means no snapshot.
async fn capture_snapshot(
    client: &IngestClient,
    source: &dyn SnapshotSource,
    zone: &str,
) -> Option<String> {
    if !source.is_ready() {
        debug!(zone, "Capture source not ready, skipping snapshot");
        return None;
    }

    let image = source.capture().await?;
    match client.upload_snapshot(&SnapshotUpload::new(zone, image)).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(zone, error = %e, "Snapshot upload failed");
            record_emission_failure("upload_snapshot");
            None
        }
    }
}
