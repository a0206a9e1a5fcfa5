//! Replays a recorded pose/audio session through the detection controller
//! against a live ingestion server.
//!
//! Usage: `runwatch-replay <recording.jsonl> [--room CODE] [--zone NAME] [--grid ROWSxCOLS]`
//!
//! Each line of the recording is `{"t_ms": u64, "landmarks": [...]?, "magnitudes": [...]?}`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use runwatch_client::{
    AudioSource, ClientConfig, Controller, ControllerEvent, FeedbackCue, Notice, SnapshotSource,
    StatusSink,
};
use runwatch_detect::GridConfig;
use runwatch_models::{LandmarkSet, RoomId, StateSnapshot};

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    t_ms: u64,
    #[serde(default)]
    landmarks: Option<LandmarkSet>,
    #[serde(default)]
    magnitudes: Option<Vec<u8>>,
}

#[derive(Debug)]
struct Args {
    recording: PathBuf,
    room: Option<RoomId>,
    zone: Option<String>,
    grid: Option<GridConfig>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut recording = None;
    let mut room = None;
    let mut zone = None;
    let mut grid = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--room" => {
                let code = args.next().ok_or_else(|| anyhow!("--room needs a code"))?;
                room = Some(RoomId::parse(&code)?);
            }
            "--zone" => zone = Some(args.next().ok_or_else(|| anyhow!("--zone needs a name"))?),
            "--grid" => {
                let dims = args.next().ok_or_else(|| anyhow!("--grid needs ROWSxCOLS"))?;
                let (rows, cols) = dims
                    .split_once('x')
                    .ok_or_else(|| anyhow!("--grid expects ROWSxCOLS, got {}", dims))?;
                grid = Some(GridConfig::enabled(rows.parse()?, cols.parse()?));
            }
            _ if recording.is_none() => recording = Some(PathBuf::from(arg)),
            other => return Err(anyhow!("unexpected argument: {}", other)),
        }
    }

    Ok(Args {
        recording: recording.ok_or_else(|| {
            anyhow!("usage: runwatch-replay <recording.jsonl> [--room CODE] [--zone NAME] [--grid ROWSxCOLS]")
        })?,
        room,
        zone,
        grid,
    })
}

/// Audio fed from the recording.
struct RecordedAudio(Arc<Mutex<Option<Vec<u8>>>>);

impl AudioSource for RecordedAudio {
    fn magnitudes(&mut self) -> Option<Vec<u8>> {
        self.0.lock().ok().and_then(|m| m.clone())
    }
}

/// Recordings carry no video.
struct NoVideo;

#[async_trait]
impl SnapshotSource for NoVideo {
    fn is_ready(&self) -> bool {
        false
    }

    async fn capture(&self) -> Option<String> {
        None
    }
}

struct LogSink;

impl StatusSink for LogSink {
    fn state(&mut self, state: &StateSnapshot) {
        info!(
            zone = %state.zone_name,
            status = state.status.as_str(),
            streak = state.streak,
            speed = state.movement_speed,
            noise = state.noise_level,
            "{}",
            state.message
        );
    }

    fn feedback(&mut self, cue: &FeedbackCue) {
        warn!(?cue, "Alert cue");
    }

    fn notice(&mut self, notice: Notice) {
        match notice {
            Notice::Refused(reason) => warn!(%reason, "Refused"),
            // Shown once, never logged
            Notice::AccessCode(code) => println!("Dashboard access code: {}", code),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("runwatch=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let args = parse_args()?;
    let config = ClientConfig::from_env()?;
    info!(server = %config.server_url, recording = %args.recording.display(), "Starting replay");

    let magnitudes = Arc::new(Mutex::new(None));
    let controller = Controller::new(
        &config,
        Box::new(RecordedAudio(magnitudes.clone())),
        Arc::new(NoVideo),
        Box::new(LogSink),
    )?;
    let handle = controller.handle();
    let task = tokio::spawn(controller.run());

    handle.send(ControllerEvent::RefreshLayout).await?;
    if let Some(room) = args.room.or(config.room.clone()) {
        handle.send(ControllerEvent::JoinRoom(room)).await?;
    }
    if let Some(zone) = args.zone {
        handle.send(ControllerEvent::UseZone(zone)).await?;
    }
    if let Some(grid) = args.grid {
        handle.send(ControllerEvent::SetGrid(grid)).await?;
    }
    handle.send(ControllerEvent::Start).await?;

    let file = tokio::fs::File::open(&args.recording)
        .await
        .with_context(|| format!("opening {}", args.recording.display()))?;
    let mut lines = BufReader::new(file).lines();
    let started = Instant::now();
    let mut frames = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let frame: RecordedFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(line = frames + 1, error = %e, "Skipping malformed frame");
                continue;
            }
        };

        tokio::time::sleep_until(started + Duration::from_millis(frame.t_ms)).await;
        if let Ok(mut current) = magnitudes.lock() {
            *current = frame.magnitudes;
        }
        handle.send(ControllerEvent::Frame(frame.landmarks)).await?;
        frames += 1;
    }

    // Let the last heartbeat go out
    tokio::time::sleep(config.detection.max_report_gap()).await;
    handle.send(ControllerEvent::Stop).await?;
    handle.send(ControllerEvent::Shutdown).await?;
    task.await?;

    info!(frames, "Replay finished");
    Ok(())
}
