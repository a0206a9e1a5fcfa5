//! Detection session: all mutable pipeline state in one place.
//!
//! A [`Session`] is owned by a single dispatcher. Frame, tick and completion
//! handlers take `&mut self` and perform no I/O; they return what the caller
//! should send.

use std::time::Duration;

use runwatch_models::{
    BoundingBox, LandmarkSet, RoomId, SensorReading, StateSnapshot, ZoneId,
};
use tracing::{debug, info};

use crate::activity::ActivityTracker;
use crate::catalog::ZoneCatalog;
use crate::config::DetectionConfig;
use crate::error::{DetectError, DetectResult};
use crate::geometry::{FrameGeometry, GeometryNormalizer};
use crate::policy::{DetectionPolicy, EmitTrigger, Emission};
use crate::smoother::SpeedEstimator;
use crate::trail::PathHistory;
use crate::zones::{CellId, GridConfig, ResolvedZone, ZoneMapper};

/// One pose-estimator result.
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// Frame clock timestamp
    pub at: Duration,
    /// `None` when no subject was detected
    pub landmarks: Option<LandmarkSet>,
}

/// What a frame produced.
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    pub geometry: Option<FrameGeometry>,
    pub zone: Option<ResolvedZone>,
    /// Smoothed speed when a sample was pushed
    pub speed: Option<f64>,
    pub request: Option<DetectionRequest>,
}

/// A reading the caller should send, tagged with the session generation and
/// grid epoch it was produced under.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub generation: u64,
    /// Cell mapping in force when `cell` was resolved
    pub grid_epoch: u64,
    pub trigger: EmitTrigger,
    pub zone: String,
    pub cell: Option<CellId>,
    pub speed: f64,
    pub noise: f64,
    pub attach_snapshot: bool,
}

impl DetectionRequest {
    fn new(generation: u64, grid_epoch: u64, emission: Emission, zone: &ResolvedZone) -> Self {
        Self {
            generation,
            grid_epoch,
            trigger: emission.trigger,
            zone: zone.label.clone(),
            cell: zone.cell,
            speed: emission.speed,
            noise: emission.noise,
            attach_snapshot: emission.attach_snapshot,
        }
    }

    pub fn to_reading(&self, snapshot_url: Option<String>, room: Option<&RoomId>) -> SensorReading {
        SensorReading::new(self.zone.clone(), self.speed, self.noise)
            .with_snapshot(snapshot_url)
            .with_room(room.map(|r| r.to_string()))
    }
}

/// Detection state for one client.
#[derive(Debug)]
pub struct Session {
    config: DetectionConfig,
    normalizer: GeometryNormalizer,
    estimator: SpeedEstimator,
    trail: PathHistory,
    mapper: ZoneMapper,
    catalog: ZoneCatalog,
    policy: DetectionPolicy,
    activity: ActivityTracker,
    live: bool,
    generation: u64,
    grid_epoch: u64,
    last_geometry: Option<FrameGeometry>,
    last_zone: Option<ResolvedZone>,
    latest_state: Option<StateSnapshot>,
}

impl Session {
    pub fn new(config: DetectionConfig) -> DetectResult<Self> {
        config.validate()?;
        let zone = ZoneId::parse(&config.default_zone)?;

        Ok(Self {
            normalizer: GeometryNormalizer::new(),
            estimator: SpeedEstimator::new(config.speed_buffer_size, config.speed_gain),
            trail: PathHistory::new(config.path_history_size),
            mapper: ZoneMapper::new(zone.clone(), config.grid)?,
            catalog: ZoneCatalog::with_default(zone),
            policy: DetectionPolicy::new(&config),
            activity: ActivityTracker::new(config.activity_fade),
            live: false,
            generation: 0,
            grid_epoch: 0,
            last_geometry: None,
            last_zone: None,
            latest_state: None,
            config,
        })
    }

    /// Go live. Frame-derived state starts fresh. Returns the new generation.
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.live = true;
        self.estimator.reset();
        self.trail.clear();
        self.policy.reset();
        self.last_geometry = None;
        self.last_zone = None;
        info!(generation = self.generation, zone = %self.mapper.zone(), "Detection started");
        self.generation
    }

    /// Stop. Results of requests issued before this call are discarded.
    pub fn stop(&mut self) {
        if !self.live {
            return;
        }
        self.generation += 1;
        self.live = false;
        info!(generation = self.generation, "Detection stopped");
    }

    /// Process one pose-estimator result.
    pub fn on_frame(&mut self, frame: FrameInput, noise: f64) -> FrameOutcome {
        if !self.live {
            return FrameOutcome::default();
        }

        let Some(landmarks) = frame.landmarks else {
            self.last_geometry = None;
            return FrameOutcome::default();
        };

        let geometry = self.normalizer.normalize(&landmarks);
        let zone = self.mapper.resolve(geometry.centroid);
        let scale = geometry.perspective_factor * self.mapper.column_scale();
        let speed = self.estimator.observe(geometry.centroid, frame.at, scale);

        self.trail.push(geometry.centroid);
        self.last_geometry = Some(geometry);
        self.last_zone = Some(zone.clone());

        let request = speed
            .and_then(|s| self.policy.on_frame(s, noise, frame.at))
            .map(|emission| DetectionRequest::new(self.generation, self.grid_epoch, emission, &zone));

        if let Some(req) = &request {
            debug!(zone = %req.zone, speed = req.speed, "Frame speed over threshold");
        }

        FrameOutcome {
            geometry: Some(geometry),
            zone: Some(zone),
            speed,
            request,
        }
    }

    /// Process one detection tick.
    pub fn on_tick(&mut self, now: Duration, noise: f64) -> Option<DetectionRequest> {
        if !self.live {
            return None;
        }

        let speed = self.estimator.current();
        let emission = self.policy.on_tick(speed, noise, now)?;
        let zone = self.effective_zone();
        Some(DetectionRequest::new(self.generation, self.grid_epoch, emission, &zone))
    }

    /// Apply the server's answer to a request. Returns `false` and changes
    /// nothing when the request belongs to an earlier generation. A cell
    /// resolved under an older grid is not recorded.
    pub fn apply_result(
        &mut self,
        generation: u64,
        grid_epoch: u64,
        cell: Option<CellId>,
        result: StateSnapshot,
        now: Duration,
    ) -> bool {
        if !self.live || generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale result");
            return false;
        }

        match cell {
            Some(cell) if grid_epoch == self.grid_epoch => {
                self.activity.record(cell, result.status, now);
            }
            Some(cell) => {
                debug!(cell, grid_epoch, current = self.grid_epoch, "Dropping cell from previous grid");
            }
            None => {}
        }
        self.latest_state = Some(result);
        true
    }

    /// Reflect a state broadcast from the room.
    pub fn apply_sync_state(&mut self, state: StateSnapshot) {
        self.latest_state = Some(state);
    }

    /// Select a zone from the catalog.
    pub fn set_zone(&mut self, name: &str) -> DetectResult<()> {
        let id = ZoneId::parse(name)?;
        if !self.catalog.contains(&id) {
            return Err(DetectError::UnknownZone(id.to_string()));
        }
        self.select(id);
        Ok(())
    }

    /// Create a zone from user input and select it.
    pub fn add_zone(&mut self, name: &str) -> DetectResult<ZoneId> {
        let id = self.catalog.add(name)?;
        self.select(id.clone());
        Ok(id)
    }

    /// Select `name`, creating it first when the catalog lacks it.
    pub fn use_zone(&mut self, name: &str) -> DetectResult<ZoneId> {
        match self.add_zone(name) {
            Err(DetectError::DuplicateZone(_)) => {
                let id = ZoneId::parse(name)?;
                self.select(id.clone());
                Ok(id)
            }
            other => other,
        }
    }

    /// Merge externally defined zones into the catalog.
    pub fn merge_layout<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.catalog.merge(names)
    }

    /// Change the grid. Activity records are cleared whenever the cell
    /// mapping changes.
    pub fn set_grid(&mut self, grid: GridConfig) -> DetectResult<()> {
        if self.mapper.set_grid(grid)? {
            self.grid_epoch += 1;
            self.activity.reset();
            self.last_zone = None;
            info!(enabled = grid.enabled, rows = grid.rows, cols = grid.cols, "Grid changed");
        }
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid_epoch(&self) -> u64 {
        self.grid_epoch
    }

    pub fn current_speed(&self) -> f64 {
        self.estimator.current()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.last_geometry.map(|g| g.bounding_box)
    }

    pub fn last_geometry(&self) -> Option<&FrameGeometry> {
        self.last_geometry.as_ref()
    }

    pub fn trail(&self) -> &PathHistory {
        &self.trail
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    pub fn zone(&self) -> &ZoneId {
        self.mapper.zone()
    }

    pub fn grid(&self) -> GridConfig {
        self.mapper.grid()
    }

    pub fn latest_state(&self) -> Option<&StateSnapshot> {
        self.latest_state.as_ref()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Zone for tick reports: where the subject was last seen, or the
    /// selected zone before any frame.
    fn effective_zone(&self) -> ResolvedZone {
        self.last_zone.clone().unwrap_or_else(|| ResolvedZone {
            label: self.mapper.zone().to_string(),
            cell: None,
        })
    }

    fn select(&mut self, id: ZoneId) {
        info!(zone = %id, "Zone selected");
        self.mapper.set_zone(id);
        self.last_zone = None;
    }
}
