//! Zone and grid-cell attribution.

use runwatch_models::{Point2, ZoneId};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

/// Grid cell id, `row * cols + col + 1`.
pub type CellId = u32;

/// Row/column subdivision of the frame into camera-like cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub enabled: bool,
    pub rows: u32,
    pub cols: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rows: 2,
            cols: 2,
        }
    }
}

impl GridConfig {
    pub fn enabled(rows: u32, cols: u32) -> Self {
        Self {
            enabled: true,
            rows,
            cols,
        }
    }

    pub fn validate(&self) -> DetectResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(DetectError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    pub fn cell_count(&self) -> u32 {
        self.rows * self.cols
    }

    /// Cell containing a normalized position. Positions on or past the
    /// frame edge fall into the nearest edge cell.
    pub fn cell_at(&self, position: Point2) -> CellId {
        let row = grid_index(position.y, self.rows);
        let col = grid_index(position.x, self.cols);
        row * self.cols + col + 1
    }
}

fn grid_index(v: f64, n: u32) -> u32 {
    let idx = (v * n as f64).floor();
    if idx.is_nan() || idx < 0.0 {
        0
    } else {
        (idx as u32).min(n.saturating_sub(1))
    }
}

/// Effective zone for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    /// Zone string reported to the server
    pub label: String,
    pub cell: Option<CellId>,
}

/// Maps centroid positions to the effective zone.
#[derive(Debug, Clone)]
pub struct ZoneMapper {
    zone: ZoneId,
    grid: GridConfig,
}

impl ZoneMapper {
    pub fn new(zone: ZoneId, grid: GridConfig) -> DetectResult<Self> {
        if grid.enabled {
            grid.validate()?;
        }
        Ok(Self { zone, grid })
    }

    pub fn resolve(&self, centroid: Point2) -> ResolvedZone {
        if !self.grid.enabled {
            return ResolvedZone {
                label: self.zone.to_string(),
                cell: None,
            };
        }

        let cell = self.grid.cell_at(centroid);
        ResolvedZone {
            label: format!("{} (Cam {})", self.zone, cell),
            cell: Some(cell),
        }
    }

    /// Replace the grid. Returns whether cell mapping changed, in which case
    /// any per-cell state keyed on the old grid is stale.
    pub fn set_grid(&mut self, grid: GridConfig) -> DetectResult<bool> {
        if grid.enabled {
            grid.validate()?;
        }
        let changed = grid != self.grid;
        self.grid = grid;
        Ok(changed)
    }

    /// Displacement multiplier for grid mode: one cell width is one unit.
    pub fn column_scale(&self) -> f64 {
        if self.grid.enabled {
            self.grid.cols as f64
        } else {
            1.0
        }
    }

    pub fn set_zone(&mut self, zone: ZoneId) {
        self.zone = zone;
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    pub fn grid(&self) -> GridConfig {
        self.grid
    }
}
