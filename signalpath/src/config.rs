//! Editor configuration.
//!
//! All fields have defaults, so a config file only needs to name the values
//! it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SchematicError};

/// Tuning constants for the wire router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Distance a wire anchor sits outside the component edge.
    pub anchor_clearance: f64,
    /// Margin added around component boxes when checking for collisions.
    pub obstacle_margin: f64,
    /// Below this delta on both axes a wire is drawn as a straight segment.
    pub short_wire_threshold: f64,
    /// Bend coordinates snap to this grid; 0 disables snapping.
    pub grid_size: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            anchor_clearance: 10.0,
            obstacle_margin: 8.0,
            short_wire_threshold: 15.0,
            grid_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
        }
    }
}

impl ViewportConfig {
    /// The scale range must be positive, finite and ordered.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale.is_finite())
        {
            return Err(SchematicError::InvalidConfig(format!(
                "invalid scale range [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.zoom_in_factor > 1.0
            && self.zoom_in_factor.is_finite()
            && self.zoom_out_factor > 0.0
            && self.zoom_out_factor < 1.0)
        {
            return Err(SchematicError::InvalidConfig(
                "zoom_in_factor must be > 1 and zoom_out_factor in (0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_depth: usize,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    /// Pick radius for pins, in schematic units.
    pub pin_hit_radius: f64,
    pub viewport: ViewportConfig,
    pub router: RouterConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 50,
            snap_to_grid: true,
            grid_size: 10.0,
            pin_hit_radius: 6.0,
            viewport: ViewportConfig::default(),
            router: RouterConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(content)
            .map_err(|e| SchematicError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_depth == 0 {
            return Err(SchematicError::InvalidConfig(
                "history_depth must be at least 1".to_string(),
            ));
        }
        if !(self.grid_size > 0.0) {
            return Err(SchematicError::InvalidConfig(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        self.viewport.validate()?;
        let r = &self.router;
        if r.anchor_clearance < 0.0 || r.obstacle_margin < 0.0 || r.short_wire_threshold < 0.0 {
            return Err(SchematicError::InvalidConfig(
                "router distances must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
