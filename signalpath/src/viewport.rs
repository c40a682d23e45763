//! Pan/zoom transform between screen pixels and schematic space.
//!
//! `screen = schematic * scale + offset`

use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;
use crate::error::Result;
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pan offset in screen pixels
    pub offset: Point,
    scale: f64,
    #[serde(skip)]
    config: ViewportConfig,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_valid(ViewportConfig::default())
    }
}

impl Viewport {
    /// Rejects a scale range that is empty, non-positive or NaN.
    pub fn new(config: ViewportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Caller guarantees `config` passed `ViewportConfig::validate`.
    pub(crate) fn from_valid(config: ViewportConfig) -> Self {
        Self {
            offset: Point::default(),
            scale: 1.0_f64.clamp(config.min_scale, config.max_scale),
            config,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn screen_to_schematic(&self, point: Point) -> Point {
        (point - self.offset).scale(1.0 / self.scale)
    }

    pub fn schematic_to_screen(&self, point: Point) -> Point {
        point.scale(self.scale) + self.offset
    }

    /// Set the scale directly, clamped to the configured range.
    /// Returns whether the scale changed.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() {
            return false;
        }
        let clamped = scale.clamp(self.config.min_scale, self.config.max_scale);
        let changed = clamped != self.scale;
        self.scale = clamped;
        changed
    }

    /// Zoom around a screen point so the schematic point under it stays put.
    ///
    /// Negative wheel deltas zoom in, positive zoom out, zero does nothing.
    /// Returns whether the scale changed.
    pub fn zoom_at(&mut self, screen_point: Point, wheel_delta: f64) -> bool {
        let factor = if wheel_delta < 0.0 {
            self.config.zoom_in_factor
        } else if wheel_delta > 0.0 {
            self.config.zoom_out_factor
        } else {
            return false;
        };

        let anchor = self.screen_to_schematic(screen_point);
        let old_scale = self.scale;
        if !self.set_scale(old_scale * factor) {
            return false;
        }
        self.offset = screen_point - anchor.scale(self.scale);
        true
    }

    pub fn pan(&mut self, delta: Point) {
        self.offset = self.offset + delta;
    }

    /// Schematic-space area visible in a canvas of the given pixel size
    pub fn visible_area(&self, width: f64, height: f64) -> Rect {
        let top_left = self.screen_to_schematic(Point::default());
        Rect::new(top_left.x, top_left.y, width / self.scale, height / self.scale)
    }

    /// e.g. "150%"
    pub fn zoom_percentage(&self) -> String {
        format!("{}%", (self.scale * 100.0).round())
    }

    pub fn reset(&mut self) {
        self.offset = Point::default();
        self.scale = 1.0_f64.clamp(self.config.min_scale, self.config.max_scale);
    }
}
