//! # Viewport Transform
//!
//! Maps device (pointer) coordinates into content space, the template's
//! natural pixel grid:
//!
//! ```text
//! content = device / zoom − pan
//! ```
//!
//! Zoom is always clamped to the configured range. Panning never touches zoom.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Zoom limits and step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: 1.2,
        }
    }
}

impl ViewportConfig {
    /// Usable limits: positive finite bounds in order, and a step above 1.
    /// Anything else falls back to the default for that value.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let usable = |v: f32| v.is_finite() && v > 0.0;
        let a = if usable(self.min_zoom) { self.min_zoom } else { defaults.min_zoom };
        let b = if usable(self.max_zoom) { self.max_zoom } else { defaults.max_zoom };
        let zoom_step = if self.zoom_step.is_finite() && self.zoom_step > 1.0 {
            self.zoom_step
        } else {
            defaults.zoom_step
        };
        Self {
            min_zoom: a.min(b),
            max_zoom: a.max(b),
            zoom_step,
        }
    }
}

/// Largest zoom that shows the whole content inside the available area,
/// never above 1.0. Degenerate sizes give 1.0.
pub fn zoom_to_fit(
    content_width: f32,
    content_height: f32,
    available_width: f32,
    available_height: f32,
) -> f32 {
    if content_width <= 0.0 || content_height <= 0.0 {
        return 1.0;
    }
    if available_width <= 0.0 || available_height <= 0.0 {
        return 1.0;
    }
    (available_width / content_width)
        .min(available_height / content_height)
        .min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
    #[serde(skip)]
    config: ViewportConfig,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        let config = config.sanitized();
        Self {
            zoom: 1.0_f32.clamp(config.min_zoom, config.max_zoom),
            pan_x: 0.0,
            pan_y: 0.0,
            config,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn config(&self) -> ViewportConfig {
        self.config
    }

    fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Set zoom directly (clamped).
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = self.clamp(zoom);
    }

    pub fn to_content_space(&self, device: Point) -> Point {
        Point::new(
            device.x / self.zoom - self.pan_x,
            device.y / self.zoom - self.pan_y,
        )
    }

    pub fn zoom_in(&mut self) {
        self.zoom = self.clamp(self.zoom * self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.clamp(self.zoom / self.config.zoom_step);
    }

    /// 100%.
    pub fn actual_size(&mut self) {
        self.zoom = self.clamp(1.0);
    }

    pub fn fit(
        &mut self,
        content_width: f32,
        content_height: f32,
        available_width: f32,
        available_height: f32,
    ) {
        let fit = zoom_to_fit(
            content_width,
            content_height,
            available_width,
            available_height,
        );
        self.zoom = self.clamp(fit);
    }

    /// Fit a freshly loaded template and drop any previous pan.
    pub fn reset_for_template(
        &mut self,
        content_width: f32,
        content_height: f32,
        available_width: f32,
        available_height: f32,
    ) {
        self.fit(
            content_width,
            content_height,
            available_width,
            available_height,
        );
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Accumulate a device-pixel drag delta. The content point under the
    /// pointer stays under the pointer.
    pub fn pan_by(&mut self, device_dx: f32, device_dy: f32) {
        self.pan_x += device_dx / self.zoom;
        self.pan_y += device_dy / self.zoom;
    }
}
