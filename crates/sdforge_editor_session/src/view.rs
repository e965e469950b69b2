// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport transform between screen and diagram space.
//!
//! Screen y grows downward, diagram y grows upward; the mapping flips y
//! around the viewport's top-left corner.

use sdforge_editor_graph::Vec2;
use serde::{Deserialize, Serialize};

/// Scale change per scroll unit
pub const ZOOM_STEP: f32 = 0.04;
/// Lower clamp for the view scale factor
pub const ZOOM_MIN: f32 = 0.5;
/// Upper clamp for the view scale factor
pub const ZOOM_MAX: f32 = 3.0;

/// The diagram viewport: top-left corner in diagram space, a scale
/// factor, and the screen extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Diagram-space position mapped to the screen's top-left pixel
    pub top_left: Vec2,
    /// View scale factor (screen pixels per diagram unit)
    pub scale: f32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
}

impl Viewport {
    /// Create a viewport centered on the diagram origin at scale 1
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            top_left: Vec2::new(-width / 2.0, height / 2.0),
            scale: 1.0,
            width,
            height,
        }
    }

    /// Map a screen position to diagram space
    pub fn screen_to_graph(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            self.top_left.x + screen.x / self.scale,
            self.top_left.y - screen.y / self.scale,
        )
    }

    /// Map a diagram position to screen space
    pub fn graph_to_screen(&self, graph: Vec2) -> Vec2 {
        Vec2::new(
            (graph.x - self.top_left.x) * self.scale,
            (self.top_left.y - graph.y) * self.scale,
        )
    }

    /// Recompute the top-left corner so that `pivot` (diagram space)
    /// sits under `screen` again. Pure pan, no scale change.
    pub fn pan_to(&mut self, pivot: Vec2, screen: Vec2) {
        self.top_left = Vec2::new(
            pivot.x - screen.x / self.scale,
            pivot.y + screen.y / self.scale,
        );
    }

    /// Apply a bounded scale delta while holding the viewport center
    /// fixed.
    ///
    /// The top-left corner is corrected by the reciprocal-scale
    /// difference `1/old - 1/new` times half the viewport extent.
    pub fn zoom_by(&mut self, scroll_y: f32) {
        let mut reciprocal = 1.0 / self.scale;
        self.scale = (self.scale + ZOOM_STEP * scroll_y).clamp(ZOOM_MIN, ZOOM_MAX);
        reciprocal -= 1.0 / self.scale;

        self.top_left = Vec2::new(
            self.top_left.x + self.width / 2.0 * reciprocal,
            self.top_left.y - self.height / 2.0 * reciprocal,
        );
    }

    /// Resize the viewport, keeping the top-left corner anchored
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
