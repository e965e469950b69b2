// SPDX-License-Identifier: MIT OR Apache-2.0
//! Axis-aligned geometry primitives used for layout and hit-testing.

use serde::{Deserialize, Serialize};

/// A 2D point or extent in diagram space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Vec2 {
    /// Create a new vector
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle (position + size)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Origin corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    /// Create a new rectangle from corner coordinates and extents
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Check whether two rectangles overlap.
    ///
    /// Intervals are closed on both axes: rectangles that merely touch
    /// along an edge count as overlapping. Negative sizes are tolerated
    /// (the interval endpoints are sorted before comparison).
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_min_x, a_max_x) = minmax(self.pos.x, self.pos.x + self.size.x);
        let (a_min_y, a_max_y) = minmax(self.pos.y, self.pos.y + self.size.y);
        let (b_min_x, b_max_x) = minmax(other.pos.x, other.pos.x + other.size.x);
        let (b_min_y, b_max_y) = minmax(other.pos.y, other.pos.y + other.size.y);

        !(a_max_x < b_min_x)
            && !(b_max_x < a_min_x)
            && !(a_max_y < b_min_y)
            && !(b_max_y < a_min_y)
    }

    /// Check whether a point lies inside the rectangle (point treated as
    /// a zero-size rectangle; boundary counts as inside)
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.overlaps(&Rect::new(point.x, point.y, 0.0, 0.0))
    }
}

fn minmax(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
