// SPDX-License-Identifier: MIT OR Apache-2.0
//! Block (node) definitions for the shading-block graph.

use crate::connection::ConnectionId;
use crate::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Horizontal length of the port stub drawn on either side of a block
pub const PORT_LENGTH: f32 = 10.0;
/// Half-height of a port's hit rectangle
pub const PORT_HIT_RADIUS: f32 = 10.0;
/// Side length of the block body square
pub const BLOCK_SIZE: f32 = 100.0;

/// Unique identifier for a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    /// Create a new random block ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

/// The closed set of block variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Signed-distance sphere primitive
    Sphere,
    /// Signed-distance box primitive
    Box,
    /// Boolean subtraction combinator (`opS`: first input carved out of
    /// the second)
    BoolDifference,
    /// The graph's designated output ("Screen")
    Screen,
}

impl BlockKind {
    /// Number of input ports for this kind
    pub fn input_count(self) -> usize {
        match self {
            Self::Sphere | Self::Box => 0,
            Self::BoolDifference => 2,
            Self::Screen => 1,
        }
    }

    /// Number of output ports for this kind
    pub fn output_count(self) -> usize {
        match self {
            Self::Sphere | Self::Box | Self::BoolDifference => 1,
            Self::Screen => 0,
        }
    }

    /// The GLSL function definition this kind contributes once per program
    pub fn definition(self) -> &'static str {
        match self {
            Self::Sphere => {
                "\nfloat sdsphere(vec3 p, float r) {\n\treturn length(p) - r;\n}\n"
            }
            Self::Box => {
                "\nfloat sdBox(vec3 p, vec3 b)\n{\n\tvec3 d = abs(p) - b;\n\treturn min(max(d.x,max(d.y,d.z)),0.0) + length(max(d,0.0));\n}\n"
            }
            Self::BoolDifference => {
                "\nfloat opS(float d1, float d2){\n\treturn max(-d1,d2);\n}\n"
            }
            Self::Screen => "",
        }
    }

    /// Single-glyph icon label drawn in the block body
    pub fn label(self) -> &'static str {
        match self {
            Self::Sphere => "\u{7403}",
            Self::Box => "\u{76d2}",
            Self::BoolDifference => "\u{5dee}",
            Self::Screen => "\u{663e}",
        }
    }
}

/// A block instance in the graph.
///
/// Each input/output slot holds the ID of the connection occupying that
/// port, or `None`. Slot lengths are fixed by the kind's arity; the
/// occupying connection's corresponding endpoint always points back at
/// this block and index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Unique instance ID
    pub id: BlockId,
    /// Block variant
    pub kind: BlockKind,
    /// Bounding rectangle: layout position and hit-test area
    pub rect: Rect,
    /// Connection occupying each input port
    pub input_slots: Vec<Option<ConnectionId>>,
    /// Connection occupying each output port
    pub output_slots: Vec<Option<ConnectionId>>,
}

impl Block {
    /// Create a new block of the given kind at the default origin
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            rect: Rect::new(0.0, 0.0, BLOCK_SIZE + 2.0 * PORT_LENGTH, BLOCK_SIZE),
            input_slots: vec![None; kind.input_count()],
            output_slots: vec![None; kind.output_count()],
        }
    }

    /// Move the block to a position, keeping the default size
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.rect.pos = Vec2::new(x, y);
        self
    }

    /// Position of input port `idx` on the left edge.
    ///
    /// Port `i` of `n` sits at fraction `(i+1)/(n+1)` of the block height.
    pub fn input_port_pos(&self, idx: usize) -> Vec2 {
        let n = self.input_slots.len() as f32;
        Vec2::new(
            self.rect.pos.x,
            self.rect.pos.y + self.rect.size.y * (idx as f32 + 1.0) / (n + 1.0),
        )
    }

    /// Position of output port `idx` on the right edge
    pub fn output_port_pos(&self, idx: usize) -> Vec2 {
        let n = self.output_slots.len() as f32;
        Vec2::new(
            self.rect.pos.x + self.rect.size.x,
            self.rect.pos.y + self.rect.size.y * (idx as f32 + 1.0) / (n + 1.0),
        )
    }

    /// Hit rectangle for input port `idx`
    pub fn input_port_rect(&self, idx: usize) -> Rect {
        let pos = self.input_port_pos(idx);
        Rect::new(
            pos.x,
            pos.y - PORT_HIT_RADIUS,
            PORT_LENGTH * 2.0,
            PORT_HIT_RADIUS * 2.0,
        )
    }

    /// Hit rectangle for output port `idx`
    pub fn output_port_rect(&self, idx: usize) -> Rect {
        let pos = self.output_port_pos(idx);
        Rect::new(
            pos.x - PORT_LENGTH * 2.0,
            pos.y - PORT_HIT_RADIUS,
            PORT_LENGTH * 2.0,
            PORT_HIT_RADIUS * 2.0,
        )
    }

    /// Check whether a point hits the block's bounding rectangle
    pub fn is_picked(&self, point: Vec2) -> bool {
        self.rect.contains_point(point)
    }

    /// Find an unoccupied input port under the point
    pub fn free_input_port_at(&self, point: Vec2) -> Option<usize> {
        (0..self.input_slots.len()).find(|&i| {
            self.input_slots[i].is_none() && self.input_port_rect(i).contains_point(point)
        })
    }

    /// Find an unoccupied output port under the point
    pub fn free_output_port_at(&self, point: Vec2) -> Option<usize> {
        (0..self.output_slots.len()).find(|&i| {
            self.output_slots[i].is_none() && self.output_port_rect(i).contains_point(point)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_matches_slot_lengths() {
        for kind in [
            BlockKind::Sphere,
            BlockKind::Box,
            BlockKind::BoolDifference,
            BlockKind::Screen,
        ] {
            let block = Block::new(kind);
            assert_eq!(block.input_slots.len(), kind.input_count());
            assert_eq!(block.output_slots.len(), kind.output_count());
        }
    }

    #[test]
    fn test_port_position_fractions() {
        let mut block = Block::new(BlockKind::BoolDifference);
        block.rect = Rect::new(0.0, 0.0, 120.0, 100.0);

        // Two input ports: 1/3 and 2/3 of the height on the left edge
        let p0 = block.input_port_pos(0);
        let p1 = block.input_port_pos(1);
        assert_eq!(p0.x, 0.0);
        assert!((p0.y - 100.0 / 3.0).abs() < 1e-4);
        assert!((p1.y - 200.0 / 3.0).abs() < 1e-4);

        // One output port: midpoint of the right edge
        let out = block.output_port_pos(0);
        assert_eq!(out.x, 120.0);
        assert!((out.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_port_hit_rects_centered_on_port() {
        let mut block = Block::new(BlockKind::Screen);
        block.rect = Rect::new(10.0, 20.0, 120.0, 100.0);

        let pos = block.input_port_pos(0);
        let rect = block.input_port_rect(0);
        assert!(rect.contains_point(pos));
        assert!(rect.contains_point(Vec2::new(pos.x + PORT_LENGTH, pos.y + PORT_HIT_RADIUS)));
        assert!(!rect.contains_point(Vec2::new(pos.x - 1.0, pos.y)));
    }

    #[test]
    fn test_free_port_lookup_skips_occupied() {
        let mut block = Block::new(BlockKind::BoolDifference);
        block.rect = Rect::new(0.0, 0.0, 120.0, 100.0);
        let p0 = block.input_port_pos(0);

        assert_eq!(block.free_input_port_at(p0), Some(0));
        block.input_slots[0] = Some(ConnectionId::new());
        assert_eq!(block.free_input_port_at(p0), None);
    }

    #[test]
    fn test_definitions_are_valid_for_all_kinds() {
        assert!(BlockKind::Sphere.definition().contains("sdsphere"));
        assert!(BlockKind::Box.definition().contains("sdBox"));
        assert!(BlockKind::BoolDifference.definition().contains("opS"));
        assert!(BlockKind::Screen.definition().is_empty());
    }
}
