// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the shading-block graph.

use crate::block::BlockId;
use crate::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Half-side of the square pick region around a connection endpoint
pub const PICK_RADIUS: f32 = 10.0;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which end of a connection was picked or is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// The `from` end, bound to an output port
    Output,
    /// The `to` end, bound to an input port
    Input,
}

/// A directed edge from one output port to one input port.
///
/// Either endpoint may be temporarily unbound while the user drags it,
/// but never both at once: a connection dangling on both ends is removed
/// from the graph immediately. Endpoint positions are cached for
/// rendering and hit-testing; `Graph::set_block_position` refreshes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Source block and output port index, if bound
    pub from: Option<(BlockId, usize)>,
    /// Target block and input port index, if bound
    pub to: Option<(BlockId, usize)>,
    /// Cached position of the `from` end
    pub from_pos: Vec2,
    /// Cached position of the `to` end
    pub to_pos: Vec2,
}

impl Connection {
    /// Check if this connection touches a specific block
    pub fn involves_block(&self, block_id: BlockId) -> bool {
        self.from.map(|(b, _)| b) == Some(block_id) || self.to.map(|(b, _)| b) == Some(block_id)
    }

    /// Hit-test the connection's endpoints.
    ///
    /// The `from` end is tested before the `to` end; each uses a square
    /// pick region of half-side [`PICK_RADIUS`] around its cached
    /// position.
    pub fn pick_endpoint(&self, point: Vec2) -> Option<Endpoint> {
        if endpoint_pick_rect(self.from_pos).contains_point(point) {
            Some(Endpoint::Output)
        } else if endpoint_pick_rect(self.to_pos).contains_point(point) {
            Some(Endpoint::Input)
        } else {
            None
        }
    }
}

fn endpoint_pick_rect(pos: Vec2) -> Rect {
    Rect::new(
        pos.x - PICK_RADIUS,
        pos.y - PICK_RADIUS,
        PICK_RADIUS * 2.0,
        PICK_RADIUS * 2.0,
    )
}
