// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph aggregate: block/connection arenas plus the render/pick order.

use crate::block::{Block, BlockId, BlockKind};
use crate::connection::{Connection, ConnectionId, Endpoint};
use crate::geometry::{Rect, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A drawable element in the render/pick order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderElement {
    /// A block, by handle
    Block(BlockId),
    /// A connection, by handle
    Connection(ConnectionId),
}

/// Result of hit-testing the render order at a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A block body was hit
    Block(BlockId),
    /// A connection endpoint was hit
    ConnectionEndpoint(ConnectionId, Endpoint),
}

/// Error when connecting or rebinding an endpoint
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Block not found
    #[error("Block not found: {0:?}")]
    BlockNotFound(BlockId),

    /// Connection not found
    #[error("Connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),

    /// Port index out of range for the block's arity
    #[error("Port {port} out of range for block {block:?}")]
    PortOutOfRange {
        /// Block whose port was addressed
        block: BlockId,
        /// Offending port index
        port: usize,
    },

    /// A connection needs at least one bound endpoint
    #[error("Connection must have at least one bound endpoint")]
    BothEndsDangling,
}

/// The shading-block graph.
///
/// Owns every block and connection, and maintains the render/pick order:
/// an ordered view over all live elements where the front is drawn first
/// (backmost) and the back is drawn last (topmost, picked first). The
/// order always covers each live element exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    blocks: IndexMap<BlockId, Block>,
    connections: IndexMap<ConnectionId, Connection>,
    render_order: Vec<RenderElement>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            blocks: IndexMap::new(),
            connections: IndexMap::new(),
            render_order: Vec::new(),
        }
    }

    /// Build the default demo graph: a box and a sphere feeding a
    /// boolean difference, feeding the screen.
    pub fn demo() -> Self {
        let mut graph = Self::new();
        let box_id = graph.add_block(Block::new(BlockKind::Box).with_position(40.0, 120.0));
        let sphere_id = graph.add_block(Block::new(BlockKind::Sphere).with_position(40.0, 320.0));
        let diff_id =
            graph.add_block(Block::new(BlockKind::BoolDifference).with_position(280.0, 220.0));
        let screen_id = graph.add_block(Block::new(BlockKind::Screen).with_position(520.0, 220.0));

        graph
            .add_connection(Some((box_id, 0)), Some((diff_id, 0)))
            .expect("demo graph wiring");
        graph
            .add_connection(Some((sphere_id, 0)), Some((diff_id, 1)))
            .expect("demo graph wiring");
        graph
            .add_connection(Some((diff_id, 0)), Some((screen_id, 0)))
            .expect("demo graph wiring");
        graph
    }

    /// Add a block to the graph and the top of the render order
    pub fn add_block(&mut self, block: Block) -> BlockId {
        let id = block.id;
        self.blocks.insert(id, block);
        self.render_order.push(RenderElement::Block(id));
        self.debug_validate();
        id
    }

    /// Remove a block, detaching and removing every connection that
    /// touches any of its ports first
    pub fn remove_block(&mut self, block_id: BlockId) -> Option<Block> {
        self.blocks.get(&block_id)?;

        let touching: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.involves_block(block_id))
            .map(|c| c.id)
            .collect();
        for conn_id in touching {
            self.remove_connection(conn_id);
        }

        self.render_order
            .retain(|e| *e != RenderElement::Block(block_id));
        let block = self.blocks.shift_remove(&block_id);
        self.debug_validate();
        block
    }

    /// Get a block by ID
    pub fn block(&self, block_id: BlockId) -> Option<&Block> {
        self.blocks.get(&block_id)
    }

    /// Get all blocks in insertion order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Get the number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Get a connection by ID
    pub fn connection(&self, conn_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&conn_id)
    }

    /// Get all connections in insertion order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The render/pick order (front = backmost, back = topmost)
    pub fn render_order(&self) -> &[RenderElement] {
        &self.render_order
    }

    /// Create a connection with the given endpoints and append it to the
    /// top of the render order.
    ///
    /// Either endpoint may be `None` (a half-open connection being
    /// dragged), but not both. Binding an endpoint evicts any other
    /// connection already occupying that port.
    pub fn add_connection(
        &mut self,
        from: Option<(BlockId, usize)>,
        to: Option<(BlockId, usize)>,
    ) -> Result<ConnectionId, ConnectError> {
        if from.is_none() && to.is_none() {
            return Err(ConnectError::BothEndsDangling);
        }
        self.validate_endpoint(from, Endpoint::Output)?;
        self.validate_endpoint(to, Endpoint::Input)?;

        let conn = Connection {
            id: ConnectionId::new(),
            from: None,
            to: None,
            from_pos: Vec2::default(),
            to_pos: Vec2::default(),
        };
        let id = conn.id;
        self.connections.insert(id, conn);
        self.render_order.push(RenderElement::Connection(id));

        self.bind_endpoint(id, Endpoint::Output, from);
        self.bind_endpoint(id, Endpoint::Input, to);
        self.debug_validate();
        Ok(id)
    }

    /// Remove a connection, unbinding both ends first
    pub fn remove_connection(&mut self, conn_id: ConnectionId) -> Option<Connection> {
        self.connections.get(&conn_id)?;
        self.unbind_endpoint(conn_id, Endpoint::Output);
        self.unbind_endpoint(conn_id, Endpoint::Input);
        self.render_order
            .retain(|e| *e != RenderElement::Connection(conn_id));
        let conn = self.connections.shift_remove(&conn_id);
        self.debug_validate();
        conn
    }

    /// Rebind a connection's `from` end to an output port (or unbind it)
    pub fn set_from(
        &mut self,
        conn_id: ConnectionId,
        target: Option<(BlockId, usize)>,
    ) -> Result<(), ConnectError> {
        self.rebind(conn_id, Endpoint::Output, target)
    }

    /// Rebind a connection's `to` end to an input port (or unbind it)
    pub fn set_to(
        &mut self,
        conn_id: ConnectionId,
        target: Option<(BlockId, usize)>,
    ) -> Result<(), ConnectError> {
        self.rebind(conn_id, Endpoint::Input, target)
    }

    /// Update the cached position of a dangling endpoint so it follows
    /// the pointer
    pub fn set_endpoint_pos(&mut self, conn_id: ConnectionId, endpoint: Endpoint, pos: Vec2) {
        if let Some(conn) = self.connections.get_mut(&conn_id) {
            match endpoint {
                Endpoint::Output => conn.from_pos = pos,
                Endpoint::Input => conn.to_pos = pos,
            }
        }
    }

    /// Move a block and push the fresh port positions into every
    /// connection occupying its ports.
    ///
    /// This is an explicit synchronization step: cached endpoint
    /// positions do not track the block on their own.
    pub fn set_block_position(&mut self, block_id: BlockId, rect: Rect) {
        let Some(block) = self.blocks.get_mut(&block_id) else {
            return;
        };
        block.rect = rect;

        let updates: Vec<(ConnectionId, Endpoint, Vec2)> = {
            let block = &self.blocks[&block_id];
            let inputs = block.input_slots.iter().enumerate().filter_map(|(i, s)| {
                s.map(|c| (c, Endpoint::Input, block.input_port_pos(i)))
            });
            let outputs = block.output_slots.iter().enumerate().filter_map(|(i, s)| {
                s.map(|c| (c, Endpoint::Output, block.output_port_pos(i)))
            });
            inputs.chain(outputs).collect()
        };
        for (conn_id, endpoint, pos) in updates {
            self.set_endpoint_pos(conn_id, endpoint, pos);
        }
        self.debug_validate();
    }

    /// Promote a block and every connection touching its ports to the
    /// top of the render order, so the dragged subgraph draws and picks
    /// above everything else
    pub fn raise_block_to_top(&mut self, block_id: BlockId) {
        let Some(block) = self.blocks.get(&block_id) else {
            return;
        };
        let touching: Vec<ConnectionId> = block
            .input_slots
            .iter()
            .chain(block.output_slots.iter())
            .copied()
            .flatten()
            .collect();

        self.raise_element(RenderElement::Block(block_id));
        for conn_id in touching {
            self.raise_element(RenderElement::Connection(conn_id));
        }
    }

    /// Promote a single connection to the top of the render order
    pub fn raise_connection_to_top(&mut self, conn_id: ConnectionId) {
        self.raise_element(RenderElement::Connection(conn_id));
    }

    /// Hit-test the render order at a point, topmost element first.
    ///
    /// The first matching element short-circuits the scan; a miss is not
    /// an error.
    pub fn hit_test(&self, point: Vec2) -> Option<Hit> {
        for element in self.render_order.iter().rev() {
            match element {
                RenderElement::Block(id) => {
                    if self.blocks[id].is_picked(point) {
                        return Some(Hit::Block(*id));
                    }
                }
                RenderElement::Connection(id) => {
                    if let Some(endpoint) = self.connections[id].pick_endpoint(point) {
                        return Some(Hit::ConnectionEndpoint(*id, endpoint));
                    }
                }
            }
        }
        None
    }

    /// Panic (in tests and debug builds) if any structural invariant is
    /// broken: slot/endpoint back-references must agree, no connection
    /// may dangle on both ends, and the render order must cover every
    /// live element exactly once.
    pub fn assert_consistent(&self) {
        for conn in self.connections.values() {
            assert!(
                conn.from.is_some() || conn.to.is_some(),
                "connection {:?} dangling on both ends",
                conn.id
            );
            if let Some((block_id, idx)) = conn.from {
                let block = self.blocks.get(&block_id).expect("from block missing");
                assert_eq!(
                    block.output_slots.get(idx).copied().flatten(),
                    Some(conn.id),
                    "output slot back-reference mismatch"
                );
            }
            if let Some((block_id, idx)) = conn.to {
                let block = self.blocks.get(&block_id).expect("to block missing");
                assert_eq!(
                    block.input_slots.get(idx).copied().flatten(),
                    Some(conn.id),
                    "input slot back-reference mismatch"
                );
            }
        }
        for block in self.blocks.values() {
            for slot in block.input_slots.iter().chain(block.output_slots.iter()) {
                if let Some(conn_id) = slot {
                    assert!(
                        self.connections.contains_key(conn_id),
                        "slot references dead connection {conn_id:?}"
                    );
                }
            }
        }

        assert_eq!(
            self.render_order.len(),
            self.blocks.len() + self.connections.len(),
            "render order element count mismatch"
        );
        for element in &self.render_order {
            let live = match element {
                RenderElement::Block(id) => self.blocks.contains_key(id),
                RenderElement::Connection(id) => self.connections.contains_key(id),
            };
            assert!(live, "render order references dead element {element:?}");
        }
    }

    fn debug_validate(&self) {
        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    fn raise_element(&mut self, element: RenderElement) {
        if let Some(idx) = self.render_order.iter().position(|e| *e == element) {
            self.render_order.remove(idx);
            self.render_order.push(element);
        }
    }

    fn validate_endpoint(
        &self,
        target: Option<(BlockId, usize)>,
        endpoint: Endpoint,
    ) -> Result<(), ConnectError> {
        let Some((block_id, idx)) = target else {
            return Ok(());
        };
        let block = self
            .blocks
            .get(&block_id)
            .ok_or(ConnectError::BlockNotFound(block_id))?;
        let arity = match endpoint {
            Endpoint::Output => block.output_slots.len(),
            Endpoint::Input => block.input_slots.len(),
        };
        if idx >= arity {
            return Err(ConnectError::PortOutOfRange {
                block: block_id,
                port: idx,
            });
        }
        Ok(())
    }

    fn rebind(
        &mut self,
        conn_id: ConnectionId,
        endpoint: Endpoint,
        target: Option<(BlockId, usize)>,
    ) -> Result<(), ConnectError> {
        if !self.connections.contains_key(&conn_id) {
            return Err(ConnectError::ConnectionNotFound(conn_id));
        }
        self.validate_endpoint(target, endpoint)?;

        self.unbind_endpoint(conn_id, endpoint);
        self.bind_endpoint(conn_id, endpoint, target);
        self.debug_validate();
        Ok(())
    }

    /// Clear the connection's endpoint and the slot that references it
    fn unbind_endpoint(&mut self, conn_id: ConnectionId, endpoint: Endpoint) {
        let conn = &mut self.connections[&conn_id];
        let previous = match endpoint {
            Endpoint::Output => conn.from.take(),
            Endpoint::Input => conn.to.take(),
        };
        if let Some((block_id, idx)) = previous {
            if let Some(block) = self.blocks.get_mut(&block_id) {
                match endpoint {
                    Endpoint::Output => block.output_slots[idx] = None,
                    Endpoint::Input => block.input_slots[idx] = None,
                }
            }
        }
    }

    /// Bind the connection's endpoint to a port, evicting whatever other
    /// connection occupied it; an evicted connection left with neither
    /// end bound is destroyed. Endpoints must be validated beforehand.
    fn bind_endpoint(
        &mut self,
        conn_id: ConnectionId,
        endpoint: Endpoint,
        target: Option<(BlockId, usize)>,
    ) {
        let Some((block_id, idx)) = target else {
            return;
        };

        // Evict the current occupant, if it is a different connection
        let occupant = {
            let block = &self.blocks[&block_id];
            match endpoint {
                Endpoint::Output => block.output_slots[idx],
                Endpoint::Input => block.input_slots[idx],
            }
        };
        if let Some(other) = occupant.filter(|o| *o != conn_id) {
            let other_conn = &mut self.connections[&other];
            match endpoint {
                Endpoint::Output => other_conn.from = None,
                Endpoint::Input => other_conn.to = None,
            }
            // An evicted connection with no remaining bound end must be
            // destroyed on the spot, never left registered
            if other_conn.from.is_none() && other_conn.to.is_none() {
                self.connections.shift_remove(&other);
                self.render_order
                    .retain(|e| *e != RenderElement::Connection(other));
            }
        }

        let block = self.blocks.get_mut(&block_id).expect("endpoint validated");
        let pos = match endpoint {
            Endpoint::Output => {
                block.output_slots[idx] = Some(conn_id);
                block.output_port_pos(idx)
            }
            Endpoint::Input => {
                block.input_slots[idx] = Some(conn_id);
                block.input_port_pos(idx)
            }
        };

        let conn = &mut self.connections[&conn_id];
        match endpoint {
            Endpoint::Output => {
                conn.from = Some((block_id, idx));
                conn.from_pos = pos;
            }
            Endpoint::Input => {
                conn.to = Some((block_id, idx));
                conn.to_pos = pos;
            }
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
