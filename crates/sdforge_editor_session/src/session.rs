// SPDX-License-Identifier: MIT OR Apache-2.0
//! The interactive editing session and its gesture state machine.
//!
//! All graph mutation funnels through [`EditorSession`]: one owner, one
//! graph, one viewport, one active gesture. Gestures follow a strict
//! start/update/stop protocol. Starting any operation while a different
//! one is active first routes through the active operation's stop
//! handler, and updates for a non-active operation are ignored rather
//! than queued.

use crate::input::{InputEvent, KeyChord, MouseButton};
use crate::view::Viewport;
use sdforge_editor_graph::codegen::{self, CodegenError};
use sdforge_editor_graph::{BlockId, ConnectionId, Endpoint, Graph, Hit, Rect, RenderElement, Vec2};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error from a compile cycle
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Shader generation failed; nothing was written
    #[error("shader generation failed: {0}")]
    Codegen(#[from] CodegenError),

    /// Writing the shader artifact failed
    #[error("failed to write shader artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// The operations a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Pan the view
    Pan,
    /// Zoom the view
    Zoom,
    /// Drag a block (may resolve to a port drag on start)
    BlockDrag,
    /// Drag a connection endpoint
    PortDrag,
    /// Compile the graph to the shader artifact
    Compile,
}

/// The active gesture and its per-gesture state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// No gesture active
    Idle,
    /// Panning the view around a diagram-space pivot
    Pan {
        /// Diagram point that must stay under the pointer
        pivot: Vec2,
    },
    /// Zooming the view (one start/update/stop triplet per scroll event)
    Zoom,
    /// Dragging a block body
    BlockDrag {
        /// Block being dragged
        block: BlockId,
        /// Pointer position minus block origin, recorded at start
        pivot: Vec2,
    },
    /// Dragging one endpoint of a connection
    PortDrag {
        /// Connection being dragged
        conn: ConnectionId,
        /// Which endpoint follows the pointer
        dragging: Endpoint,
    },
    /// Compiling (entire effect happens in the start handler)
    Compile,
}

impl Gesture {
    /// The operation this gesture answers update/stop calls for
    fn operation(self) -> Option<Operation> {
        match self {
            Self::Idle => None,
            Self::Pan { .. } => Some(Operation::Pan),
            Self::Zoom => Some(Operation::Zoom),
            Self::BlockDrag { .. } => Some(Operation::BlockDrag),
            Self::PortDrag { .. } => Some(Operation::PortDrag),
            Self::Compile => Some(Operation::Compile),
        }
    }
}

/// An interactive editing session over one shading-block graph.
///
/// Owns the graph, the viewport transform and the gesture state machine;
/// replaces the reference implementation's global singletons so multiple
/// independent sessions can coexist. Not thread-safe by design: all
/// mutation goes through `&mut self` on one coordinating thread, and any
/// rendering consumer reads between mutations.
#[derive(Debug)]
pub struct EditorSession {
    /// The graph being edited
    pub graph: Graph,
    /// The view transform
    pub viewport: Viewport,
    gesture: Gesture,
    /// Last pointer position, screen space, floored to whole pixels
    pointer: Vec2,
    output_path: PathBuf,
    needs_redraw: bool,
    needs_shader_reload: bool,
}

impl EditorSession {
    /// Create a session over a graph, with the shader artifact written
    /// to `output_path` on each compile
    pub fn new(graph: Graph, viewport: Viewport, output_path: impl Into<PathBuf>) -> Self {
        Self {
            graph,
            viewport,
            gesture: Gesture::Idle,
            pointer: Vec2::default(),
            output_path: output_path.into(),
            needs_redraw: true,
            needs_shader_reload: false,
        }
    }

    /// The currently active gesture
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Path the compiled shader is written to
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Take the diagram-redraw flag, clearing it
    pub fn take_needs_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Take the shader-reload flag, clearing it
    pub fn take_needs_shader_reload(&mut self) -> bool {
        std::mem::take(&mut self.needs_shader_reload)
    }

    /// Feed one logical input event through the session
    pub fn handle_event(&mut self, event: InputEvent) -> Result<(), CompileError> {
        match event {
            InputEvent::PointerMove { x, y } => {
                self.pointer = Vec2::new(x.floor(), y.floor());
                self.update(Operation::Pan, self.pointer);
                self.update(Operation::BlockDrag, self.pointer);
                self.update(Operation::PortDrag, self.pointer);
            }
            InputEvent::Button {
                button: MouseButton::Secondary,
                pressed: true,
            } => self.start(Operation::Pan)?,
            InputEvent::Button {
                button: MouseButton::Primary,
                pressed: true,
            } => self.start(Operation::BlockDrag)?,
            InputEvent::Button { pressed: false, .. } => self.cancel(),
            InputEvent::Scroll { dx, dy } => {
                self.start(Operation::Zoom)?;
                self.update(Operation::Zoom, Vec2::new(dx, dy));
                self.cancel();
            }
            InputEvent::Key {
                chord: KeyChord::Compile,
                pressed: true,
            } => {
                let result = self.start(Operation::Compile);
                self.update(Operation::Compile, Vec2::default());
                self.cancel();
                result?;
            }
            InputEvent::Key { pressed: false, .. } => {}
        }
        Ok(())
    }

    /// Start an operation.
    ///
    /// Any different active operation is stopped first; no two gestures
    /// ever interleave. A start that finds nothing to act on (e.g. a
    /// block drag over empty space) leaves the session idle.
    pub fn start(&mut self, op: Operation) -> Result<(), CompileError> {
        if self.gesture.operation().is_some_and(|active| active != op) {
            self.cancel();
        }
        debug!(?op, "gesture start");
        match op {
            Operation::Pan => {
                let pivot = self.viewport.screen_to_graph(self.pointer);
                self.gesture = Gesture::Pan { pivot };
            }
            Operation::Zoom => {
                self.gesture = Gesture::Zoom;
            }
            Operation::BlockDrag | Operation::PortDrag => self.start_block_drag(),
            Operation::Compile => self.start_compile()?,
        }
        Ok(())
    }

    /// Update the active operation.
    ///
    /// `arg` is the screen pointer position for drags and the scroll
    /// delta for zoom. Updates for any operation other than the active
    /// one are silently ignored.
    pub fn update(&mut self, op: Operation, arg: Vec2) {
        if self.gesture.operation() != Some(op) {
            return;
        }
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Pan { pivot } => {
                let screen = Vec2::new(arg.x.floor(), arg.y.floor());
                self.viewport.pan_to(pivot, screen);
                self.needs_redraw = true;
            }
            Gesture::Zoom => {
                self.viewport.zoom_by(arg.y);
                self.needs_redraw = true;
            }
            Gesture::BlockDrag { block, pivot } => {
                let pos = self.pointer_graph_pos(arg);
                let size = match self.graph.block(block) {
                    Some(b) => b.rect.size,
                    None => return,
                };
                self.graph.set_block_position(
                    block,
                    Rect::new(pos.x - pivot.x, pos.y - pivot.y, size.x, size.y),
                );
                self.needs_redraw = true;
            }
            Gesture::PortDrag { conn, dragging } => {
                let pos = self.pointer_graph_pos(arg);
                // Magnet: snap onto a valid port, else follow the pointer
                if !self.snap_dragged_endpoint(conn, dragging, pos) {
                    self.graph.set_endpoint_pos(conn, dragging, pos);
                }
                self.needs_redraw = true;
            }
            Gesture::Compile => {} // whole effect happens in start
        }
    }

    /// Stop whatever operation is active.
    ///
    /// This is both "the gesture ended" and "cancel": interruption and
    /// explicit cancellation share one code path, so the graph is always
    /// left consistent.
    pub fn cancel(&mut self) {
        match self.gesture {
            Gesture::Idle => return,
            Gesture::Pan { .. } | Gesture::Zoom | Gesture::BlockDrag { .. } | Gesture::Compile => {}
            Gesture::PortDrag { conn, dragging } => {
                let pos = self.viewport.screen_to_graph(self.pointer);
                if !self.snap_dragged_endpoint(conn, dragging, pos) {
                    // Dropped on empty space: a connection dangling on
                    // both ends is never retained
                    self.graph.remove_connection(conn);
                }
                self.needs_redraw = true;
            }
        }
        debug!(gesture = ?self.gesture, "gesture stop");
        self.gesture = Gesture::Idle;
    }

    /// One full compile cycle (start then stop)
    pub fn compile(&mut self) -> Result<(), CompileError> {
        let result = self.start(Operation::Compile);
        self.cancel();
        result
    }

    fn pointer_graph_pos(&self, screen: Vec2) -> Vec2 {
        self.viewport
            .screen_to_graph(Vec2::new(screen.x.floor(), screen.y.floor()))
    }

    /// Resolve a primary-button press into a block drag or a port drag,
    /// scanning the render order topmost-first
    fn start_block_drag(&mut self) {
        let pos = self.viewport.screen_to_graph(self.pointer);
        match self.graph.hit_test(pos) {
            None => {
                // Pick-miss: stay idle, touch nothing
            }
            Some(Hit::ConnectionEndpoint(conn, endpoint)) => {
                // Re-anchor the picked end of an existing connection,
                // freeing it to follow the pointer
                self.graph.raise_connection_to_top(conn);
                self.gesture = Gesture::PortDrag {
                    conn,
                    dragging: endpoint,
                };
                self.needs_redraw = true;
            }
            Some(Hit::Block(block_id)) => {
                let (free_input, free_output, origin) = {
                    let block = self.graph.block(block_id).expect("hit block is live");
                    (
                        block.free_input_port_at(pos),
                        block.free_output_port_at(pos),
                        block.rect.pos,
                    )
                };

                if let Some(idx) = free_input {
                    // New half-open connection anchored at the input,
                    // dangling at the from end
                    let conn = self
                        .graph
                        .add_connection(None, Some((block_id, idx)))
                        .expect("anchored endpoint is valid");
                    self.graph.set_endpoint_pos(conn, Endpoint::Output, pos);
                    self.gesture = Gesture::PortDrag {
                        conn,
                        dragging: Endpoint::Output,
                    };
                } else if let Some(idx) = free_output {
                    let conn = self
                        .graph
                        .add_connection(Some((block_id, idx)), None)
                        .expect("anchored endpoint is valid");
                    self.graph.set_endpoint_pos(conn, Endpoint::Input, pos);
                    self.gesture = Gesture::PortDrag {
                        conn,
                        dragging: Endpoint::Input,
                    };
                } else {
                    // True block drag: record the pivot offset and
                    // promote the dragged subgraph to the top
                    let pivot = Vec2::new(pos.x - origin.x, pos.y - origin.y);
                    self.graph.raise_block_to_top(block_id);
                    self.gesture = Gesture::BlockDrag {
                        block: block_id,
                        pivot,
                    };
                }
                self.needs_redraw = true;
            }
        }
    }

    /// Try to snap the dragged endpoint onto a valid port under `pos`.
    ///
    /// Scans the render order topmost-first, skipping the dragged
    /// connection itself. Only the first hit element is considered: if
    /// it is a block other than the connection's opposite endpoint, its
    /// ports of the required polarity are tested for a free (or
    /// self-occupied) port; any other outcome stops the scan without
    /// falling through to elements behind it.
    fn snap_dragged_endpoint(&mut self, conn_id: ConnectionId, dragging: Endpoint, pos: Vec2) -> bool {
        let opposite_block = {
            let conn = self.graph.connection(conn_id).expect("dragged connection is live");
            match dragging {
                Endpoint::Input => conn.from.map(|(b, _)| b),
                Endpoint::Output => conn.to.map(|(b, _)| b),
            }
        };

        let mut target = None;
        for element in self.graph.render_order().iter().rev() {
            match *element {
                RenderElement::Connection(id) if id == conn_id => continue,
                RenderElement::Connection(id) => {
                    let conn = self.graph.connection(id).expect("ordered connection is live");
                    if conn.pick_endpoint(pos).is_some() {
                        break;
                    }
                }
                RenderElement::Block(id) => {
                    let block = self.graph.block(id).expect("ordered block is live");
                    if !block.is_picked(pos) {
                        continue;
                    }
                    if Some(id) != opposite_block {
                        target = self.free_or_self_port(id, dragging, conn_id, pos);
                    }
                    break;
                }
            }
        }

        let Some((block, idx)) = target else {
            return false;
        };
        match dragging {
            Endpoint::Input => self.graph.set_to(conn_id, Some((block, idx))),
            Endpoint::Output => self.graph.set_from(conn_id, Some((block, idx))),
        }
        .expect("snap target was validated against the live block");
        true
    }

    /// First port of the required polarity under `pos` that is free or
    /// already occupied by the dragged connection itself
    fn free_or_self_port(
        &self,
        block_id: BlockId,
        dragging: Endpoint,
        conn_id: ConnectionId,
        pos: Vec2,
    ) -> Option<(BlockId, usize)> {
        let block = self.graph.block(block_id)?;
        match dragging {
            Endpoint::Input => (0..block.input_slots.len())
                .find(|&i| {
                    block.input_port_rect(i).contains_point(pos)
                        && block.input_slots[i].map_or(true, |c| c == conn_id)
                })
                .map(|i| (block_id, i)),
            Endpoint::Output => (0..block.output_slots.len())
                .find(|&i| {
                    block.output_port_rect(i).contains_point(pos)
                        && block.output_slots[i].map_or(true, |c| c == conn_id)
                })
                .map(|i| (block_id, i)),
        }
    }

    /// Generate the shader and write the artifact; the whole effect of
    /// the compile gesture lives here, not in stop
    fn start_compile(&mut self) -> Result<(), CompileError> {
        let shader = codegen::generate_frag_shader(&self.graph)?;
        std::fs::write(&self.output_path, shader)?;
        self.needs_shader_reload = true;
        info!(path = %self.output_path.display(), "wrote generated shader");
        self.gesture = Gesture::Compile;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdforge_editor_graph::{Block, BlockKind};

    /// Screen coordinates that map to the given diagram position
    fn screen_of(view: &Viewport, graph_pos: Vec2) -> Vec2 {
        view.graph_to_screen(graph_pos)
    }

    fn session_with(graph: Graph) -> EditorSession {
        EditorSession::new(graph, Viewport::new(1600.0, 900.0), "unused.frag")
    }

    fn move_pointer_to(session: &mut EditorSession, graph_pos: Vec2) {
        let screen = screen_of(&session.viewport, graph_pos);
        session
            .handle_event(InputEvent::PointerMove {
                x: screen.x,
                y: screen.y,
            })
            .unwrap();
    }

    fn press(session: &mut EditorSession) {
        session
            .handle_event(InputEvent::Button {
                button: MouseButton::Primary,
                pressed: true,
            })
            .unwrap();
    }

    fn release(session: &mut EditorSession) {
        session
            .handle_event(InputEvent::Button {
                button: MouseButton::Primary,
                pressed: false,
            })
            .unwrap();
    }

    /// Sphere and screen block, not connected, well inside the viewport
    fn sphere_and_screen() -> (Graph, BlockId, BlockId) {
        let mut graph = Graph::new();
        let sphere = graph.add_block(Block::new(BlockKind::Sphere).with_position(-300.0, 0.0));
        let screen = graph.add_block(Block::new(BlockKind::Screen).with_position(100.0, 0.0));
        (graph, sphere, screen)
    }

    #[test]
    fn test_block_drag_over_empty_space_stays_idle() {
        let (graph, _, _) = sphere_and_screen();
        let mut session = session_with(graph);
        let blocks = session.graph.block_count();
        let conns = session.graph.connection_count();

        move_pointer_to(&mut session, Vec2::new(-700.0, -400.0));
        press(&mut session);
        assert_eq!(session.gesture(), Gesture::Idle);
        assert_eq!(session.graph.block_count(), blocks);
        assert_eq!(session.graph.connection_count(), conns);
        release(&mut session);
        assert_eq!(session.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_drag_from_output_port_snaps_onto_input() {
        let (graph, sphere, screen) = sphere_and_screen();
        let mut session = session_with(graph);

        let out_pos = session.graph.block(sphere).unwrap().output_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(out_pos.x - 5.0, out_pos.y));
        press(&mut session);
        assert!(matches!(
            session.gesture(),
            Gesture::PortDrag {
                dragging: Endpoint::Input,
                ..
            }
        ));

        let in_pos = session.graph.block(screen).unwrap().input_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(in_pos.x + 5.0, in_pos.y));
        release(&mut session);

        assert_eq!(session.gesture(), Gesture::Idle);
        assert_eq!(session.graph.connection_count(), 1);
        let conn = session.graph.connections().next().unwrap();
        assert_eq!(conn.from, Some((sphere, 0)));
        assert_eq!(conn.to, Some((screen, 0)));
        session.graph.assert_consistent();
    }

    #[test]
    fn test_drop_on_empty_space_removes_connection() {
        let (mut graph, sphere, screen) = sphere_and_screen();
        let conn = graph
            .add_connection(Some((sphere, 0)), Some((screen, 0)))
            .unwrap();
        let mut session = session_with(graph);

        // Pick up the existing connection's input end
        let to_pos = session.graph.connection(conn).unwrap().to_pos;
        move_pointer_to(&mut session, to_pos);
        press(&mut session);
        assert!(matches!(
            session.gesture(),
            Gesture::PortDrag {
                dragging: Endpoint::Input,
                ..
            }
        ));

        // Drop it far from any block
        move_pointer_to(&mut session, Vec2::new(-700.0, -400.0));
        release(&mut session);

        assert_eq!(session.graph.connection_count(), 0);
        assert!(session.graph.connection(conn).is_none());
        assert_eq!(
            session.graph.render_order().len(),
            session.graph.block_count()
        );
        session.graph.assert_consistent();
    }

    #[test]
    fn test_snap_is_idempotent_over_repeated_updates() {
        let (graph, sphere, screen) = sphere_and_screen();
        let mut session = session_with(graph);

        let out_pos = session.graph.block(sphere).unwrap().output_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(out_pos.x - 5.0, out_pos.y));
        press(&mut session);

        // Hover over the target port repeatedly before releasing
        let in_pos = session.graph.block(screen).unwrap().input_port_pos(0);
        for _ in 0..4 {
            move_pointer_to(&mut session, Vec2::new(in_pos.x + 3.0, in_pos.y));
        }
        release(&mut session);

        assert_eq!(session.graph.connection_count(), 1);
        let conn = session.graph.connections().next().unwrap();
        assert_eq!(conn.to, Some((screen, 0)));
        session.graph.assert_consistent();
    }

    #[test]
    fn test_dragging_new_connection_from_input_port() {
        let (graph, sphere, screen) = sphere_and_screen();
        let mut session = session_with(graph);

        let in_pos = session.graph.block(screen).unwrap().input_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(in_pos.x + 5.0, in_pos.y));
        press(&mut session);
        assert!(matches!(
            session.gesture(),
            Gesture::PortDrag {
                dragging: Endpoint::Output,
                ..
            }
        ));

        let out_pos = session.graph.block(sphere).unwrap().output_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(out_pos.x - 5.0, out_pos.y));
        release(&mut session);

        assert_eq!(session.graph.connection_count(), 1);
        let conn = session.graph.connections().next().unwrap();
        assert_eq!(conn.from, Some((sphere, 0)));
        assert_eq!(conn.to, Some((screen, 0)));
    }

    #[test]
    fn test_block_drag_moves_block_and_synchronizes_ports() {
        let (mut graph, sphere, screen) = sphere_and_screen();
        let conn = graph
            .add_connection(Some((sphere, 0)), Some((screen, 0)))
            .unwrap();
        let mut session = session_with(graph);

        // Grab the sphere's body center (away from its output port)
        let rect = session.graph.block(sphere).unwrap().rect;
        let center = Vec2::new(rect.pos.x + rect.size.x / 2.0, rect.pos.y + rect.size.y / 2.0);
        move_pointer_to(&mut session, center);
        press(&mut session);
        assert!(matches!(session.gesture(), Gesture::BlockDrag { .. }));

        move_pointer_to(&mut session, Vec2::new(center.x + 100.0, center.y - 50.0));
        release(&mut session);

        let moved = session.graph.block(sphere).unwrap();
        assert!((moved.rect.pos.x - (rect.pos.x + 100.0)).abs() < 1.0);
        assert!((moved.rect.pos.y - (rect.pos.y - 50.0)).abs() < 1.0);
        assert_eq!(
            session.graph.connection(conn).unwrap().from_pos,
            moved.output_port_pos(0)
        );
    }

    #[test]
    fn test_block_drag_promotes_subgraph_to_top() {
        let (mut graph, sphere, screen) = sphere_and_screen();
        let conn = graph
            .add_connection(Some((sphere, 0)), Some((screen, 0)))
            .unwrap();
        let mut session = session_with(graph);

        let rect = session.graph.block(sphere).unwrap().rect;
        move_pointer_to(
            &mut session,
            Vec2::new(rect.pos.x + rect.size.x / 2.0, rect.pos.y + rect.size.y / 2.0),
        );
        press(&mut session);

        let order = session.graph.render_order();
        assert_eq!(order[order.len() - 2], RenderElement::Block(sphere));
        assert_eq!(order[order.len() - 1], RenderElement::Connection(conn));
        release(&mut session);
    }

    #[test]
    fn test_starting_new_gesture_stops_active_one() {
        let (graph, sphere, _) = sphere_and_screen();
        let mut session = session_with(graph);

        // Begin a port drag from the sphere's output
        let out_pos = session.graph.block(sphere).unwrap().output_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(out_pos.x - 5.0, out_pos.y));
        press(&mut session);
        assert!(matches!(session.gesture(), Gesture::PortDrag { .. }));
        assert_eq!(session.graph.connection_count(), 1);

        // Interrupt with a pan: the half-open connection must be
        // cleaned up by the port drag's stop handler first
        session
            .handle_event(InputEvent::Button {
                button: MouseButton::Secondary,
                pressed: true,
            })
            .unwrap();
        assert!(matches!(session.gesture(), Gesture::Pan { .. }));
        assert_eq!(session.graph.connection_count(), 0);
        session.graph.assert_consistent();
    }

    #[test]
    fn test_stale_updates_are_ignored() {
        let (graph, _, _) = sphere_and_screen();
        let mut session = session_with(graph);
        let view_before = session.viewport;

        // No gesture active: drag updates must not touch the view
        session.update(Operation::Pan, Vec2::new(400.0, 300.0));
        session.update(Operation::Zoom, Vec2::new(0.0, 10.0));
        assert_eq!(session.viewport, view_before);
        assert_eq!(session.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_scroll_event_runs_full_zoom_cycle() {
        let (graph, _, _) = sphere_and_screen();
        let mut session = session_with(graph);

        session
            .handle_event(InputEvent::Scroll { dx: 0.0, dy: 2.0 })
            .unwrap();
        assert_eq!(session.gesture(), Gesture::Idle);
        assert!((session.viewport.scale - 1.08).abs() < 1e-4);
    }

    #[test]
    fn test_pan_follows_pointer() {
        let (graph, _, _) = sphere_and_screen();
        let mut session = session_with(graph);

        session
            .handle_event(InputEvent::PointerMove { x: 800.0, y: 450.0 })
            .unwrap();
        session
            .handle_event(InputEvent::Button {
                button: MouseButton::Secondary,
                pressed: true,
            })
            .unwrap();
        let Gesture::Pan { pivot } = session.gesture() else {
            panic!("expected pan gesture");
        };

        // The pivot stays under the pointer as it moves
        session
            .handle_event(InputEvent::PointerMove { x: 900.0, y: 400.0 })
            .unwrap();
        let under_pointer = session.viewport.screen_to_graph(Vec2::new(900.0, 400.0));
        assert!((under_pointer.x - pivot.x).abs() < 1e-3);
        assert!((under_pointer.y - pivot.y).abs() < 1e-3);

        session
            .handle_event(InputEvent::Button {
                button: MouseButton::Secondary,
                pressed: false,
            })
            .unwrap();
        assert_eq!(session.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_compile_chord_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.frag");
        let mut session =
            EditorSession::new(Graph::demo(), Viewport::new(1600.0, 900.0), &path);

        session
            .handle_event(InputEvent::Key {
                chord: KeyChord::Compile,
                pressed: true,
            })
            .unwrap();
        assert_eq!(session.gesture(), Gesture::Idle);
        assert!(session.take_needs_shader_reload());

        let shader = std::fs::read_to_string(&path).unwrap();
        assert!(shader.contains("float scene(vec3 p)"));
        assert!(shader.contains("opS(sdBox(p, vec3(0.7)),sdsphere(p, 1.0))"));
    }

    #[test]
    fn test_failed_compile_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.frag");

        // Screen fed by a difference block with a disconnected input
        let mut graph = Graph::new();
        let diff = graph.add_block(Block::new(BlockKind::BoolDifference));
        let screen = graph.add_block(Block::new(BlockKind::Screen).with_position(300.0, 0.0));
        graph
            .add_connection(Some((diff, 0)), Some((screen, 0)))
            .unwrap();

        let mut session = EditorSession::new(graph, Viewport::new(1600.0, 900.0), &path);
        let result = session.compile();
        assert!(matches!(
            result,
            Err(CompileError::Codegen(CodegenError::DisconnectedInput { .. }))
        ));
        assert!(!path.exists());
        assert!(!session.take_needs_shader_reload());
        assert_eq!(session.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_snap_does_not_steal_occupied_port() {
        let (mut graph, sphere, screen) = sphere_and_screen();
        let box_id = graph.add_block(Block::new(BlockKind::Box).with_position(-300.0, 300.0));
        let existing = graph
            .add_connection(Some((sphere, 0)), Some((screen, 0)))
            .unwrap();
        let mut session = session_with(graph);

        // Drag a new connection from the box's output onto the screen's
        // occupied input: the snap must not bind, and the drop removes
        // the half-open connection
        let out_pos = session.graph.block(box_id).unwrap().output_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(out_pos.x - 5.0, out_pos.y));
        press(&mut session);
        assert_eq!(session.graph.connection_count(), 2);

        let in_pos = session.graph.block(screen).unwrap().input_port_pos(0);
        move_pointer_to(&mut session, Vec2::new(in_pos.x + 5.0, in_pos.y));
        release(&mut session);

        assert_eq!(session.graph.connection_count(), 1);
        let conn = session.graph.connection(existing).unwrap();
        assert_eq!(conn.from, Some((sphere, 0)));
        assert_eq!(conn.to, Some((screen, 0)));
        session.graph.assert_consistent();
    }
}
