// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive editing session for signed-distance-field block graphs.
//!
//! This crate layers a view transform, an input vocabulary and a gesture
//! state machine on top of `sdforge_editor_graph`. A host shell feeds
//! [`InputEvent`]s into an [`EditorSession`] and reads back the graph,
//! the [`Viewport`] and the redraw/shader-reload flags between events.

pub mod input;
pub mod session;
pub mod view;

pub use input::{InputEvent, KeyChord, MouseButton};
pub use session::{CompileError, EditorSession, Gesture, Operation};
pub use view::Viewport;
