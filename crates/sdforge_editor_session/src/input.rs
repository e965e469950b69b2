// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logical input events consumed by the editing session.
//!
//! Whatever platform layer owns the real event loop translates its
//! device events into these and feeds them to
//! [`EditorSession::handle_event`](crate::EditorSession::handle_event).

use serde::{Deserialize, Serialize};

/// Mouse buttons the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary (left) button: block/port dragging
    Primary,
    /// Secondary (right) button: view panning
    Secondary,
}

/// Key chords the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyChord {
    /// The compile chord (Ctrl+D in the default bindings): one full
    /// compile cycle per press
    Compile,
}

/// A logical input event, pointer coordinates in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer moved to a new screen position
    PointerMove {
        /// Screen x in pixels
        x: f32,
        /// Screen y in pixels
        y: f32,
    },
    /// Mouse button pressed or released
    Button {
        /// Which button
        button: MouseButton,
        /// True on press, false on release
        pressed: bool,
    },
    /// Scroll wheel moved
    Scroll {
        /// Horizontal scroll units
        dx: f32,
        /// Vertical scroll units (one unit per wheel notch)
        dy: f32,
    },
    /// Key chord pressed or released
    Key {
        /// Which chord
        chord: KeyChord,
        /// True on press, false on release
        pressed: bool,
    },
}
