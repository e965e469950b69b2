// SPDX-License-Identifier: MIT OR Apache-2.0
//! `SDForge` Editor - node-based signed-distance-field scene editor
//!
//! Headless driver for the editing stack: builds the starter scene,
//! replays a short editing sequence through the gesture state machine
//! and compiles the graph to a GLSL fragment shader on disk. A
//! rendering shell plugs in by forwarding its real input stream to the
//! same [`EditorSession`] and reloading the shader whenever the session
//! raises the reload flag.

use sdforge_editor_graph::{Graph, Vec2};
use sdforge_editor_session::{EditorSession, InputEvent, KeyChord, MouseButton, Viewport};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const VIEW_WIDTH: f32 = 1600.0;
const VIEW_HEIGHT: f32 = 900.0;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("sdforge_editor_app=debug".parse().expect("valid directive"))
        .add_directive("sdforge_editor_session=debug".parse().expect("valid directive"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SDForge Editor v{}", env!("CARGO_PKG_VERSION"));

    let output_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("scene.frag"), PathBuf::from);

    if let Err(e) = run(output_path) {
        tracing::error!("Editor session failed: {e}");
        std::process::exit(1);
    }
}

fn run(output_path: PathBuf) -> Result<(), sdforge_editor_session::CompileError> {
    let mut session = EditorSession::new(
        Graph::demo(),
        Viewport::new(VIEW_WIDTH, VIEW_HEIGHT),
        output_path,
    );

    // Nudge the first block off its starting spot through the gesture
    // pipeline, exactly as a pointer-driven shell would
    let first_rect = session.graph.blocks().next().map(|b| b.rect);
    if let Some(rect) = first_rect {
        let center = Vec2::new(
            rect.pos.x + rect.size.x / 2.0,
            rect.pos.y + rect.size.y / 2.0,
        );
        let grab = session.viewport.graph_to_screen(center);
        session.handle_event(InputEvent::PointerMove {
            x: grab.x,
            y: grab.y,
        })?;
        session.handle_event(InputEvent::Button {
            button: MouseButton::Primary,
            pressed: true,
        })?;
        session.handle_event(InputEvent::PointerMove {
            x: grab.x + 40.0,
            y: grab.y - 25.0,
        })?;
        session.handle_event(InputEvent::Button {
            button: MouseButton::Primary,
            pressed: false,
        })?;
    }

    session.handle_event(InputEvent::Key {
        chord: KeyChord::Compile,
        pressed: true,
    })?;

    if session.take_needs_shader_reload() {
        tracing::info!(
            path = %session.output_path().display(),
            blocks = session.graph.block_count(),
            connections = session.graph.connection_count(),
            "scene compiled"
        );
    }
    Ok(())
}
