// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shading-block graph model for the SDForge Editor.
//!
//! This crate provides the graph an editor session mutates and a shader
//! generator reads:
//! - Blocks with fixed-arity input/output ports
//! - Connections with eviction-on-rebind port semantics
//! - A render/pick order covering every live element
//! - GLSL fragment-shader generation from the screen block
//!
//! ## Architecture
//!
//! Blocks and connections live in handle-keyed arenas; connections
//! reference blocks by [`BlockId`], never by pointer, so removal is a
//! bounds-checked invalidation. Block variants are a closed enum
//! dispatched by exhaustive matching.

pub mod block;
pub mod codegen;
pub mod connection;
pub mod geometry;
pub mod graph;

pub use block::{Block, BlockId, BlockKind};
pub use connection::{Connection, ConnectionId, Endpoint};
pub use geometry::{Rect, Vec2};
pub use graph::{ConnectError, Graph, Hit, RenderElement};
