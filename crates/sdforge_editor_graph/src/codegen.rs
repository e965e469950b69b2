// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLSL fragment-shader generation from the block graph.
//!
//! Two pure read-only passes over the graph: a definitions pass that
//! emits each block kind's function snippet, and a scene pass that walks
//! backward from the screen block building one call-site expression.
//! The result is spliced between fixed header and ray-marching
//! templates.

use crate::block::{BlockId, BlockKind};
use crate::graph::Graph;
use std::collections::HashSet;
use tracing::warn;

/// Error during shader generation
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// A block's required input port has no upstream connection
    #[error("Block {block:?} input port {port} is not connected")]
    DisconnectedInput {
        /// Block whose input is missing
        block: BlockId,
        /// Disconnected input port index
        port: usize,
    },

    /// The call-site walk revisited a block (the graph has a cycle)
    #[error("Cycle detected while generating the scene expression")]
    CycleDetected,
}

/// Fixed fragment-shader preamble: version, outputs, uniforms
const FRAG_HEADER: &str = "#version 330 core

// Ouput data
out vec4 color;
uniform vec2 resolution;
uniform float time;


vec2 pt;
";

/// Fixed ray-marching main: normal estimation, camera, marching loop,
/// fog and lighting
const RAYMARCH_EPILOGUE: &str = "
vec3 norm(vec3 p)
{
	// the normal is simply the gradient of the volume
	vec4 dim = vec4(1, 1, 1, 0) * 0.0001;
	vec3 n;
	n.x = scene(p - dim.xww) - scene(p + dim.xww);
	n.y = scene(p - dim.wyw) - scene(p + dim.wyw);
	n.z = scene(p - dim.wwz) - scene(p + dim.wwz);
	return normalize(n);
}

void main(void)
{
	vec2 pos = gl_FragCoord.xy / resolution.xy;
	pt = -1.0 + 2.0 * vec2(pos.x, 1.0-pos.y);

	// camera
	vec3 dir = normalize(vec3(pt * resolution.xy, -0.5 * resolution.y / tan(0.5 * 45.0 / 180.0 * 3.1415926 )));
	vec2 rot = vec2(cos(time * 0.09), sin(time * 0.09));
	vec3 ray = vec3(0.0, rot * 5.0);
	dir = vec3(dir.x, dot(vec2(dir.z, -dir.y), vec2(rot.x, -rot.y)), dot(vec2(dir.z, -dir.y), rot.yx) );

	// raymarching
	float t = 0.0;
	for (int i = 0; i < 90; i++)
	{
		float k = scene(ray + dir * t);
		t += k;
	}
	vec3 hit = ray + dir * t;

	// fog
	float fogFact = clamp(exp(-distance(ray, hit) * 0.3), 0.0, 1.0);

	if (fogFact < 0.05)
	{
		color = vec4(0.0, 0.0, 0.0, 1.0);
		return;
	}

	// diffuse & specular light
	vec3 sun = normalize(vec3(0.1, 1.0, 0.2));
	vec3 n = norm(hit);
	vec3 ref = reflect(normalize(hit - ray), n);
	float diff = dot(n, sun);
	float spec = pow(max(dot(ref, sun), 0.0), 32.0);
	vec3 col = mix(vec3(0.0, 0.7, 0.9), vec3(0.0, 0.1, 0.2), diff);

	col = fogFact * (col + spec);

	color = vec4(col, 1.0);

}
";

/// Generate the complete fragment shader for the graph.
///
/// No partial output: any generation error aborts the whole request.
pub fn generate_frag_shader(graph: &Graph) -> Result<String, CodegenError> {
    Ok(format!(
        "{}{}{}{}",
        FRAG_HEADER,
        generate_definitions(graph),
        generate_scene(graph)?,
        RAYMARCH_EPILOGUE
    ))
}

/// Concatenate block definition snippets in graph insertion order,
/// emitting each block kind at most once
pub fn generate_definitions(graph: &Graph) -> String {
    let mut emitted: HashSet<BlockKind> = HashSet::new();
    let mut out = String::new();
    for block in graph.blocks() {
        if emitted.insert(block.kind) {
            out.push_str(block.kind.definition());
        }
    }
    out
}

/// Generate the `scene` wrapper function.
///
/// The body is the screen block's call-site expression, or `0.0` when no
/// screen block exists. Zero or multiple screen blocks are tolerated
/// (last one in insertion order wins) but logged as a warning.
pub fn generate_scene(graph: &Graph) -> Result<String, CodegenError> {
    let screens: Vec<BlockId> = graph
        .blocks()
        .filter(|b| b.kind == BlockKind::Screen)
        .map(|b| b.id)
        .collect();
    if screens.len() != 1 {
        warn!(
            screen_count = screens.len(),
            "graph does not have exactly one screen block"
        );
    }

    let body = match screens.last() {
        Some(screen) => {
            let mut visiting = HashSet::new();
            generate_callsite(graph, *screen, &mut visiting)?
        }
        None => "0.0".to_string(),
    };

    Ok(format!("\nfloat scene(vec3 p)\n{{\n\treturn {body};\n}}\n"))
}

/// Generate the call-site expression for a block, recursively requesting
/// the call-sites of whatever feeds its input ports
pub fn generate_callsite(
    graph: &Graph,
    block_id: BlockId,
    visiting: &mut HashSet<BlockId>,
) -> Result<String, CodegenError> {
    if !visiting.insert(block_id) {
        return Err(CodegenError::CycleDetected);
    }

    let block = graph.block(block_id).expect("live block in call-site walk");
    let expr = match block.kind {
        BlockKind::Sphere => "sdsphere(p, 1.0)".to_string(),
        BlockKind::Box => "sdBox(p, vec3(0.7))".to_string(),
        BlockKind::BoolDifference => {
            let a = upstream_callsite(graph, block_id, 0, visiting)?;
            let b = upstream_callsite(graph, block_id, 1, visiting)?;
            format!("opS({a},{b})")
        }
        BlockKind::Screen => upstream_callsite(graph, block_id, 0, visiting)?,
    };

    visiting.remove(&block_id);
    Ok(expr)
}

/// Call-site of the block feeding `port` of `block_id`
fn upstream_callsite(
    graph: &Graph,
    block_id: BlockId,
    port: usize,
    visiting: &mut HashSet<BlockId>,
) -> Result<String, CodegenError> {
    let disconnected = CodegenError::DisconnectedInput {
        block: block_id,
        port,
    };

    let block = graph.block(block_id).expect("live block");
    let Some(conn_id) = block.input_slots[port] else {
        return Err(disconnected);
    };
    let conn = graph.connection(conn_id).expect("live connection");
    // A connection dangling at the from end feeds nothing
    let Some((upstream, _)) = conn.from else {
        return Err(disconnected);
    };
    generate_callsite(graph, upstream, visiting)
}
