use bytemuck::{Pod, Zeroable};

/// Panorama pass: a fullscreen quad whose UVs are remapped into the
/// equirectangular image around the current yaw/pitch.
pub const PANORAMA_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

struct ViewUniform {
    center: vec2<f32>,
    span: vec2<f32>,
};

@group(0) @binding(0)
var panorama_texture: texture_2d<f32>;
@group(0) @binding(1)
var panorama_sampler: sampler;
@group(0) @binding(2)
var<uniform> view: ViewUniform;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let offset = (input.uv - vec2<f32>(0.5, 0.5)) * view.span;
    let u = fract(view.center.x + offset.x);
    let v = clamp(view.center.y + offset.y, 0.0, 1.0);
    return textureSample(panorama_texture, panorama_sampler, vec2<f32>(u, v));
}
"#;

pub const MARKER_SHADER_SOURCE: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) local: vec2<f32>,
};

struct VertexIn {
    @location(0) base_pos: vec2<f32>,
    @location(1) translate: vec2<f32>,
    @location(2) size: vec2<f32>,
    @location(3) highlight: f32,
    @location(4) color: vec3<f32>,
};

@vertex
fn vs_main(input: VertexIn) -> VertexOutput {
    let scale = input.size * (1.0 + input.highlight * 0.5);
    let position = input.base_pos * scale + input.translate;
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = mix(input.color, vec3<f32>(1.0, 1.0, 1.0), input.highlight * 0.35);
    out.local = input.base_pos;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    if (length(input.local) > 0.5) {
        discard;
    }
    return vec4<f32>(input.color, 0.9);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        uv: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        uv: [1.0, 1.0],
    },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct ViewUniform {
    /// Panorama UV under the viewport centre.
    pub center: [f32; 2],
    /// Fraction of the panorama covered by the viewport on each axis.
    pub span: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MarkerVertex {
    pub position: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MarkerInstance {
    pub translate: [f32; 2],
    pub size: [f32; 2],
    pub highlight: f32,
    pub color: [f32; 3],
}

pub const MARKER_VERTICES: [MarkerVertex; 6] = [
    MarkerVertex {
        position: [-0.5, -0.5],
    },
    MarkerVertex {
        position: [0.5, -0.5],
    },
    MarkerVertex {
        position: [-0.5, 0.5],
    },
    MarkerVertex {
        position: [-0.5, 0.5],
    },
    MarkerVertex {
        position: [0.5, -0.5],
    },
    MarkerVertex {
        position: [0.5, 0.5],
    },
];
