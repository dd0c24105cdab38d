// Static meshes for the gallery: one unit box (walls, floor, frames) and one
// unit quad (canvases). Everything else is a model matrix on top of these.
//
//   PolyMesh → triangulate_flat() → RenderMesh → GPU

use glam::{Vec2, Vec3};

// ============================================================================
// GPU VERTICES
// ============================================================================

/// Lit vertex:
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Textured vertex for canvases:
///   @location(0) position: vec3<f32>
///   @location(1) uv:       vec2<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexVertex {
    pub position: [f32; 3],
    pub uv:       [f32; 2],
}

impl TexVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

// ============================================================================
// POLY MESH
// ============================================================================

/// Polygon mesh built at startup. Faces are CCW seen from outside, which is
/// what back-face culling expects.
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    pub faces:     Vec<Vec<usize>>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            faces:     Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, pos: Vec3) -> usize {
        let idx = self.positions.len();
        self.positions.push(pos);
        idx
    }

    pub fn add_face(&mut self, indices: Vec<usize>) {
        debug_assert!(indices.len() >= 3, "Face must have at least 3 vertices");
        self.faces.push(indices);
    }

    /// Axis-aligned box centred on the origin with edge length 1.
    pub fn unit_box() -> Self {
        let mut mesh = Self::new();
        // (normal, u, v) with u × v = normal, so corners go CCW around the normal.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        for (n, u, v) in faces {
            let c = n * 0.5;
            let a = mesh.add_vertex(c - u * 0.5 - v * 0.5);
            let b = mesh.add_vertex(c + u * 0.5 - v * 0.5);
            let d = mesh.add_vertex(c + u * 0.5 + v * 0.5);
            let e = mesh.add_vertex(c - u * 0.5 + v * 0.5);
            mesh.add_face(vec![a, b, d, e]);
        }
        mesh
    }
}

impl Default for PolyMesh {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// GPU-ready triangulated mesh. Upload vertex_bytes() to a VERTEX buffer and
/// index_bytes() to an INDEX buffer.
pub struct RenderMesh<V: bytemuck::Pod> {
    pub vertices: Vec<V>,
    pub indices:  Vec<u32>,
}

impl<V: bytemuck::Pod> RenderMesh<V> {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize  { self.indices.len() }
}

/// Flat shading: every face gets its own copy of its corners so the box
/// keeps hard edges.
pub fn triangulate_flat(poly: &PolyMesh) -> RenderMesh<GpuVertex> {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in &poly.faces {
        let a = poly.positions[face[0]];
        let b = poly.positions[face[1]];
        let c = poly.positions[face[2]];
        let normal = (b - a).cross(c - a).normalize_or_zero();

        let base = vertices.len() as u32;
        for &i in face {
            vertices.push(GpuVertex {
                position: poly.positions[i].to_array(),
                normal:   normal.to_array(),
            });
        }
        // Fan from the first corner
        for i in 1..(face.len() as u32 - 1) {
            indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }

    RenderMesh { vertices, indices }
}

/// Unit quad in the XY plane facing +Z. UV (0,0) is the top-left of the image.
pub fn unit_quad() -> RenderMesh<TexVertex> {
    let corners = [
        (Vec3::new(-0.5, -0.5, 0.0), Vec2::new(0.0, 1.0)),
        (Vec3::new(0.5, -0.5, 0.0), Vec2::new(1.0, 1.0)),
        (Vec3::new(0.5, 0.5, 0.0), Vec2::new(1.0, 0.0)),
        (Vec3::new(-0.5, 0.5, 0.0), Vec2::new(0.0, 0.0)),
    ];
    RenderMesh {
        vertices: corners
            .iter()
            .map(|(p, uv)| TexVertex { position: p.to_array(), uv: uv.to_array() })
            .collect(),
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}
