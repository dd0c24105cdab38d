// wgpu output for the gallery.
//
// Two pipelines share one scene uniform (camera, fog, lights):
//   boxes:    corridor surfaces and frames, lit, ONE instanced draw
//   canvases: textured quads, unlit, one draw per canvas (own bind group)
// Both draw into an offscreen target sized by the pixel ratio, which is then
// stretched over the surface. The overlay is drawn at surface resolution.
// The renderer only reads a SceneSnapshot; it never touches the ECS world.

use bevy_ecs::entity::Entity;
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::camera::CameraState;
use super::debug_overlay::{DebugOverlay, OverlayFrame};
use super::error::RenderError;
use super::frame::MIN_PIXEL_RATIO;
use super::gallery::{SceneSnapshot, TextureSlot};
use super::mesh::{GpuVertex, PolyMesh, TexVertex, triangulate_flat, unit_quad};

pub const MAX_LIGHTS: usize = 32;
const INITIAL_INSTANCES: usize = 256;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const FOG_COLOR: [f32; 3] = [0.039, 0.039, 0.102];
const FOG_NEAR: f32 = 50.0;
const FOG_FAR: f32 = 200.0;
/// Canvases are unlit; this scales their texels.
const CANVAS_BRIGHTNESS: f32 = 0.9;

const COMMON_WGSL: &str = include_str!("../shaders/common.wgsl");
const SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
const CANVAS_WGSL: &str = include_str!("../shaders/canvas.wgsl");
const BLIT_WGSL: &str = include_str!("../shaders/blit.wgsl");

// ============================================================================
// GPU DATA
// ============================================================================

/// Per-instance model matrix and colour. Locations 2..=6.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuLight {
    position: [f32; 3],
    range: f32,
    color: [f32; 3],
    intensity: f32,
}

/// Must match `Scene` in common.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    fog_color: [f32; 4],
    params: [f32; 4],
    lights: [GpuLight; MAX_LIGHTS],
}

struct CanvasTexture {
    /// Identity of the uploaded pixels; a different Arc means re-upload.
    source: Arc<RgbaImage>,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// Growable instance buffer.
struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    label: &'static str,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, capacity, label }
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[InstanceData]) {
        if data.len() > self.capacity {
            *self = Self::new(device, self.label, data.len().next_power_of_two());
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
    }
}

/// Offscreen colour and depth the scene is drawn into before the blit.
struct SceneTarget {
    width: u32,
    height: u32,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    /// Samples color_view in the blit pass.
    bind_group: wgpu::BindGroup,
}

impl SceneTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        (width, height): (u32, u32),
    ) -> Self {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = create_depth_view(device, width, height);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("scene_target_bind_group"),
        });
        Self { width, height, color_view, depth_view, bind_group }
    }
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn new(device: &wgpu::Device, label: &str, vertex_bytes: &[u8], index_bytes: &[u8], index_count: usize) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertices, indices, index_count: index_count as u32 }
    }
}

// ============================================================================
// RENDERER
// ============================================================================

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    max_texture_dimension: u32,

    /// Scene pixels per logical window pixel.
    pixel_ratio: f32,
    scene_target: SceneTarget,
    blit_pipeline: wgpu::RenderPipeline,

    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,

    box_pipeline: wgpu::RenderPipeline,
    box_mesh: MeshBuffers,
    box_instances: InstanceBuffer,

    canvas_pipeline: wgpu::RenderPipeline,
    quad_mesh: MeshBuffers,
    canvas_instances: InstanceBuffer,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<(Entity, TextureSlot), CanvasTexture>,

    pub overlay: DebugOverlay,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Renderer: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_format,
            config.width,
            config.height
        );

        // ── Scene uniform ────────────────────────────────────────────────────
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("scene_bind_group_layout"),
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });

        // ── Canvas textures ──────────────────────────────────────────────────
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("canvas_texture_layout"),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // ── Pipelines ────────────────────────────────────────────────────────
        let box_pipeline = create_pipeline(
            &device,
            "Box",
            &format!("{COMMON_WGSL}\n{SCENE_WGSL}"),
            &[&scene_layout],
            GpuVertex::desc(),
            config.format,
            Some(wgpu::Face::Back),
        );
        // Canvases are drawn double-sided.
        let canvas_pipeline = create_pipeline(
            &device,
            "Canvas",
            &format!("{COMMON_WGSL}\n{CANVAS_WGSL}"),
            &[&scene_layout, &texture_layout],
            TexVertex::desc(),
            config.format,
            None,
        );

        let blit_pipeline = create_blit_pipeline(&device, &texture_layout, config.format);

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        let pixel_ratio = MIN_PIXEL_RATIO;
        let scene_target = SceneTarget::new(
            &device,
            config.format,
            &texture_layout,
            &sampler,
            scaled_extent(
                (config.width, config.height),
                pixel_ratio / window.scale_factor() as f32,
                max_texture_dimension,
            ),
        );

        let cube = triangulate_flat(&PolyMesh::unit_box());
        let box_mesh = MeshBuffers::new(&device, "Box", cube.vertex_bytes(), cube.index_bytes(), cube.index_count());
        let quad = unit_quad();
        let quad_mesh = MeshBuffers::new(&device, "Quad", quad.vertex_bytes(), quad.index_bytes(), quad.index_count());

        let box_instances = InstanceBuffer::new(&device, "Box Instance Buffer", INITIAL_INSTANCES);
        let canvas_instances = InstanceBuffer::new(&device, "Canvas Instance Buffer", INITIAL_INSTANCES);

        let overlay = DebugOverlay::new(&window, &device, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            max_texture_dimension,
            pixel_ratio,
            scene_target,
            blit_pipeline,
            scene_buffer,
            scene_bind_group,
            box_pipeline,
            box_mesh,
            box_instances,
            canvas_pipeline,
            quad_mesh,
            canvas_instances,
            texture_layout,
            sampler,
            textures: HashMap::new(),
            overlay,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Scene pixels per logical window pixel. Takes effect on the next frame.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
    }

    /// Size of the offscreen scene target as of the last frame.
    pub fn scene_size(&self) -> (u32, u32) {
        (self.scene_target.width, self.scene_target.height)
    }

    /// Recreate the scene target if the surface size, pixel ratio or display
    /// scale factor changed what it should be.
    fn sync_scene_target(&mut self, scale_factor: f64) {
        let extent = scaled_extent(
            (self.config.width, self.config.height),
            self.pixel_ratio / scale_factor as f32,
            self.max_texture_dimension,
        );
        if extent == self.scene_size() {
            return;
        }
        log::debug!("Scene target {}x{} (pixel ratio {:.2})", extent.0, extent.1, self.pixel_ratio);
        self.scene_target = SceneTarget::new(
            &self.device,
            self.config.format,
            &self.texture_layout,
            &self.sampler,
            extent,
        );
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Draw one frame. Returns the number of draw calls issued for the scene.
    pub fn render(
        &mut self,
        window: &Window,
        snapshot: &SceneSnapshot,
        camera: &CameraState,
        overlay: &OverlayFrame,
    ) -> Result<u32, wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // All uploads happen BEFORE the render pass
        self.sync_scene_target(window.scale_factor());
        self.sync_textures(snapshot);

        let boxes: Vec<InstanceData> = snapshot
            .boxes
            .iter()
            .map(|b| InstanceData {
                model: b.model.to_cols_array_2d(),
                color: [b.color.r, b.color.g, b.color.b, 1.0],
            })
            .collect();
        let canvases: Vec<InstanceData> = snapshot
            .canvases
            .iter()
            .map(|c| InstanceData { model: c.model.to_cols_array_2d(), color: [1.0; 4] })
            .collect();
        self.box_instances.write(&self.device, &self.queue, &boxes);
        self.canvas_instances.write(&self.device, &self.queue, &canvases);

        let uniforms = scene_uniforms(snapshot, camera, self.aspect());
        self.queue.write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut draw_calls = 0;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: FOG_COLOR[0] as f64,
                            g: FOG_COLOR[1] as f64,
                            b: FOG_COLOR[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.scene_target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

            if !boxes.is_empty() {
                render_pass.set_pipeline(&self.box_pipeline);
                render_pass.set_vertex_buffer(0, self.box_mesh.vertices.slice(..));
                render_pass.set_vertex_buffer(1, self.box_instances.buffer.slice(..));
                render_pass.set_index_buffer(self.box_mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.box_mesh.index_count, 0, 0..boxes.len() as u32);
                draw_calls += 1;
            }

            if !canvases.is_empty() {
                render_pass.set_pipeline(&self.canvas_pipeline);
                render_pass.set_vertex_buffer(0, self.quad_mesh.vertices.slice(..));
                render_pass.set_vertex_buffer(1, self.canvas_instances.buffer.slice(..));
                render_pass.set_index_buffer(self.quad_mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                for (i, canvas) in snapshot.canvases.iter().enumerate() {
                    let Some(texture) = self.textures.get(&(canvas.entity, canvas.slot)) else {
                        continue;
                    };
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    let i = i as u32;
                    render_pass.draw_indexed(0..self.quad_mesh.index_count, 0, i..i + 1);
                    draw_calls += 1;
                }
            }
        }

        {
            let mut blit_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            blit_pass.set_pipeline(&self.blit_pipeline);
            blit_pass.set_bind_group(0, &self.scene_target.bind_group, &[]);
            blit_pass.draw(0..3, 0..1);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &view,
            &screen_descriptor,
            overlay,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(draw_calls)
    }

    /// Upload canvas textures that are new or whose pixels changed.
    fn sync_textures(&mut self, snapshot: &SceneSnapshot) {
        for canvas in &snapshot.canvases {
            let key = (canvas.entity, canvas.slot);
            let fresh = self
                .textures
                .get(&key)
                .is_some_and(|t| Arc::ptr_eq(&t.source, &canvas.image));
            if fresh || canvas.image.width() == 0 || canvas.image.height() == 0 {
                continue;
            }
            let texture = self.upload_texture(&canvas.image);
            self.textures.insert(key, texture);
        }
    }

    fn upload_texture(&self, image: &Arc<RgbaImage>) -> CanvasTexture {
        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Canvas Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
            label: Some("canvas_bind_group"),
        });
        CanvasTexture { source: Arc::clone(image), bind_group, _texture: texture }
    }
}

fn scene_uniforms(snapshot: &SceneSnapshot, camera: &CameraState, aspect: f32) -> SceneUniforms {
    let mut lights = [GpuLight::default(); MAX_LIGHTS];
    let count = snapshot.lights.len().min(MAX_LIGHTS);
    for (slot, light) in lights.iter_mut().zip(&snapshot.lights) {
        *slot = GpuLight {
            position: light.position.to_array(),
            range: light.range,
            color: light.color.to_array(),
            intensity: light.intensity,
        };
    }
    SceneUniforms {
        view_proj: camera.view_projection(aspect).to_cols_array_2d(),
        camera_pos: camera.position.extend(1.0).to_array(),
        fog_color: [FOG_COLOR[0], FOG_COLOR[1], FOG_COLOR[2], 1.0],
        params: [FOG_NEAR, FOG_FAR, count as f32, CANVAS_BRIGHTNESS],
        lights,
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Scene target size for a surface drawn at `scale` scene pixels per surface
/// pixel, kept within the device texture limit.
fn scaled_extent((width, height): (u32, u32), scale: f32, max_dimension: u32) -> (u32, u32) {
    let scaled = |d: u32| ((d as f32 * scale).round() as u32).clamp(1, max_dimension.max(1));
    (scaled(width), scaled(height))
}

fn create_blit_pipeline(
    device: &wgpu::Device,
    texture_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Blit"),
        source: wgpu::ShaderSource::Wgsl(BLIT_WGSL.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Blit Pipeline Layout"),
        bind_group_layouts: &[texture_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Blit Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout, InstanceData::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::Color;
    use crate::engine::gallery::LightDraw;
    use glam::Vec3;

    #[test]
    fn uniform_layout_matches_wgsl() {
        // mat4 + 3 vec4 + 32 lights of 2 vec4 each
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 64 + 48 + 32 * 32);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn only_the_nearest_lights_are_uploaded() {
        let mut snapshot = SceneSnapshot::default();
        for i in 0..40 {
            snapshot.lights.push(LightDraw {
                position: Vec3::new(0.0, 7.0, -(i as f32)),
                color: Color::WHITE,
                intensity: 1.0,
                range: 10.0,
            });
        }
        let camera = CameraState::new(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 2.0, 0.0), 75f32.to_radians());
        let uniforms = scene_uniforms(&snapshot, &camera, 16.0 / 9.0);
        assert_eq!(uniforms.params[2], MAX_LIGHTS as f32);
        assert_eq!(uniforms.lights[0].position, [0.0, 7.0, 0.0]);
        assert_eq!(uniforms.lights[31].position, [0.0, 7.0, -31.0]);
    }

    #[test]
    fn scene_target_follows_pixel_ratio() {
        assert_eq!(scaled_extent((1280, 720), 1.0, 8192), (1280, 720));
        // 1.5 scene pixels per logical pixel on a 2x display
        assert_eq!(scaled_extent((2560, 1440), 1.5 / 2.0, 8192), (1920, 1080));
        assert_eq!(scaled_extent((1000, 500), 1.25, 8192), (1250, 625));
    }

    #[test]
    fn scene_target_stays_within_limits() {
        assert_eq!(scaled_extent((6000, 100), 1.5, 8192), (8192, 150));
        assert_eq!(scaled_extent((1, 1), 0.25, 8192), (1, 1));
    }
}
