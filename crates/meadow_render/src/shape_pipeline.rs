use wgpu::util::DeviceExt;

use crate::camera::{Camera2D, CameraUniform, ViewportRect};
use crate::shape_store::ShapeMesh;
use crate::vertex::ShapeVertex;

/// One camera's uniform buffer and the bind group that exposes it.
pub struct CameraBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera2D) {
        let uniform = camera.build_uniform();
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

pub struct ShapePipeline {
    pipeline: wgpu::RenderPipeline,
    camera_layout: wgpu::BindGroupLayout,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
}

const INITIAL_VERTICES: usize = 16 * 1024;
const INITIAL_INDICES: usize = 32 * 1024;

impl ShapePipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shape Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shape.wgsl").into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shape Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[ShapeVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = Self::create_buffer(
            device,
            "Shape Vertex Buffer",
            INITIAL_VERTICES * std::mem::size_of::<ShapeVertex>(),
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = Self::create_buffer(
            device,
            "Shape Index Buffer",
            INITIAL_INDICES * std::mem::size_of::<u32>(),
            wgpu::BufferUsages::INDEX,
        );

        Self {
            pipeline,
            camera_layout,
            vertex_buffer,
            index_buffer,
            vertex_capacity: INITIAL_VERTICES,
            index_capacity: INITIAL_INDICES,
        }
    }

    fn create_buffer(
        device: &wgpu::Device,
        label: &str,
        size: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as wgpu::BufferAddress,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn create_camera_binding(&self, device: &wgpu::Device, label: &str) -> CameraBinding {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&CameraUniform::identity()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        CameraBinding { buffer, bind_group }
    }

    /// Copy this frame's mesh to the GPU, growing the buffers when needed.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: &ShapeMesh) {
        if mesh.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = mesh.vertices.len().next_power_of_two();
            self.vertex_buffer = Self::create_buffer(
                device,
                "Shape Vertex Buffer",
                self.vertex_capacity * std::mem::size_of::<ShapeVertex>(),
                wgpu::BufferUsages::VERTEX,
            );
            log::debug!("Grew shape vertex buffer to {}", self.vertex_capacity);
        }
        if mesh.indices.len() > self.index_capacity {
            self.index_capacity = mesh.indices.len().next_power_of_two();
            self.index_buffer = Self::create_buffer(
                device,
                "Shape Index Buffer",
                self.index_capacity * std::mem::size_of::<u32>(),
                wgpu::BufferUsages::INDEX,
            );
            log::debug!("Grew shape index buffer to {}", self.index_capacity);
        }
        if !mesh.vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
    }

    /// Draw `range` of the uploaded indices through `camera`, clipped to `viewport`.
    /// `surface` is the target size; the scissor is clamped to it.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &CameraBinding,
        viewport: ViewportRect,
        surface: (u32, u32),
        range: std::ops::Range<u32>,
    ) {
        let Some((sx, sy, sw, sh)) = scissor_for(viewport, surface) else {
            return;
        };
        if range.is_empty() {
            return;
        }
        pass.set_viewport(viewport.x, viewport.y, viewport.width, viewport.height, 0.0, 1.0);
        pass.set_scissor_rect(sx, sy, sw, sh);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &camera.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(range, 0, 0..1);
    }
}

/// Integer scissor rectangle for `viewport`, clamped to the surface. `None` when
/// nothing of the viewport is on screen.
fn scissor_for(viewport: ViewportRect, surface: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let x0 = viewport.x.max(0.0).floor() as u32;
    let y0 = viewport.y.max(0.0).floor() as u32;
    let x1 = ((viewport.x + viewport.width).max(0.0).ceil() as u32).min(surface.0);
    let y1 = ((viewport.y + viewport.height).max(0.0).ceil() as u32).min(surface.1);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}
