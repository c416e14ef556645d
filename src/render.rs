use std::borrow::Cow;

use glam::Vec2;
use log::debug;
use wgpu::util::DeviceExt;

use crate::surface::{DrawingContext, Rgba};

const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    /// Zero for a solid disc, otherwise the fraction of `radius` where the alpha reaches zero
    pub fade_end: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Records one frame of draw calls for the GPU
#[derive(Default)]
pub struct FrameCanvas {
    circles: Vec<CircleInstance>,
    lines: Vec<LineVertex>,
}

impl FrameCanvas {
    pub fn circles(&self) -> &[CircleInstance] {
        &self.circles
    }

    pub fn lines(&self) -> &[LineVertex] {
        &self.lines
    }
}

impl DrawingContext for FrameCanvas {
    // The field always clears the whole surface, so anything recorded so far is dropped
    fn clear_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {
        self.circles.clear();
        self.lines.clear();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.circles.push(CircleInstance {
            center: center.to_array(),
            radius,
            fade_end: 0.0,
            color: color.to_array(),
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
        let color = color.to_array();
        self.lines.push(LineVertex {
            position: from.to_array(),
            color,
        });
        self.lines.push(LineVertex {
            position: to.to_array(),
            color,
        });
    }

    fn fill_radial(&mut self, center: Vec2, radius: f32, color: Rgba, fade_end: f32) {
        self.circles.push(CircleInstance {
            center: center.to_array(),
            radius,
            fade_end: fade_end.max(f32::EPSILON),
            color: color.to_array(),
        });
    }
}

pub struct RenderModule {
    screen_size_buffer: wgpu::Buffer,
    corners_buffer: wgpu::Buffer,

    circle_buffer: wgpu::Buffer,
    circle_capacity: usize,
    circle_count: u32,

    line_buffer: wgpu::Buffer,
    line_capacity: usize,
    line_vertex_count: u32,

    bind_group: wgpu::BindGroup,
    circle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
}

impl RenderModule {
    pub fn new(
        device: &wgpu::Device,
        swapchain_format: wgpu::TextureFormat,
        max_particles: usize,
    ) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("field"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("field.wgsl"))),
        });

        let screen_size_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen Size Buffer"),
            size: 4 * 4,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let corners_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Circle Corners Buffer"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Every pair can be linked, two vertices per link; one extra circle for the glow
        let circle_capacity = max_particles + 1;
        let line_capacity = (max_particles * max_particles.saturating_sub(1)).max(2);
        let circle_buffer = create_vertex_buffer::<CircleInstance>(device, circle_capacity);
        let line_buffer = create_vertex_buffer::<LineVertex>(device, line_capacity);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_size_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("render"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let target = wgpu::ColorTargetState {
            format: swapchain_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        };

        let circle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("circles"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "circle_vertex",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<CircleInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32, 2 => Float32, 3 => Float32x4],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 2 * 4,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![4 => Float32x2],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "circle_fragment",
                targets: &[Some(target.clone())],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("links"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "line_vertex",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "line_fragment",
                targets: &[Some(target)],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            screen_size_buffer,
            corners_buffer,

            circle_buffer,
            circle_capacity,
            circle_count: 0,

            line_buffer,
            line_capacity,
            line_vertex_count: 0,

            bind_group,
            circle_pipeline,
            line_pipeline,
        }
    }

    /// Copies the recorded frame into the vertex buffers
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, canvas: &FrameCanvas) {
        let circles = canvas.circles();
        if circles.len() > self.circle_capacity {
            self.circle_capacity = circles.len().next_power_of_two();
            self.circle_buffer = create_vertex_buffer::<CircleInstance>(device, self.circle_capacity);
            debug!("Grew circle buffer to {} instances", self.circle_capacity);
        }

        let lines = canvas.lines();
        if lines.len() > self.line_capacity {
            self.line_capacity = lines.len().next_power_of_two();
            self.line_buffer = create_vertex_buffer::<LineVertex>(device, self.line_capacity);
            debug!("Grew line buffer to {} vertices", self.line_capacity);
        }

        if !circles.is_empty() {
            queue.write_buffer(&self.circle_buffer, 0, bytemuck::cast_slice(circles));
        }
        if !lines.is_empty() {
            queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(lines));
        }

        self.circle_count = circles.len() as u32;
        self.line_vertex_count = lines.len() as u32;
    }

    pub fn begin_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
        background: wgpu::Color,
    ) -> wgpu::RenderPass<'a> {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_bind_group(0, &self.bind_group, &[]);

        if self.line_vertex_count > 0 {
            rpass.set_pipeline(&self.line_pipeline);
            rpass.set_vertex_buffer(0, self.line_buffer.slice(..));
            rpass.draw(0..self.line_vertex_count, 0..1);
        }

        if self.circle_count > 0 {
            rpass.set_pipeline(&self.circle_pipeline);
            rpass.set_vertex_buffer(0, self.circle_buffer.slice(..));
            rpass.set_vertex_buffer(1, self.corners_buffer.slice(..));
            rpass.draw(0..QUAD_CORNERS.len() as u32, 0..self.circle_count);
        }

        rpass
    }

    pub fn update_size(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        queue.write_buffer(
            &self.screen_size_buffer,
            0,
            bytemuck::bytes_of(&[width as f32, height as f32, 0.0, 0.0]),
        );
    }
}

fn create_vertex_buffer<T>(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: None,
        size: (std::mem::size_of::<T>() * capacity) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
