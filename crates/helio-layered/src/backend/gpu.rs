//! wgpu backend
//!
//! Records every operation of a frame into one command encoder, created on
//! first use and submitted by `end_frame`. Pipelines are built lazily per
//! target format.

use super::{ColorFormat, CompositionInputs, DrawInstance, Extent, RenderBackend};
use crate::camera::CameraUniform;
use crate::composite;
use crate::config::BloomParameters;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Off-screen colour texture
pub struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    extent: Extent,
    format: ColorFormat,
}

impl GpuTarget {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FilterUniform {
    direction: [f32; 2],
    kernel_radius: u32,
    sigma: f32,
    threshold: f32,
    strength: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniform {
    exposure: f32,
    _pad: [f32; 3],
}

const QUAD_CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// GPU implementation of [`RenderBackend`]; the surface is a texture view in
/// `surface_format`
pub struct GpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface_format: wgpu::TextureFormat,

    instance_shader: wgpu::ShaderModule,
    bloom_shader: wgpu::ShaderModule,
    composite_shader: wgpu::ShaderModule,

    camera_layout: wgpu::BindGroupLayout,
    filter_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,

    quad_vertices: wgpu::Buffer,
    quad_indices: wgpu::Buffer,

    instance_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    threshold_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    blur_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    composite_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,

    encoder: Option<wgpu::CommandEncoder>,
}

impl GpuBackend {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        log::info!("Creating GPU layer backend (surface {:?})", surface_format);

        let instance_shader = create_shader(
            &device,
            "Layer Instances Shader",
            include_str!("../../shaders/passes/instances.wgsl"),
        )?;
        let bloom_shader = create_shader(
            &device,
            "Bloom Filter Shader",
            include_str!("../../shaders/passes/bloom.wgsl"),
        )?;
        let composite_shader = create_shader(
            &device,
            "Layer Composite Shader",
            include_str!("../../shaders/passes/composite.wgsl"),
        )?;

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layer Camera Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let filter_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Filter Layout"),
            entries: &[texture_entry(0), uniform_entry(1, wgpu::ShaderStages::FRAGMENT)],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layer Composite Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                uniform_entry(3, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let quad_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Layer Quad Vertices"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Layer Quad Indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            device,
            queue,
            surface_format,
            instance_shader,
            bloom_shader,
            composite_shader,
            camera_layout,
            filter_layout,
            composite_layout,
            quad_vertices,
            quad_indices,
            instance_pipelines: HashMap::new(),
            threshold_pipelines: HashMap::new(),
            blur_pipelines: HashMap::new(),
            composite_pipelines: HashMap::new(),
            encoder: None,
        })
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Change the format composition writes to (e.g. after surface reconfiguration)
    pub fn set_surface_format(&mut self, format: wgpu::TextureFormat) {
        self.surface_format = format;
    }

    fn ensure_instance_pipeline(&mut self, format: wgpu::TextureFormat) -> Result<()> {
        if self.instance_pipelines.contains_key(&format) {
            return Ok(());
        }
        log::debug!("Building instance pipeline for {:?}", format);
        let device = &self.device;
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Layer Instances Pipeline Layout"),
            bind_group_layouts: &[&self.camera_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Layer Instances Pipeline"),
            layout: Some(&layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &self.instance_shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    // Slot 0: quad corner (per-vertex)
                    wgpu::VertexBufferLayout {
                        array_stride: 8,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: 0,
                        }],
                    },
                    // Slot 1: DrawInstance, 48 bytes
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<DrawInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            // position (vec3) + half size (f32)
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x4,
                                offset: 0,
                                shader_location: 1,
                            },
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x4,
                                offset: 16,
                                shader_location: 2,
                            },
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Uint32,
                                offset: 32,
                                shader_location: 3,
                            },
                        ],
                    },
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.instance_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            // Painter's order, no depth buffer
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        pop_scope(device, |e| Error::Pipeline(format!("instance pipeline: {}", e)))?;

        self.instance_pipelines.insert(format, pipeline);
        Ok(())
    }

    fn ensure_filter_pipelines(&mut self, format: wgpu::TextureFormat) -> Result<()> {
        if !self.threshold_pipelines.contains_key(&format) {
            log::debug!("Building bloom threshold pipeline for {:?}", format);
            let pipeline = fullscreen_pipeline(
                &self.device,
                "Bloom Threshold Pipeline",
                &self.filter_layout,
                &self.bloom_shader,
                "fs_threshold",
                format,
            )?;
            self.threshold_pipelines.insert(format, pipeline);
        }
        if !self.blur_pipelines.contains_key(&format) {
            log::debug!("Building bloom blur pipeline for {:?}", format);
            let pipeline = fullscreen_pipeline(
                &self.device,
                "Bloom Blur Pipeline",
                &self.filter_layout,
                &self.bloom_shader,
                "fs_blur",
                format,
            )?;
            self.blur_pipelines.insert(format, pipeline);
        }
        Ok(())
    }

    fn ensure_composite_pipeline(&mut self, format: wgpu::TextureFormat) -> Result<()> {
        if self.composite_pipelines.contains_key(&format) {
            return Ok(());
        }
        log::debug!("Building composite pipeline for {:?}", format);
        let pipeline = fullscreen_pipeline(
            &self.device,
            "Layer Composite Pipeline",
            &self.composite_layout,
            &self.composite_shader,
            "fs_main",
            format,
        )?;
        self.composite_pipelines.insert(format, pipeline);
        Ok(())
    }

    /// One full-screen filter pass reading `source` into `output`
    fn filter_pass(
        &mut self,
        label: &str,
        threshold_stage: bool,
        source: &GpuTarget,
        output: &GpuTarget,
        uniform: FilterUniform,
    ) -> Result<()> {
        let format = output.format.to_wgpu();
        self.ensure_filter_pipelines(format)?;
        let pipelines = if threshold_stage {
            &self.threshold_pipelines
        } else {
            &self.blur_pipelines
        };
        let pipeline = pipelines
            .get(&format)
            .ok_or_else(|| Error::Pipeline(format!("{} pipeline missing", label)))?;

        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Filter Uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Filter Bind Group"),
            layout: &self.filter_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let encoder = frame_encoder(&mut self.encoder, &self.device);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &output.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(())
    }
}

impl RenderBackend for GpuBackend {
    type Target = GpuTarget;
    type Surface = wgpu::TextureView;

    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_target(
        &mut self,
        label: &str,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<GpuTarget> {
        let max = self.device.limits().max_texture_dimension_2d;
        if extent.width > max || extent.height > max {
            return Err(Error::Resource(format!(
                "{} {}x{} exceeds max texture dimension {}",
                label, extent.width, extent.height, max
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format.to_wgpu(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = validation.or(oom) {
            return Err(Error::Resource(format!("{}: {}", label, err)));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Created GPU target '{}' {}x{}", label, extent.width, extent.height);
        Ok(GpuTarget {
            texture,
            view,
            extent,
            format,
        })
    }

    fn release_target(&mut self, target: GpuTarget) {
        target.texture.destroy();
    }

    fn target_extent(&self, target: &GpuTarget) -> Extent {
        target.extent
    }

    fn surface_extent(&self, _surface: &wgpu::TextureView) -> Option<Extent> {
        None
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.encoder.is_some() {
            log::warn!("Discarding commands from an unfinished frame");
            self.encoder = None;
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
        Ok(())
    }

    fn abort_frame(&mut self) {
        if self.encoder.take().is_some() {
            log::debug!("Dropped commands of a failed frame");
        }
    }

    fn clear(&mut self, target: &GpuTarget, color: [f32; 4]) -> Result<()> {
        let encoder = frame_encoder(&mut self.encoder, &self.device);
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Layer Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(to_wgpu_color(color)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        Ok(())
    }

    fn draw_instances(
        &mut self,
        target: &GpuTarget,
        camera: &CameraUniform,
        instances: &[DrawInstance],
        clear: Option<[f32; 4]>,
    ) -> Result<()> {
        if instances.is_empty() {
            return match clear {
                Some(color) => self.clear(target, color),
                None => Ok(()),
            };
        }

        let format = target.format.to_wgpu();
        self.ensure_instance_pipeline(format)?;
        let pipeline = self
            .instance_pipelines
            .get(&format)
            .ok_or_else(|| Error::Pipeline("instance pipeline missing".into()))?;

        let camera_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Layer Camera Uniform"),
            contents: bytemuck::bytes_of(camera),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let instance_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Layer Instances"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Layer Camera Bind Group"),
            layout: &self.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(to_wgpu_color(color)),
            None => wgpu::LoadOp::Load,
        };
        let encoder = frame_encoder(&mut self.encoder, &self.device);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Layer Instances Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_vertices.slice(..));
        pass.set_vertex_buffer(1, instance_buffer.slice(..));
        pass.set_index_buffer(self.quad_indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..instances.len() as u32);
        Ok(())
    }

    fn bloom_filter(
        &mut self,
        source: &GpuTarget,
        output: &GpuTarget,
        params: &BloomParameters,
    ) -> Result<()> {
        if source.extent != output.extent {
            return Err(Error::Resource("bloom source and output differ in size".into()));
        }

        let kernel_radius = composite::kernel_radius(params.radius);
        let uniform = FilterUniform {
            direction: [0.0, 0.0],
            kernel_radius,
            sigma: composite::sigma(kernel_radius),
            threshold: params.threshold,
            strength: 1.0,
            _pad: [0.0; 2],
        };

        self.filter_pass("Bloom Threshold", true, source, output, uniform)?;
        self.filter_pass(
            "Bloom Blur H",
            false,
            output,
            source,
            FilterUniform { direction: [1.0, 0.0], ..uniform },
        )?;
        self.filter_pass(
            "Bloom Blur V",
            false,
            source,
            output,
            FilterUniform {
                direction: [0.0, 1.0],
                strength: params.strength,
                ..uniform
            },
        )
    }

    fn composite(
        &mut self,
        inputs: CompositionInputs<'_, GpuTarget>,
        exposure: f32,
        surface: &wgpu::TextureView,
    ) -> Result<()> {
        let format = self.surface_format;
        self.ensure_composite_pipeline(format)?;
        let pipeline = self
            .composite_pipelines
            .get(&format)
            .ok_or_else(|| Error::Pipeline("composite pipeline missing".into()))?;

        let uniform = CompositeUniform {
            exposure,
            _pad: [0.0; 3],
        };
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Layer Composite Uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Layer Composite Bind Group"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&inputs.base.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&inputs.bloom.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&inputs.overlay.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let encoder = frame_encoder(&mut self.encoder, &self.device);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Layer Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(())
    }
}

fn frame_encoder<'a>(
    slot: &'a mut Option<wgpu::CommandEncoder>,
    device: &wgpu::Device,
) -> &'a mut wgpu::CommandEncoder {
    slot.get_or_insert_with(|| {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Layer Frame Encoder"),
        })
    })
}

fn create_shader(device: &wgpu::Device, label: &str, source: &str) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    pop_scope(device, |e| Error::Shader(format!("{}: {}", label, e)))?;
    Ok(module)
}

fn pop_scope(device: &wgpu::Device, wrap: impl FnOnce(wgpu::Error) -> Error) -> Result<()> {
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(wrap(err)),
        None => Ok(()),
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        cache: None,
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });
    pop_scope(device, |e| Error::Pipeline(format!("{}: {}", label, e)))?;
    Ok(pipeline)
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn to_wgpu_color(color: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: color[0] as f64,
        g: color[1] as f64,
        b: color[2] as f64,
        a: color[3] as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<FilterUniform>(), 32);
        assert_eq!(std::mem::size_of::<CompositeUniform>(), 16);
    }

    #[test]
    fn quad_indices_cover_two_triangles() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_CORNERS.len()));
    }
}
