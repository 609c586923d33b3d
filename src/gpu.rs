use std::iter::once;
use std::mem::size_of;

use anyhow::{bail, Context, Result};
use bytemuck::bytes_of;
use bytemuck_derive::{Pod, Zeroable};
use log::{debug, warn};
use nalgebra::{point, Point2, Point3};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use wgpu::{BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, Buffer, BufferUsages, ColorTargetState, ColorWrites, CommandEncoderDescriptor, DeviceDescriptor, Extent3d, FragmentState, ImageCopyTexture, ImageDataLayout, include_wgsl, InstanceDescriptor, LoadOp, Operations, Origin3d, PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, RequestAdapterOptions, SamplerBindingType, ShaderStages, Surface, SurfaceConfiguration, SurfaceError, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType, TextureUsages, TextureViewDescriptor, TextureViewDimension, vertex_attr_array, VertexBufferLayout, VertexState, VertexStepMode};
use wgpu::util::{BufferInitDescriptor, DeviceExt};

use flat_tracer::{FrameBuffer, RGBA8};

#[derive(Copy, Clone, Pod, Zeroable)]
#[repr(C)]
struct Vertex {
    position: Point3<f32>,
    tex: Point2<f32>,
}

// Row 0 of the frame buffer is the top of the image.
const VERTEX_DATA: [Vertex; 4] = [
    Vertex {
        position: point![-1.0, 1.0, 0.0],
        tex: point![0.0, 0.0],
    },
    Vertex {
        position: point![-1.0, -1.0, 0.0],
        tex: point![0.0, 1.0],
    },
    Vertex {
        position: point![1.0, 1.0, 0.0],
        tex: point![1.0, 0.0],
    },
    Vertex {
        position: point![1.0, -1.0, 0.0],
        tex: point![1.0, 1.0],
    },
];

const FRAME_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

pub struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Gpu {
    /// Opens a device able to present to `window`.
    pub async fn new<W>(window: &W) -> Result<(Self, Surface)>
        where W: HasRawWindowHandle + HasRawDisplayHandle {
        let instance = wgpu::Instance::new(InstanceDescriptor::default());
        let surface = unsafe { instance.create_surface(window) }
            .context("create window surface")?;
        let adapter = instance.request_adapter(&RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        })
            .await
            .context("no compatible wgpu adapter")?;
        debug!(target: "app", "Adapter: {:?}", adapter.get_info());
        let (device, queue) = adapter.request_device(&DeviceDescriptor::default(), None).await
            .context("wgpu device")?;

        Ok((Gpu { adapter, device, queue }, surface))
    }
}

/// Shows a fixed-size frame buffer stretched over the whole window surface.
pub struct Presenter {
    gpu: Gpu,
    surface: Surface,
    surface_config: SurfaceConfiguration,
    vertex_buffer: Buffer,
    pipeline: RenderPipeline,
    bind_group: BindGroup,
    texture: wgpu::Texture,
    frame_size: (u32, u32),
}

impl Presenter {
    pub fn new(gpu: Gpu, surface: Surface, surface_size: (u32, u32), frame_size: (u32, u32)) -> Result<Self> {
        let (width, height) = surface_size;
        let mut surface_config = surface.get_default_config(&gpu.adapter, width.max(1), height.max(1))
            .context("surface is not supported by the adapter")?;
        surface_config.format = surface_config.format.remove_srgb_suffix();
        surface.configure(&gpu.device, &surface_config);
        debug!(target: "app", "Surface: {:?}", surface_config);

        let vertex_buffer = gpu.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("quad vertices"),
            usage: BufferUsages::VERTEX,
            contents: bytes_of(&VERTEX_DATA),
        });

        let texture = gpu.device.create_texture(&TextureDescriptor {
            label: Some("frame"),
            size: Extent3d {
                width: frame_size.0,
                height: frame_size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let sampler = gpu.device.create_sampler(&Default::default());

        let texture_bind_group_layout = gpu.device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: None,
            entries: &[
                BindGroupLayoutEntry {
                    count: None,
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                    },
                },
                BindGroupLayoutEntry {
                    count: None,
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::NonFiltering),
                },
            ],
        });

        let module = gpu.device.create_shader_module(include_wgsl!("shader.wgsl"));
        let pipeline_layout = gpu.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&texture_bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = gpu.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("present"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &module,
                entry_point: "vertex_main",
                buffers: &[
                    VertexBufferLayout {
                        array_stride: size_of::<Vertex>() as _,
                        attributes: &vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                        step_mode: VertexStepMode::Vertex,
                    },
                ],
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            fragment: Some(FragmentState {
                module: &module,
                entry_point: "fragment_main",
                targets: &[Some(ColorTargetState {
                    format: surface_config.format,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        let texture_view = texture.create_view(&TextureViewDescriptor::default());
        let bind_group = gpu.device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: &texture_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&texture_view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(Presenter {
            gpu,
            surface,
            surface_config,
            vertex_buffer,
            pipeline,
            bind_group,
            texture,
            frame_size,
        })
    }

    /// Only the surface follows the window; the frame resolution stays fixed.
    pub fn surface_resize(&mut self, size: (u32, u32)) {
        let (width, height) = size;
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.gpu.device, &self.surface_config);
    }

    pub fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        if (frame.width(), frame.height()) != self.frame_size {
            bail!("frame is {}x{}, presenter expects {:?}", frame.width(), frame.height(), self.frame_size);
        }

        let target = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Timeout) => return Ok(()),
            Err(SurfaceError::Outdated | SurfaceError::Lost) => {
                warn!(target: "app", "Surface lost, reconfiguring");
                self.surface.configure(&self.gpu.device, &self.surface_config);
                return Ok(());
            }
            Err(err) => return Err(err).context("current surface texture"),
        };
        let target_view = target.texture.create_view(&TextureViewDescriptor::default());

        self.gpu.queue.write_texture(
            ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                aspect: TextureAspect::All,
                origin: Origin3d::ZERO,
            },
            frame.as_bytes(),
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size_of::<RGBA8>() as u32 * frame.width()),
                rows_per_image: Some(frame.height()),
            },
            Extent3d {
                width: frame.width(),
                height: frame.height(),
                depth_or_array_layers: 1,
            },
        );

        let mut encoder = self.gpu.device.create_command_encoder(&CommandEncoderDescriptor::default());

        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &target_view,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                    resolve_target: None,
                })],
                depth_stencil_attachment: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..4, 0..1);
        }

        self.gpu.queue.submit(once(encoder.finish()));
        target.present();
        Ok(())
    }
}
