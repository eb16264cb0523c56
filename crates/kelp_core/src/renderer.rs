use wgpu::util::DeviceExt;

use crate::backend::{check_surface_size, check_texture_size, GpuBackend};
use crate::batch::RenderList;
use crate::config::KelpConfig;
use crate::error::{KelpError, KelpResult};
use crate::overlay::UiOverlay;
use crate::pipeline::PipelineCache;
use crate::resources::ResourceTable;
use crate::surface::SurfaceManager;
use crate::types::{GpuInstance, QuadVertex};
use crate::window::NativeWindow;

/// Pixel format of every texture the engine creates.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A texture plus one bind group per sampling mode.
#[derive(Debug)]
pub struct WgpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    point_bind_group: wgpu::BindGroup,
    linear_bind_group: wgpu::BindGroup,
}

impl WgpuTexture {
    pub fn bind_group(&self, smooth: bool) -> &wgpu::BindGroup {
        if smooth {
            &self.linear_bind_group
        } else {
            &self.point_bind_group
        }
    }
}

pub struct WgpuFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    /// Bytes of the instance buffer already claimed this frame.
    instance_cursor: u64,
}

/// Production backend: renders render lists with wgpu into the host window.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: SurfaceManager,

    texture_layout: wgpu::BindGroupLayout,
    point_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
    pipelines: PipelineCache,

    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,

    image_acquired: bool,
    pending_size: Option<(u32, u32)>,
    overlay: Option<Box<dyn UiOverlay>>,
}

impl WgpuBackend {
    /// Creates the device and swapchain for `window`.
    ///
    /// # Safety
    ///
    /// The native handles in `window` must stay valid until the backend is
    /// dropped.
    pub unsafe fn new(
        window: &NativeWindow,
        width: u32,
        height: u32,
        config: &KelpConfig,
        mut overlay: Option<Box<dyn UiOverlay>>,
    ) -> KelpResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let (raw_display_handle, raw_window_handle) = window.raw_handles();
        let surface = instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle,
            raw_window_handle,
        })?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(KelpError::NoAdapter)?;
        let info = adapter.get_info();
        tracing::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("kelp_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))?;
        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!("wgpu error: {}", err);
        }));

        let surface = SurfaceManager::new(surface, &adapter, &device, width, height, config)?;

        if let Some(overlay) = overlay.as_mut() {
            overlay
                .prepare(&device, &queue, surface.format())
                .map_err(KelpError::overlay)?;
            tracing::info!("ui overlay ready");
        }

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
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
            label: Some("texture_bind_group_layout"),
        });

        let point_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("point_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipelines = PipelineCache::new(&device, &texture_layout);

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("unit_quad_buffer"),
            contents: bytemuck::cast_slice(&QuadVertex::UNIT_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_buffer = Self::create_instance_buffer(
            &device,
            config
                .instance_capacity
                .max(1)
                .saturating_mul(std::mem::size_of::<GpuInstance>() as u64)
                .min(device.limits().max_buffer_size),
        );

        Ok(Self {
            device,
            queue,
            surface,
            texture_layout,
            point_sampler,
            linear_sampler,
            pipelines,
            quad_buffer,
            instance_buffer,
            image_acquired: false,
            pending_size: None,
            overlay,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface.format()
    }

    fn create_instance_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        tracing::debug!("instance buffer sized to {} bytes", size);
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn make_texture(&self, width: u32, height: u32, label: &str) -> WgpuTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = |sampler: &wgpu::Sampler, label: &str| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
                label: Some(label),
            })
        };
        let point_bind_group = bind_group(&self.point_sampler, "point_texture_bind_group");
        let linear_bind_group = bind_group(&self.linear_sampler, "linear_texture_bind_group");
        WgpuTexture {
            texture,
            view,
            point_bind_group,
            linear_bind_group,
        }
    }

    /// Claims `len` bytes of instance storage for this frame, growing the
    /// buffer when the frame has outrun it. Passes already recorded keep
    /// their reference to the old buffer.
    ///
    /// `len` never exceeds [`GpuBackend::max_instance_bytes`]; the engine
    /// rejects larger submissions before encoding.
    fn claim_instances(&mut self, cursor: &mut u64, len: u64) -> u64 {
        if *cursor + len > self.instance_buffer.size() {
            let size = (self.instance_buffer.size() * 2)
                .max(len)
                .next_power_of_two()
                .min(self.max_instance_bytes());
            self.instance_buffer = Self::create_instance_buffer(&self.device, size);
            *cursor = 0;
        }
        let offset = *cursor;
        *cursor += len;
        offset
    }

    fn apply_pending_size(&mut self) -> KelpResult<()> {
        if let Some((width, height)) = self.pending_size.take() {
            self.surface.resize(&self.device, width, height)?;
        }
        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    type Texture = WgpuTexture;
    type Frame = WgpuFrame;

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn max_instance_bytes(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> KelpResult<WgpuTexture> {
        check_texture_size(width, height, self.max_texture_dimension())?;
        let texture = self.make_texture(width, height, "kelp_texture");
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(texture)
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> KelpResult<WgpuTexture> {
        check_texture_size(width, height, self.max_texture_dimension())?;
        // wgpu zero-initialises the contents on first use
        Ok(self.make_texture(width, height, "kelp_render_target"))
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> KelpResult<()> {
        check_surface_size(width, height, self.max_texture_dimension())?;
        if self.image_acquired {
            // cannot reconfigure while an image is outstanding
            self.pending_size = Some((width, height));
            return Ok(());
        }
        self.surface.resize(&self.device, width, height)
    }

    fn acquire_frame(&mut self) -> KelpResult<WgpuFrame> {
        self.apply_pending_size()?;
        let (surface_texture, view) = self.surface.acquire()?;
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kelp_frame_encoder"),
            });
        self.image_acquired = true;
        Ok(WgpuFrame {
            surface_texture,
            view,
            encoder,
            instance_cursor: 0,
        })
    }

    fn encode(
        &mut self,
        frame: &mut WgpuFrame,
        list: &RenderList,
        textures: &ResourceTable<WgpuTexture>,
    ) -> KelpResult<()> {
        let WgpuFrame {
            view: swapchain_view,
            encoder,
            instance_cursor,
            ..
        } = frame;

        let (view, format) = if list.target.is_screen() {
            (&*swapchain_view, self.surface.format())
        } else {
            (&textures.get(list.target)?.texture.view, TEXTURE_FORMAT)
        };

        for draw in &list.draws {
            self.pipelines.prepare(&self.device, draw.blend_mode, format);
        }

        let bytes = list.instance_bytes();
        let len = bytes.len() as u64;
        let offset = self.claim_instances(instance_cursor, len);
        if len > 0 {
            self.queue.write_buffer(&self.instance_buffer, offset, bytes);
        }

        let load = match list.clear {
            Some(color) => wgpu::LoadOp::Clear(color.into()),
            None => wgpu::LoadOp::Load,
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kelp_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if list.draws.is_empty() {
            return Ok(());
        }
        render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(offset..offset + len));

        let mut bound = None;
        for draw in &list.draws {
            if bound != Some(draw.blend_mode) {
                render_pass.set_pipeline(self.pipelines.get(draw.blend_mode, format)?);
                bound = Some(draw.blend_mode);
            }
            let texture = &textures
                .get(draw.texture)
                .map_err(|_| KelpError::InvalidBindGroupId(draw.texture.raw()))?
                .texture;
            render_pass.set_bind_group(0, texture.bind_group(draw.smooth), &[]);
            render_pass.draw(0..4, draw.instances.clone());
        }
        Ok(())
    }

    fn present(&mut self, frame: WgpuFrame) -> KelpResult<()> {
        let WgpuFrame {
            surface_texture,
            view,
            mut encoder,
            ..
        } = frame;

        let overlay_result = match self.overlay.as_mut() {
            Some(overlay) => overlay.render(&self.device, &self.queue, &mut encoder, &view),
            None => Ok(()),
        };

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        self.image_acquired = false;
        self.apply_pending_size()?;

        overlay_result.map_err(KelpError::overlay)
    }
}
