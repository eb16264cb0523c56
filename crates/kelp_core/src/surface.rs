use crate::backend::check_surface_size;
use crate::config::KelpConfig;
use crate::error::KelpResult;

/// Owns the swapchain bound to the host window.
///
/// Acquisition failures are reported, never retried: the caller resizes and
/// tries again on its next frame.
pub struct SurfaceManager {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl SurfaceManager {
    pub fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        width: u32,
        height: u32,
        settings: &KelpConfig,
    ) -> KelpResult<Self> {
        check_surface_size(width, height, device.limits().max_texture_dimension_2d)?;

        let caps = surface.get_capabilities(adapter);
        let format = choose_surface_format(&caps, settings.prefer_srgb)
            .ok_or(crate::KelpError::NoAdapter)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: choose_present_mode(&caps, settings.present_mode),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: settings.max_frame_latency,
        };
        surface.configure(device, &config);
        tracing::info!(
            "surface configured: {}x{} {:?} {:?}",
            width,
            height,
            config.format,
            config.present_mode
        );

        Ok(Self { surface, config })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the swapchain. A rejected size leaves the current
    /// configuration untouched.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> KelpResult<()> {
        check_surface_size(width, height, device.limits().max_texture_dimension_2d)?;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
        tracing::debug!("surface resized to {}x{}", width, height);
        Ok(())
    }

    pub fn acquire(&self) -> KelpResult<(wgpu::SurfaceTexture, wgpu::TextureView)> {
        let output = self.surface.get_current_texture().map_err(|err| {
            tracing::warn!("failed to acquire swapchain image: {}", err);
            err
        })?;
        if output.suboptimal {
            tracing::debug!("swapchain image is suboptimal");
        }
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok((output, view))
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        if let Some(format) = caps.formats.iter().find(|f| f.is_srgb()) {
            return Some(*format);
        }
    }
    caps.formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| caps.formats.first())
        .copied()
}

pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    match requested {
        wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync => requested,
        mode if caps.present_modes.contains(&mode) => mode,
        _ => wgpu::PresentMode::Fifo,
    }
}
