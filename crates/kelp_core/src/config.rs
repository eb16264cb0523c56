/// Knobs for device and surface creation.
#[derive(Debug, Clone)]
pub struct KelpConfig {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub present_mode: wgpu::PresentMode,
    /// Pick an sRGB swapchain format when the surface offers one.
    pub prefer_srgb: bool,
    pub max_frame_latency: u32,
    /// Initial size of the per-frame instance buffer, in instances.
    pub instance_capacity: u64,
}

impl Default for KelpConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::PRIMARY,
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::Fifo,
            prefer_srgb: false,
            max_frame_latency: 2,
            instance_capacity: 16_384,
        }
    }
}

impl KelpConfig {
    /// Defaults overridden by `WGPU_BACKEND`, `WGPU_POWER_PREF` and
    /// `KELP_VSYNC=0`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(backends) = wgpu::util::backend_bits_from_env() {
            config.backends = backends;
        }
        if let Some(power) = wgpu::util::power_preference_from_env() {
            config.power_preference = power;
        }
        if let Ok(vsync) = std::env::var("KELP_VSYNC") {
            config.apply_vsync(&vsync);
        }
        config
    }

    fn apply_vsync(&mut self, value: &str) {
        match value.trim() {
            "0" | "false" | "off" => self.present_mode = wgpu::PresentMode::AutoNoVsync,
            "1" | "true" | "on" => self.present_mode = wgpu::PresentMode::Fifo,
            other => tracing::warn!("ignoring KELP_VSYNC={other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_values() {
        let mut config = KelpConfig::default();
        config.apply_vsync("0");
        assert_eq!(config.present_mode, wgpu::PresentMode::AutoNoVsync);
        config.apply_vsync("maybe");
        assert_eq!(config.present_mode, wgpu::PresentMode::AutoNoVsync);
        config.apply_vsync(" on ");
        assert_eq!(config.present_mode, wgpu::PresentMode::Fifo);
    }
}
