/// Immediate-mode UI drawn over the finished frame.
///
/// The overlay shares the engine's device. `prepare` runs once during
/// initialise; a failure there fails the whole initialise.
///
/// This is an integration point for Rust callers of [`WgpuBackend::new`].
/// The C entry points never install one, and the crate ships no
/// implementation. [`HeadlessBackend::with_overlay`] mirrors the same
/// setup and per-frame failure paths without a device.
///
/// [`WgpuBackend::new`]: crate::renderer::WgpuBackend::new
/// [`HeadlessBackend::with_overlay`]: crate::headless::HeadlessBackend::with_overlay
pub trait UiOverlay: Send {
    fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> anyhow::Result<()>;

    /// Records overlay draws into `encoder`, loading (not clearing) `view`.
    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        prepared: Option<wgpu::TextureFormat>,
        frames: u32,
    }

    impl UiOverlay for Counter {
        fn prepare(
            &mut self,
            _device: &wgpu::Device,
            _queue: &wgpu::Queue,
            format: wgpu::TextureFormat,
        ) -> anyhow::Result<()> {
            self.prepared = Some(format);
            Ok(())
        }

        fn render(
            &mut self,
            _device: &wgpu::Device,
            _queue: &wgpu::Queue,
            _encoder: &mut wgpu::CommandEncoder,
            _view: &wgpu::TextureView,
        ) -> anyhow::Result<()> {
            anyhow::ensure!(self.prepared.is_some(), "render before prepare");
            self.frames += 1;
            Ok(())
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn overlays_box_into_the_backend_slot() {
        let overlay: Option<Box<dyn UiOverlay>> = Some(Box::new(Counter::default()));
        assert_send(&overlay);
        assert!(overlay.is_some());
    }
}
