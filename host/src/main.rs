mod clock;
mod scene;

use std::ptr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use kelp_core::{Camera, InstanceBatch, InstanceData, KelpColor, TextureId, WindowInfo};
use kelp_ffi::{FFIError, Slice};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::clock::FixedTimeStep;
use crate::scene::Scene;

const SPRITE_COUNT: usize = 2_000;
const CLEAR: KelpColor = KelpColor {
    r: 0.05,
    g: 0.06,
    b: 0.09,
    a: 1.0,
};

fn check(status: FFIError, call: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        bail!("{call} returned {status:?} ({})", status as i32)
    }
}

struct Demo {
    window: Option<Arc<Window>>,
    size: PhysicalSize<u32>,
    texture: TextureId,
    scene: Scene,
    clock: FixedTimeStep,
    instances: Vec<InstanceData>,
    batches: Vec<InstanceBatch>,
    frames: u64,
}

impl Demo {
    fn new() -> Self {
        let size = PhysicalSize::new(1024, 768);
        Self {
            window: None,
            size,
            texture: TextureId::SCREEN,
            scene: Scene::new(SPRITE_COUNT, size.width as f32, size.height as f32),
            clock: FixedTimeStep::new(),
            instances: Vec::with_capacity(SPRITE_COUNT),
            batches: Vec::with_capacity(2),
            frames: 0,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = WindowAttributes::default()
            .with_title("Kelp sprites")
            .with_inner_size(self.size);
        let window = Arc::new(event_loop.create_window(attributes).context("creating window")?);
        self.size = window.inner_size();

        let info = WindowInfo::from_raw_handles(
            window.window_handle().context("window handle")?.as_raw(),
            window.display_handle().context("display handle")?.as_raw(),
            self.size.width,
            self.size.height,
        )?;
        // SAFETY: the window is kept alive in `self.window` until uninitialise.
        check(unsafe { kelp_ffi::initialise(info, ptr::null_mut()) }, "initialise")?;
        self.window = Some(window);

        let image = scene::checkerboard(64, 8);
        let mut id = 0;
        check(
            unsafe {
                kelp_ffi::create_texture_with_data(image.width(), image.height(), Slice::from_slice(image.as_raw()), &mut id)
            },
            "create_texture_with_data",
        )?;
        self.texture = TextureId::from_raw(id);
        self.scene.resize(self.size.width as f32, self.size.height as f32);
        tracing::info!("demo started with {} sprites", self.scene.len());
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.scene.resize(size.width as f32, size.height as f32);
        let status = kelp_ffi::set_surface_size(size.width, size.height);
        if !status.is_success() {
            tracing::warn!("resize to {}x{} returned {:?}", size.width, size.height, status);
        }
    }

    fn draw(&mut self) -> Result<()> {
        let scene = &mut self.scene;
        self.clock.tick(|dt| scene.update(dt as f32));
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(());
        }

        self.scene.build(self.texture, &mut self.instances, &mut self.batches);
        let camera = Camera::new(0.0, 0.0, self.size.width as f32, self.size.height as f32, 0.0, 1.0);
        let status = unsafe {
            kelp_ffi::render_list(
                TextureId::SCREEN.raw(),
                camera,
                &CLEAR,
                Slice::from_slice(&self.instances),
                Slice::from_slice(&self.batches),
            )
        };
        match status {
            FFIError::Success => {}
            FFIError::SwapchainError => {
                // lost or outdated surface: reconfigure and try again next frame
                tracing::warn!("swapchain unavailable, reconfiguring");
                self.resize(self.size);
                return Ok(());
            }
            other => check(other, "render_list")?,
        }

        match kelp_ffi::present_frame() {
            FFIError::SwapchainError => self.resize(self.size),
            other => check(other, "present_frame")?,
        }

        self.frames += 1;
        if self.frames % 600 == 0 {
            tracing::info!("{} frames presented, {:.1}s simulated", self.frames, self.clock.elapsed());
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.window.take().is_some() {
            let status = kelp_ffi::uninitialise();
            if !status.is_success() {
                tracing::warn!("uninitialise returned {:?}", status);
            }
        }
    }
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            tracing::error!("failed to start: {:#}", err);
            self.shutdown();
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.draw() {
                    tracing::error!("{:#}", err);
                    self.shutdown();
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut demo = Demo::new();
    event_loop.run_app(&mut demo).context("running event loop")?;
    demo.shutdown();
    Ok(())
}
