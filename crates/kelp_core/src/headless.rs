use std::collections::VecDeque;

use crate::backend::{check_surface_size, check_texture_size, GpuBackend};
use crate::batch::RenderList;
use crate::error::{KelpError, KelpResult};
use crate::resources::ResourceTable;

const MAX_DIMENSION: u32 = 8192;
// wgpu's default max_buffer_size
const DEFAULT_INSTANCE_BYTES: u64 = 256 << 20;

/// CPU-side texture kept by [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Everything encoded between acquisition and present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessFrame {
    pub index: u64,
    pub surface_size: (u32, u32),
    pub lists: Vec<RenderList>,
    pub overlay_drawn: bool,
}

impl HeadlessFrame {
    pub fn draw_calls(&self) -> usize {
        self.lists.iter().map(|l| l.draws.len()).sum()
    }
}

/// A failure to inject into the next matching backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Acquire(wgpu::SurfaceError),
    Overlay,
}

/// Backend without a GPU. Keeps pixels in memory and records every render
/// list it is asked to encode, so frame sequencing and draw output can be
/// inspected directly.
///
/// Like the swapchain, the surface cannot be reconfigured while an image is
/// acquired: a resize in that window is held until the frame is presented.
#[derive(Debug)]
pub struct HeadlessBackend {
    surface_size: (u32, u32),
    pending_size: Option<(u32, u32)>,
    image_acquired: bool,
    max_instance_bytes: u64,
    frames_acquired: u64,
    presented: Vec<HeadlessFrame>,
    overlay: bool,
    faults: VecDeque<Fault>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> KelpResult<Self> {
        check_surface_size(width, height, MAX_DIMENSION)?;
        Ok(Self {
            surface_size: (width, height),
            pending_size: None,
            image_acquired: false,
            max_instance_bytes: DEFAULT_INSTANCE_BYTES,
            frames_acquired: 0,
            presented: Vec::new(),
            overlay: false,
            faults: VecDeque::new(),
        })
    }

    /// Runs an overlay setup step the way the wgpu backend would.
    pub fn with_overlay(mut self, setup: impl FnOnce() -> anyhow::Result<()>) -> KelpResult<Self> {
        setup().map_err(KelpError::overlay)?;
        self.overlay = true;
        Ok(self)
    }

    /// Caps the instance bytes a single frame may carry.
    pub fn with_instance_limit(mut self, bytes: u64) -> Self {
        self.max_instance_bytes = bytes;
        self
    }

    pub fn inject(&mut self, fault: Fault) {
        self.faults.push_back(fault);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    /// Size requested while a frame was open, applied once it is presented.
    pub fn pending_size(&self) -> Option<(u32, u32)> {
        self.pending_size
    }

    pub fn presented(&self) -> &[HeadlessFrame] {
        &self.presented
    }

    pub fn last_presented(&self) -> Option<&HeadlessFrame> {
        self.presented.last()
    }

    pub fn frames_acquired(&self) -> u64 {
        self.frames_acquired
    }

    fn apply_pending_size(&mut self) {
        if let Some(size) = self.pending_size.take() {
            self.surface_size = size;
        }
    }

    fn take_fault(&mut self, matches: impl Fn(&Fault) -> bool) -> Option<Fault> {
        let index = self.faults.iter().position(matches)?;
        self.faults.remove(index)
    }
}

impl GpuBackend for HeadlessBackend {
    type Texture = HeadlessTexture;
    type Frame = HeadlessFrame;

    fn max_texture_dimension(&self) -> u32 {
        MAX_DIMENSION
    }

    fn max_instance_bytes(&self) -> u64 {
        self.max_instance_bytes
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> KelpResult<HeadlessTexture> {
        check_texture_size(width, height, MAX_DIMENSION)?;
        Ok(HeadlessTexture {
            width,
            height,
            pixels: rgba.to_vec(),
        })
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> KelpResult<HeadlessTexture> {
        check_texture_size(width, height, MAX_DIMENSION)?;
        let len = crate::backend::rgba_len(width, height)
            .ok_or_else(|| KelpError::invalid_input("render target too large"))?;
        Ok(HeadlessTexture {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> KelpResult<()> {
        check_surface_size(width, height, MAX_DIMENSION)?;
        if self.image_acquired {
            self.pending_size = Some((width, height));
        } else {
            self.surface_size = (width, height);
        }
        Ok(())
    }

    fn acquire_frame(&mut self) -> KelpResult<HeadlessFrame> {
        self.apply_pending_size();
        if let Some(Fault::Acquire(err)) = self.take_fault(|f| matches!(f, Fault::Acquire(_))) {
            return Err(err.into());
        }
        let frame = HeadlessFrame {
            index: self.frames_acquired,
            surface_size: self.surface_size,
            ..HeadlessFrame::default()
        };
        self.frames_acquired += 1;
        self.image_acquired = true;
        Ok(frame)
    }

    fn encode(
        &mut self,
        frame: &mut HeadlessFrame,
        list: &RenderList,
        textures: &ResourceTable<HeadlessTexture>,
    ) -> KelpResult<()> {
        if !list.target.is_screen() {
            textures.get(list.target)?;
        }
        for draw in &list.draws {
            textures
                .get(draw.texture)
                .map_err(|_| KelpError::InvalidBindGroupId(draw.texture.raw()))?;
        }
        frame.lists.push(list.clone());
        Ok(())
    }

    fn present(&mut self, mut frame: HeadlessFrame) -> KelpResult<()> {
        let overlay_fault = self.take_fault(|f| *f == Fault::Overlay).is_some();
        frame.overlay_drawn = self.overlay && !overlay_fault;
        self.presented.push(frame);
        self.image_acquired = false;
        self.apply_pending_size();
        if overlay_fault {
            return Err(KelpError::ImguiError("injected overlay fault".into()));
        }
        Ok(())
    }
}
