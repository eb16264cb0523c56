use crate::backend::{rgba_len, GpuBackend};
use crate::batch::prepare_render_list;
use crate::error::{KelpError, KelpResult};
use crate::metrics::{FrameStats, MetricsCollector};
use crate::resources::{ResourceTable, TextureEntry};
use crate::types::{Camera, InstanceBatch, InstanceData, KelpColor, TextureId};

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialised,
    Ready,
    FrameOpen,
}

enum FrameSlot<F> {
    Idle,
    Open { frame: F, cleared: bool, instance_bytes: u64 },
}

struct Session<B: GpuBackend> {
    backend: B,
    frame: FrameSlot<B::Frame>,
    metrics: MetricsCollector,
}

/// The engine: a texture table plus, while initialised, a backend session.
///
/// The table outlives sessions. Uninitialise clears it instead of dropping
/// it, which keeps ids issued in one session from resolving in the next.
pub struct Kelp<B: GpuBackend> {
    textures: ResourceTable<B::Texture>,
    session: Option<Session<B>>,
}

impl<B: GpuBackend> Default for Kelp<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GpuBackend> Kelp<B> {
    pub fn new() -> Self {
        Self {
            textures: ResourceTable::new(),
            session: None,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.session {
            None => EngineState::Uninitialised,
            Some(Session { frame: FrameSlot::Idle, .. }) => EngineState::Ready,
            Some(Session { frame: FrameSlot::Open { .. }, .. }) => EngineState::FrameOpen,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a session with the backend produced by `create`. The factory
    /// only runs when no session is active.
    pub fn initialise(&mut self, create: impl FnOnce() -> KelpResult<B>) -> KelpResult<()> {
        if self.session.is_some() {
            return Err(KelpError::KelpAlreadyInitialised);
        }
        let backend = create()?;
        self.session = Some(Session {
            backend,
            frame: FrameSlot::Idle,
            metrics: MetricsCollector::new(),
        });
        tracing::info!("kelp initialised");
        Ok(())
    }

    /// Ends the session. Every texture is released and an open frame is
    /// discarded without presenting.
    pub fn uninitialise(&mut self) -> KelpResult<()> {
        let session = self.session.take().ok_or(KelpError::KelpNotInitialised)?;
        if matches!(session.frame, FrameSlot::Open { .. }) {
            tracing::warn!("discarding an open frame on uninitialise");
        }
        self.textures.clear();
        drop(session);
        tracing::info!("kelp uninitialised");
        Ok(())
    }

    pub fn create_texture_with_data(&mut self, width: u32, height: u32, data: &[u8]) -> KelpResult<TextureId> {
        let session = self.session.as_mut().ok_or(KelpError::KelpNotInitialised)?;
        let expected = rgba_len(width, height)
            .ok_or_else(|| KelpError::invalid_input(format!("texture size {width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(KelpError::invalid_input(format!(
                "{width}x{height} texture needs {expected} bytes, got {}",
                data.len()
            )));
        }
        let texture = session.backend.create_texture(width, height, data)?;
        Ok(self.textures.insert(texture, width, height))
    }

    pub fn create_render_target(&mut self, width: u32, height: u32) -> KelpResult<TextureId> {
        let session = self.session.as_mut().ok_or(KelpError::KelpNotInitialised)?;
        let texture = session.backend.create_render_target(width, height)?;
        Ok(self.textures.insert(texture, width, height))
    }

    pub fn destroy_texture(&mut self, id: TextureId) -> KelpResult<()> {
        if self.session.is_none() {
            return Err(KelpError::KelpNotInitialised);
        }
        self.textures.remove(id).map(drop)
    }

    pub fn texture(&self, id: TextureId) -> KelpResult<&TextureEntry<B::Texture>> {
        self.textures.get(id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) -> KelpResult<()> {
        let session = self.session.as_mut().ok_or(KelpError::KelpNotInitialised)?;
        session.backend.resize_surface(width, height).map_err(|err| {
            tracing::warn!("surface resize to {}x{} failed: {}", width, height, err);
            err
        })
    }

    /// Validates and draws one list, opening a frame first if none is open.
    ///
    /// Invalid input is rejected before a frame is acquired, so a failing
    /// call leaves the state exactly as it was.
    pub fn render_list(
        &mut self,
        target: TextureId,
        camera: &Camera,
        clear: KelpColor,
        instances: &[InstanceData],
        batches: &[InstanceBatch],
    ) -> KelpResult<()> {
        let session = self.session.as_mut().ok_or(KelpError::KelpNotInitialised)?;
        let mut list = prepare_render_list(&self.textures, target, camera, instances, batches)?;

        let used = match &session.frame {
            FrameSlot::Open { instance_bytes, .. } => *instance_bytes,
            FrameSlot::Idle => 0,
        };
        let len = list.instance_bytes().len() as u64;
        let limit = session.backend.max_instance_bytes();
        if used.saturating_add(len) > limit {
            return Err(KelpError::invalid_input(format!(
                "{len} instance bytes on top of {used} exceed the per-frame limit of {limit}"
            )));
        }

        if let FrameSlot::Idle = session.frame {
            let frame = session.backend.acquire_frame()?;
            session.metrics.begin_frame();
            session.frame = FrameSlot::Open {
                frame,
                cleared: false,
                instance_bytes: 0,
            };
            tracing::debug!("frame {} opened", session.metrics.current().frame_index);
        }
        let FrameSlot::Open {
            frame,
            cleared,
            instance_bytes,
        } = &mut session.frame
        else {
            return Err(KelpError::NoCurrentFrame);
        };

        if !*cleared {
            list.clear = Some(clear);
        }
        session.backend.encode(frame, &list, &self.textures)?;
        *cleared = true;
        *instance_bytes += len;
        session.metrics.record_render_list(&list);
        Ok(())
    }

    /// Submits and presents the open frame. The frame is consumed even when
    /// presenting fails.
    pub fn present_frame(&mut self) -> KelpResult<()> {
        let session = self.session.as_mut().ok_or(KelpError::KelpNotInitialised)?;
        let FrameSlot::Open { frame, .. } = std::mem::replace(&mut session.frame, FrameSlot::Idle) else {
            return Err(KelpError::NoCurrentFrame);
        };
        let result = session.backend.present(frame);
        session.metrics.end_frame();
        result
    }

    pub fn last_frame_stats(&self) -> Option<FrameStats> {
        self.session.as_ref()?.metrics.last_frame().copied()
    }

    pub fn backend(&self) -> Option<&B> {
        self.session.as_ref().map(|s| &s.backend)
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.session.as_mut().map(|s| &mut s.backend)
    }
}
