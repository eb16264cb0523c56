//! Instanced 2D sprite renderer driven through flat, C-compatible data.

pub mod backend;
pub mod batch;
pub mod config;
pub mod error;
pub mod headless;
pub mod kelp;
pub mod metrics;
pub mod overlay;
pub mod pipeline;
pub mod renderer;
pub mod resources;
pub mod surface;
pub mod types;
pub mod window;

/// Bytes per pixel of the fixed RGBA8 texture format.
pub const BYTES_PER_PIXEL: usize = 4;

pub use wgpu;

pub use backend::GpuBackend;
pub use batch::{DrawCall, RenderList};
pub use config::KelpConfig;
pub use error::{KelpError, KelpResult};
pub use kelp::{EngineState, Kelp};
pub use metrics::FrameStats;
pub use renderer::WgpuBackend;
pub use types::{BlendMode, Camera, InstanceBatch, InstanceData, KelpColor, TextureId, Transform};
pub use window::{NativeWindow, WindowInfo, WindowType};
