use thiserror::Error;

/// Every failure the engine can report. The C boundary maps each variant
/// onto one flat status code.
#[derive(Debug, Error)]
pub enum KelpError {
    #[error("a required pointer was null: {0}")]
    Null(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("kelp is already initialised")]
    KelpAlreadyInitialised,
    #[error("kelp is not initialised")]
    KelpNotInitialised,
    #[error("no frame is currently open")]
    NoCurrentFrame,
    #[error("swapchain error: {0}")]
    SwapchainError(#[from] wgpu::SurfaceError),
    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    #[error("surface size {width}x{height} rejected")]
    InvalidSurfaceSize { width: u32, height: u32 },
    #[error("unknown texture id {0:#x}")]
    InvalidTextureId(u64),
    #[error("no bind group for texture {0:#x}")]
    InvalidBindGroupId(u64),
    #[error("no pipeline for blend mode {0}")]
    InvalidPipelineId(&'static str),
    #[error("no compatible gpu adapter found")]
    NoAdapter,
    #[error("failed to request device: {0}")]
    NoDevice(#[from] wgpu::RequestDeviceError),
    #[error("ui overlay is not available")]
    NoImgui,
    #[error("ui overlay error: {0}")]
    ImguiError(String),
}

impl KelpError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn overlay(err: anyhow::Error) -> Self {
        Self::ImguiError(format!("{err:#}"))
    }
}

pub type KelpResult<T> = Result<T, KelpError>;
