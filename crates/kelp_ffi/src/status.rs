use kelp_core::KelpError;

/// Status returned by every entry point. Zero is success.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FFIError {
    Success = 0,
    Null = 1,
    Panic = 2,
    InvalidInput = 3,

    NoCurrentFrame = 100,
    SwapchainError = 101,
    InvalidTextureId = 102,
    InvalidBindGroupId = 103,
    InvalidPipelineId = 104,
    NoAdapter = 105,
    NoDevice = 106,
    NoImgui = 107,
    ImguiError = 108,

    KelpAlreadyInitialised = 200,
    KelpNotInitialised = 201,
}

impl FFIError {
    pub fn is_success(self) -> bool {
        self == FFIError::Success
    }
}

impl From<&KelpError> for FFIError {
    fn from(err: &KelpError) -> Self {
        match err {
            KelpError::Null(_) => FFIError::Null,
            KelpError::InvalidInput(_) => FFIError::InvalidInput,
            KelpError::KelpAlreadyInitialised => FFIError::KelpAlreadyInitialised,
            KelpError::KelpNotInitialised => FFIError::KelpNotInitialised,
            KelpError::NoCurrentFrame => FFIError::NoCurrentFrame,
            KelpError::SwapchainError(_)
            | KelpError::SurfaceCreation(_)
            | KelpError::InvalidSurfaceSize { .. } => FFIError::SwapchainError,
            KelpError::InvalidTextureId(_) => FFIError::InvalidTextureId,
            KelpError::InvalidBindGroupId(_) => FFIError::InvalidBindGroupId,
            KelpError::InvalidPipelineId(_) => FFIError::InvalidPipelineId,
            KelpError::NoAdapter => FFIError::NoAdapter,
            KelpError::NoDevice(_) => FFIError::NoDevice,
            KelpError::NoImgui => FFIError::NoImgui,
            KelpError::ImguiError(_) => FFIError::ImguiError,
        }
    }
}
