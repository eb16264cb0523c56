use crate::batch::RenderList;
use crate::error::{KelpError, KelpResult};
use crate::resources::ResourceTable;

/// Everything the frame state machine needs from a GPU.
///
/// A backend owns the device and the presentation surface; textures it
/// creates are stored in the engine's [`ResourceTable`] and handed back when a
/// render list is encoded.
pub trait GpuBackend {
    type Texture;
    /// An acquired swapchain image plus whatever is being recorded into it.
    type Frame;

    fn max_texture_dimension(&self) -> u32;

    /// Upper bound on packed instance bytes across all render lists of one
    /// frame. Submissions beyond it are rejected before anything is encoded.
    fn max_instance_bytes(&self) -> u64;

    /// Uploads tightly packed RGBA8 pixels. The texture must be usable by the
    /// next call that references it.
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> KelpResult<Self::Texture>;

    fn create_render_target(&mut self, width: u32, height: u32) -> KelpResult<Self::Texture>;

    fn resize_surface(&mut self, width: u32, height: u32) -> KelpResult<()>;

    fn acquire_frame(&mut self) -> KelpResult<Self::Frame>;

    fn encode(
        &mut self,
        frame: &mut Self::Frame,
        list: &RenderList,
        textures: &ResourceTable<Self::Texture>,
    ) -> KelpResult<()>;

    /// Submits recorded work, draws the overlay if any, and presents.
    fn present(&mut self, frame: Self::Frame) -> KelpResult<()>;
}

/// Size rules shared by every texture a backend creates.
pub fn check_texture_size(width: u32, height: u32, max_dimension: u32) -> KelpResult<()> {
    if width == 0 || height == 0 {
        return Err(KelpError::invalid_input(format!(
            "texture size {width}x{height} is empty"
        )));
    }
    if width > max_dimension || height > max_dimension {
        return Err(KelpError::invalid_input(format!(
            "texture size {width}x{height} exceeds device limit {max_dimension}"
        )));
    }
    Ok(())
}

/// Surfaces are never configured to a degenerate or oversized extent; the
/// request fails and the current configuration stays in place.
pub fn check_surface_size(width: u32, height: u32, max_dimension: u32) -> KelpResult<()> {
    if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
        return Err(KelpError::InvalidSurfaceSize { width, height });
    }
    Ok(())
}

/// Byte length of a tightly packed RGBA8 image, or `None` on overflow.
pub fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(crate::BYTES_PER_PIXEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_sizes() {
        assert!(check_surface_size(800, 600, 8192).is_ok());
        assert!(matches!(
            check_surface_size(0, 0, 8192),
            Err(KelpError::InvalidSurfaceSize { width: 0, height: 0 })
        ));
        assert!(check_surface_size(800, 0, 8192).is_err());
        assert!(check_surface_size(8193, 10, 8192).is_err());
    }

    #[test]
    fn texture_sizes() {
        assert!(check_texture_size(2, 2, 16).is_ok());
        assert!(matches!(check_texture_size(0, 2, 16), Err(KelpError::InvalidInput(_))));
        assert!(matches!(check_texture_size(2, 17, 16), Err(KelpError::InvalidInput(_))));
    }

    #[test]
    fn rgba_len_checks_overflow() {
        assert_eq!(rgba_len(2, 2), Some(16));
        assert_eq!(rgba_len(0, 5), Some(0));
        assert_eq!(rgba_len(u32::MAX, u32::MAX), None);
    }
}
