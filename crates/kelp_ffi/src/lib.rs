//! C entry points for the Kelp renderer.
//!
//! Every function returns an [`FFIError`] status and never unwinds. Calls are
//! serialised on one process-wide engine.

mod slice;
mod status;

use std::any::Any;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use kelp_core::{
    Camera, InstanceBatch, InstanceData, Kelp, KelpColor, KelpConfig, KelpError, KelpResult, TextureId, WgpuBackend,
    WindowInfo,
};
use tracing_subscriber::EnvFilter;

pub use slice::Slice;
pub use status::FFIError;

static KELP: Mutex<Option<Kelp<WgpuBackend>>> = Mutex::new(None);

/// Runs `op` against the engine, turning errors and panics into a status.
fn with_kelp(name: &str, op: impl FnOnce(&mut Kelp<WgpuBackend>) -> KelpResult<()>) -> FFIError {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut guard = KELP.lock().unwrap_or_else(PoisonError::into_inner);
        op(guard.get_or_insert_with(Kelp::new))
    }));
    match outcome {
        Ok(Ok(())) => FFIError::Success,
        Ok(Err(err)) => {
            tracing::warn!("{} failed: {}", name, err);
            FFIError::from(&err)
        }
        Err(payload) => {
            tracing::error!("{} panicked: {}", name, panic_message(payload.as_ref()));
            FFIError::Panic
        }
    }
}

/// [`with_kelp`] for every entry point but `initialise`: a missing session
/// is reported before any argument is looked at.
fn with_session(name: &str, op: impl FnOnce(&mut Kelp<WgpuBackend>) -> KelpResult<()>) -> FFIError {
    with_kelp(name, |kelp| {
        if !kelp.is_initialised() {
            return Err(KelpError::KelpNotInitialised);
        }
        op(kelp)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("KELP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // a subscriber installed by the host takes precedence
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Creates the device and swapchain for `window`.
///
/// `ui_config` must be null; no overlay integration is built into this
/// library.
///
/// # Safety
///
/// The handles in `window` must describe a live native window that outlives
/// the session.
#[no_mangle]
pub unsafe extern "C" fn initialise(window: WindowInfo, ui_config: *mut c_void) -> FFIError {
    init_logging();
    with_kelp("initialise", |kelp| {
        kelp.initialise(|| {
            if !ui_config.is_null() {
                return Err(KelpError::NoImgui);
            }
            let native = window.native()?;
            let config = KelpConfig::from_env();
            tracing::debug!("initialising with {:?}", config);
            // SAFETY: the caller keeps the window alive for the session.
            unsafe { WgpuBackend::new(&native, window.width, window.height, &config, None) }
        })
    })
}

/// Uploads RGBA8 pixels and writes the new texture id to `out_texture`.
///
/// # Safety
///
/// `data` must describe readable memory and `out_texture` must be null or
/// writable.
#[no_mangle]
pub unsafe extern "C" fn create_texture_with_data(
    width: u32,
    height: u32,
    data: Slice<u8>,
    out_texture: *mut u64,
) -> FFIError {
    with_session("create_texture_with_data", |kelp| {
        if out_texture.is_null() {
            return Err(KelpError::Null("out_texture"));
        }
        let bytes = unsafe { data.as_slice() }?;
        let id = kelp.create_texture_with_data(width, height, bytes)?;
        unsafe { out_texture.write(id.raw()) };
        Ok(())
    })
}

/// Creates an empty texture that can be both a render target and a source.
///
/// # Safety
///
/// `out_texture` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn create_render_target(width: u32, height: u32, out_texture: *mut u64) -> FFIError {
    with_session("create_render_target", |kelp| {
        if out_texture.is_null() {
            return Err(KelpError::Null("out_texture"));
        }
        let id = kelp.create_render_target(width, height)?;
        unsafe { out_texture.write(id.raw()) };
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn destroy_texture(texture: u64) -> FFIError {
    with_session("destroy_texture", |kelp| {
        kelp.destroy_texture(TextureId::from_raw(texture))
    })
}

/// Draws `batches` into `target` (`0` for the screen), opening a frame first
/// if needed.
///
/// # Safety
///
/// `clear` must be null or readable; both slices must describe readable
/// memory.
#[no_mangle]
pub unsafe extern "C" fn render_list(
    target: u64,
    camera: Camera,
    clear: *const KelpColor,
    instances: Slice<InstanceData>,
    batches: Slice<InstanceBatch>,
) -> FFIError {
    with_session("render_list", |kelp| {
        let clear = unsafe { clear.as_ref() }.ok_or(KelpError::Null("clear"))?;
        let instances = unsafe { instances.as_slice() }?;
        let batches = unsafe { batches.as_slice() }?;
        kelp.render_list(TextureId::from_raw(target), &camera, *clear, instances, batches)
    })
}

#[no_mangle]
pub extern "C" fn present_frame() -> FFIError {
    with_session("present_frame", Kelp::present_frame)
}

#[no_mangle]
pub extern "C" fn set_surface_size(width: u32, height: u32) -> FFIError {
    with_session("set_surface_size", |kelp| kelp.set_surface_size(width, height))
}

#[no_mangle]
pub extern "C" fn uninitialise() -> FFIError {
    with_session("uninitialise", Kelp::uninitialise)
}
