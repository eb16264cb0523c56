//! Entry points that can be exercised without a window. Nothing here
//! initialises the engine, so every test sees the same uninitialised
//! singleton regardless of ordering.

use std::ptr;

use kelp_core::{BlendMode, Camera, InstanceBatch, InstanceData, KelpColor, TextureId, WindowInfo, WindowType};
use kelp_ffi::{FFIError, Slice};
use proptest::prelude::*;

fn camera() -> Camera {
    Camera::new(0.0, 0.0, 800.0, 600.0, 0.0, 1.0)
}

#[test]
fn status_values_are_stable() {
    let expected = [
        (FFIError::Success, 0),
        (FFIError::Null, 1),
        (FFIError::Panic, 2),
        (FFIError::InvalidInput, 3),
        (FFIError::NoCurrentFrame, 100),
        (FFIError::SwapchainError, 101),
        (FFIError::InvalidTextureId, 102),
        (FFIError::InvalidBindGroupId, 103),
        (FFIError::InvalidPipelineId, 104),
        (FFIError::NoAdapter, 105),
        (FFIError::NoDevice, 106),
        (FFIError::NoImgui, 107),
        (FFIError::ImguiError, 108),
        (FFIError::KelpAlreadyInitialised, 200),
        (FFIError::KelpNotInitialised, 201),
    ];
    for (status, value) in expected {
        assert_eq!(status as i32, value, "{status:?}");
    }
}

#[test]
fn calls_before_initialise_are_protocol_errors() {
    assert_eq!(kelp_ffi::present_frame(), FFIError::KelpNotInitialised);
    assert_eq!(kelp_ffi::uninitialise(), FFIError::KelpNotInitialised);
    assert_eq!(kelp_ffi::set_surface_size(640, 480), FFIError::KelpNotInitialised);
    assert_eq!(kelp_ffi::destroy_texture(1), FFIError::KelpNotInitialised);

    let pixels = [0u8; 16];
    let mut id = u64::MAX;
    let status = unsafe { kelp_ffi::create_texture_with_data(2, 2, Slice::from_slice(&pixels), &mut id) };
    assert_eq!(status, FFIError::KelpNotInitialised);
    assert_eq!(id, u64::MAX, "output is only written on success");

    let status = unsafe { kelp_ffi::create_render_target(8, 8, &mut id) };
    assert_eq!(status, FFIError::KelpNotInitialised);

    let clear = KelpColor::BLACK;
    let status = unsafe {
        kelp_ffi::render_list(
            TextureId::SCREEN.raw(),
            camera(),
            &clear,
            Slice::empty(),
            Slice::empty(),
        )
    };
    assert_eq!(status, FFIError::KelpNotInitialised);
}

#[test]
fn session_is_checked_before_arguments() {
    // null outputs, null clear colours and malformed slices would each be
    // rejected on their own; without a session none of them is looked at
    let pixels = [0u8; 4];
    let status = unsafe { kelp_ffi::create_texture_with_data(1, 1, Slice::from_slice(&pixels), ptr::null_mut()) };
    assert_eq!(status, FFIError::KelpNotInitialised);
    assert_eq!(
        unsafe { kelp_ffi::create_render_target(1, 1, ptr::null_mut()) },
        FFIError::KelpNotInitialised
    );

    let status = unsafe { kelp_ffi::render_list(0, camera(), ptr::null(), Slice::empty(), Slice::empty()) };
    assert_eq!(status, FFIError::KelpNotInitialised);

    let clear = KelpColor::BLACK;
    let dangling = Slice::<InstanceData> {
        data: ptr::null(),
        len: 3,
    };
    let status = unsafe { kelp_ffi::render_list(0, camera(), &clear, dangling, Slice::empty()) };
    assert_eq!(status, FFIError::KelpNotInitialised);

    let misaligned = Slice::<InstanceData> {
        data: 1 as *const InstanceData,
        len: 1,
    };
    let status = unsafe { kelp_ffi::render_list(0, camera(), &clear, misaligned, Slice::empty()) };
    assert_eq!(status, FFIError::KelpNotInitialised);

    let huge = Slice::<InstanceBatch> {
        data: ptr::NonNull::dangling().as_ptr(),
        len: u64::MAX,
    };
    let status = unsafe { kelp_ffi::render_list(0, camera(), &clear, Slice::empty(), huge) };
    assert_eq!(status, FFIError::KelpNotInitialised);
}

#[test]
fn initialise_rejects_null_window_and_ui_config() {
    let window = WindowInfo {
        window_type: WindowType::Xlib as u32,
        window_handle: ptr::null_mut(),
        second_handle: ptr::null_mut(),
        width: 800,
        height: 600,
    };
    assert_eq!(unsafe { kelp_ffi::initialise(window, ptr::null_mut()) }, FFIError::Null);

    let mut ui_config = 0u8;
    let status = unsafe { kelp_ffi::initialise(window, (&mut ui_config as *mut u8).cast()) };
    assert_eq!(status, FFIError::NoImgui);

    let unknown = WindowInfo {
        window_type: 42,
        window_handle: 0x1000 as *mut _,
        ..window
    };
    assert_eq!(unsafe { kelp_ffi::initialise(unknown, ptr::null_mut()) }, FFIError::InvalidInput);

    // none of the above left a session behind
    assert_eq!(kelp_ffi::present_frame(), FFIError::KelpNotInitialised);
}

proptest! {
    #[test]
    fn valid_arguments_still_need_a_session(
        count in 0u32..16,
        smooth in any::<bool>(),
        blend in prop::sample::select(BlendMode::ALL.to_vec()),
    ) {
        let instances = vec![InstanceData::default(); count as usize];
        let batches = [InstanceBatch::new(TextureId::from_raw(1), smooth, blend, count)];
        let clear = KelpColor::BLACK;
        let status = unsafe {
            kelp_ffi::render_list(
                0,
                camera(),
                &clear,
                Slice::from_slice(&instances),
                Slice::from_slice(&batches),
            )
        };
        prop_assert_eq!(status, FFIError::KelpNotInitialised);
    }
}
