use kelp_core::headless::HeadlessBackend;
use kelp_core::{
    BlendMode, Camera, EngineState, InstanceBatch, InstanceData, Kelp, KelpColor, TextureId, Transform,
    WindowInfo, WindowType,
};

#[test]
fn single_sprite_frame() {
    let window = WindowInfo {
        window_type: WindowType::Win32 as u32,
        window_handle: 0x10 as *mut std::ffi::c_void,
        second_handle: std::ptr::null_mut(),
        width: 800,
        height: 600,
    };
    let native = window.native().unwrap();
    assert_eq!(native.window_type(), WindowType::Win32);

    let mut kelp = Kelp::new();
    kelp.initialise(|| HeadlessBackend::new(window.width, window.height))
        .unwrap();

    let pixels: [u8; 16] = [
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 255, 255, 255, 255,
    ];
    let texture = kelp.create_texture_with_data(2, 2, &pixels).unwrap();
    assert_eq!(kelp.texture(texture).unwrap().texture.pixels, pixels.to_vec());

    let camera = Camera::new(0.0, 0.0, 800.0, 600.0, 0.0, 1.0);
    let clear = KelpColor::new(0.0, 0.0, 0.0, 1.0);
    let batches = [InstanceBatch::new(texture, false, BlendMode::Alpha, 1)];
    let instances = [InstanceData {
        color: [1.0, 1.0, 1.0, 1.0],
        source: Transform::IDENTITY,
        world0: Transform::IDENTITY,
        world1: Transform::IDENTITY,
    }];
    kelp.render_list(TextureId::SCREEN, &camera, clear, &instances, &batches)
        .unwrap();
    kelp.present_frame().unwrap();
    assert_eq!(kelp.state(), EngineState::Ready);

    let frame = kelp.backend().unwrap().last_presented().unwrap();
    assert_eq!(frame.draw_calls(), 1);
    let list = &frame.lists[0];
    assert_eq!(list.target, TextureId::SCREEN);
    assert_eq!(list.clear, Some(clear));
    assert_eq!(list.draws[0].texture, texture);
    assert!(!list.draws[0].smooth);
    assert_eq!(list.draws[0].blend_mode, BlendMode::Alpha);
    assert_eq!(list.draws[0].instances, 0..1);
    assert_eq!(kelp.last_frame_stats().unwrap().draw_calls, 1);

    kelp.uninitialise().unwrap();
}

#[test]
fn render_target_then_screen() {
    let mut kelp = Kelp::new();
    kelp.initialise(|| HeadlessBackend::new(640, 480)).unwrap();

    let sprite = kelp.create_texture_with_data(1, 1, &[255, 255, 255, 255]).unwrap();
    let target = kelp.create_render_target(128, 128).unwrap();
    assert_eq!(kelp.texture(target).unwrap().texture.pixels.len(), 128 * 128 * 4);

    let camera = Camera::new(64.0, 64.0, 128.0, 128.0, 0.0, 1.0);
    let world = Transform {
        scale_x: 32.0,
        scale_y: 32.0,
        ..Transform::IDENTITY
    };
    let sprites = [InstanceData {
        world0: world,
        ..InstanceData::default()
    }];
    kelp.render_list(
        target,
        &camera,
        KelpColor::new(0.0, 0.0, 0.0, 0.0),
        &sprites,
        &[InstanceBatch::new(sprite, true, BlendMode::Additive, 1)],
    )
    .unwrap();

    let screen_camera = Camera::new(0.0, 0.0, 640.0, 480.0, 0.0, 1.0);
    kelp.render_list(
        TextureId::SCREEN,
        &screen_camera,
        KelpColor::BLACK,
        &[InstanceData::default()],
        &[InstanceBatch::new(target, false, BlendMode::Alpha, 1)],
    )
    .unwrap();
    kelp.present_frame().unwrap();

    let frame = kelp.backend().unwrap().last_presented().unwrap();
    assert_eq!(frame.lists.len(), 2);
    assert_eq!(frame.lists[0].target, target);
    assert!(frame.lists[0].clear.is_some());
    assert_eq!(frame.lists[1].target, TextureId::SCREEN);
    assert_eq!(frame.lists[1].draws[0].texture, target);

    let stats = kelp.last_frame_stats().unwrap();
    assert_eq!(stats.render_lists, 2);
    assert_eq!(stats.pipeline_switches, 2);
}
