mod common;

use common::{count_logs, MockCamera, MockHost, MockPipeline};
use scene_mirror::overlay::OVERLAY_SORT_ORDER;
use scene_mirror::{MirrorController, MirrorState, SceneCamera, ScreenSize, UvTransform};

#[test]
fn enable_without_camera_does_nothing_but_warn() {
    let mut host = MockHost::new(1920, 1080);
    host.camera = None;
    let mut controller = MirrorController::new();

    let ((), logs) = count_logs(|| controller.enable(&mut host));

    assert_eq!(controller.state(), MirrorState::Disabled);
    assert!(host.device.created.is_empty());
    assert!(host.ui.overlays.is_empty());
    assert!(!controller.watch().is_mirrored());
    assert_eq!(logs.warnings(), 1);
    assert_eq!(logs.errors(), 0);
}

#[test]
fn enable_wires_every_piece() {
    let mut host = MockHost::new(1920, 1080);
    host.antialiasing = 4;
    let mut controller = MirrorController::new();
    let watch = controller.watch();

    controller.enable(&mut host);

    assert!(controller.is_enabled());
    let surface = *controller.surface().expect("surface allocated");
    assert_eq!((surface.desc.width, surface.desc.height), (1920, 1080));
    assert_eq!(surface.desc.samples, 4);
    assert_eq!(host.camera_target(), Some(surface.id));

    let node = controller.overlay().expect("overlay created").node();
    let overlay = &host.ui.overlays[&node];
    assert_eq!(overlay.surface, surface.id);
    assert_eq!(overlay.uv, UvTransform::FLIP_HORIZONTAL);
    assert_eq!(overlay.sort_order, OVERLAY_SORT_ORDER);
    assert!(!overlay.raycast_target);

    assert!(watch.is_mirrored());
    assert_eq!(watch.status().overlay, Some(node));

    let listener = host.listener.as_ref().unwrap();
    let mut samples = [0.1, 0.9, 0.2, 0.8];
    listener.render(&mut samples, 2);
    assert_eq!(samples, [0.9, 0.1, 0.8, 0.2]);
}

#[test]
fn enable_twice_allocates_once() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();

    controller.enable(&mut host);
    let ((), logs) = count_logs(|| controller.enable(&mut host));

    assert_eq!(host.device.created.len(), 1);
    assert_eq!(host.ui.overlays.len(), 1);
    assert_eq!(logs.warnings(), 0);
}

#[test]
fn disable_undoes_everything() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    let watch = controller.watch();
    controller.enable(&mut host);

    controller.disable(&mut host);

    assert_eq!(controller.state(), MirrorState::Disabled);
    assert!(host.device.live.is_empty());
    assert!(host.ui.overlays.is_empty());
    assert_eq!(host.camera_target(), None);
    assert!(!watch.is_mirrored());

    let listener = host.listener.as_ref().unwrap();
    let mut samples = [0.1, 0.9];
    listener.render(&mut samples, 2);
    assert_eq!(samples, [0.1, 0.9]);
}

#[test]
fn disable_twice_releases_once() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);

    controller.disable(&mut host);
    controller.disable(&mut host);

    assert_eq!(host.device.released.len(), 1);
    assert_eq!(controller.state(), MirrorState::Disabled);
}

#[test]
fn disable_on_a_fresh_controller_is_a_noop() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    let ((), logs) = count_logs(|| controller.disable(&mut host));
    assert!(host.device.released.is_empty());
    assert_eq!(logs.warnings() + logs.errors(), 0);
}

#[test]
fn toggle_and_set_state_flip_between_modes() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();

    controller.toggle(&mut host);
    assert!(controller.is_enabled());
    controller.toggle(&mut host);
    assert!(!controller.is_enabled());

    controller.set_mirror_state(&mut host, true);
    controller.set_mirror_state(&mut host, true);
    assert!(controller.is_enabled());
    assert_eq!(host.device.created.len(), 2);

    controller.set_mirror_state(&mut host, false);
    controller.set_mirror_state(&mut host, false);
    assert!(host.device.live.is_empty());
}

#[test]
fn resize_replaces_the_surface_exactly_once() {
    let scale = 0.75;
    let mut host = MockHost::new(1920, 1080).with_render_scale(scale);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);
    let old = controller.surface().unwrap().id;

    host.screen = ScreenSize::new(1280, 720);
    controller.tick(&mut host);
    controller.tick(&mut host);

    assert_eq!(host.device.released, vec![old]);
    assert_eq!(host.device.created.len(), 2);
    let new = *controller.surface().unwrap();
    assert_eq!(
        (new.desc.width, new.desc.height),
        ((1280.0 * scale) as u32, (720.0 * scale) as u32)
    );
    assert_eq!(host.camera_target(), Some(new.id));

    let node = controller.overlay().unwrap().node();
    assert_eq!(host.ui.overlays[&node].surface, new.id);
    assert_eq!(controller.overlay().unwrap().surface(), new.id);
}

#[test]
fn surface_size_follows_screen_and_scale() {
    let sizes = [(256, 256), (1280, 720), (1920, 1080), (2560, 1440), (3841, 2161)];
    let scales = [0.1_f32, 0.4, 0.5, 1.0, 1.5];

    for scale in scales {
        let mut host = MockHost::new(800, 600).with_render_scale(scale);
        let mut controller = MirrorController::new();
        controller.enable(&mut host);

        for (w, h) in sizes {
            controller.handle_resolution_change(&mut host, w, h);
            let desc = controller.surface().unwrap().desc;
            let expect = |extent: i32| {
                ((f64::from(extent) * f64::from(scale)).floor() as u32).max(256)
            };
            assert_eq!((desc.width, desc.height), (expect(w), expect(h)), "{w}x{h} at {scale}");
        }
        controller.shutdown(&mut host);
    }
}

#[test]
fn missing_or_bad_render_scale_means_full_size() {
    let mut host = MockHost::new(1600, 900);
    host.pipeline = Some(MockPipeline { scale: None });
    let mut controller = MirrorController::new();
    controller.enable(&mut host);
    assert_eq!(controller.surface().unwrap().desc.width, 1600);
    controller.disable(&mut host);

    host.pipeline = Some(MockPipeline { scale: Some(-2.0) });
    controller.enable(&mut host);
    assert_eq!(controller.surface().unwrap().desc.height, 900);
    controller.disable(&mut host);

    host.pipeline = Some(MockPipeline { scale: Some(f32::NAN) });
    controller.enable(&mut host);
    assert_eq!(controller.surface().unwrap().desc.width, 1600);
}

#[test]
fn resolution_change_while_disabled_is_ignored() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.handle_resolution_change(&mut host, 640, 480);
    assert!(host.device.created.is_empty());
}

#[test]
fn minimised_window_defers_the_rebuild() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);

    host.screen = ScreenSize::new(0, 0);
    controller.tick(&mut host);
    assert_eq!(host.device.created.len(), 1);
    assert!(controller.is_enabled());

    host.screen = ScreenSize::new(1024, 768);
    controller.tick(&mut host);
    assert_eq!(host.device.created.len(), 2);
    assert_eq!(controller.surface().unwrap().desc.width, 1024);
}

#[test]
fn failed_allocation_leaves_nothing_behind() {
    let mut host = MockHost::new(1280, 720);
    host.device.fail_after = Some(0);
    let mut controller = MirrorController::new();

    let ((), logs) = count_logs(|| controller.enable(&mut host));

    assert_eq!(controller.state(), MirrorState::Disabled);
    assert!(host.device.live.is_empty());
    assert!(host.ui.overlays.is_empty());
    assert_eq!(host.camera_target(), None);
    assert!(!controller.watch().is_mirrored());
    assert_eq!(logs.errors(), 1);

    controller.disable(&mut host);
    assert!(host.device.released.is_empty());
}

#[test]
fn failed_overlay_rolls_back_surface_and_camera() {
    let mut host = MockHost::new(1280, 720);
    host.ui.fail_create = true;
    let mut controller = MirrorController::new();

    controller.enable(&mut host);

    assert_eq!(controller.state(), MirrorState::Disabled);
    assert_eq!(host.device.created.len(), 1);
    assert_eq!(host.device.released.len(), 1);
    assert!(host.device.live.is_empty());
    assert_eq!(host.camera_target(), None);
}

#[test]
fn failed_rebuild_turns_the_mirror_off() {
    let mut host = MockHost::new(1920, 1080);
    host.device.fail_after = Some(1);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);
    assert!(controller.is_enabled());

    let ((), logs) = count_logs(|| controller.handle_resolution_change(&mut host, 1280, 720));

    assert_eq!(controller.state(), MirrorState::Disabled);
    assert!(host.device.live.is_empty());
    assert!(host.ui.overlays.is_empty());
    assert_eq!(host.camera_target(), None);
    assert!(!controller.watch().is_mirrored());
    assert_eq!(logs.errors(), 1);
}

#[test]
fn missing_listener_only_skips_audio() {
    let mut host = MockHost::new(1280, 720);
    host.listener = None;
    let mut controller = MirrorController::new();

    let ((), logs) = count_logs(|| controller.enable(&mut host));

    assert!(controller.is_enabled());
    assert_eq!(logs.warnings(), 1);
}

#[test]
fn start_up_enable_waits_for_the_settle_delay() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.schedule_enable(3);

    controller.tick(&mut host);
    controller.tick(&mut host);
    assert!(!controller.is_enabled());

    controller.tick(&mut host);
    assert!(controller.is_enabled());
}

#[test]
fn disabling_cancels_a_pending_start_up_enable() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.schedule_enable(2);

    controller.disable(&mut host);
    for _ in 0..4 {
        controller.tick(&mut host);
    }
    assert!(!controller.is_enabled());
    assert!(host.device.created.is_empty());
}

#[test]
fn camera_lost_before_disable_still_releases() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);

    host.camera = None;
    controller.disable(&mut host);

    assert!(host.device.live.is_empty());
    assert!(host.ui.overlays.is_empty());
}

#[test]
fn enable_again_rebuilds_for_a_replaced_camera() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);

    host.camera = Some(MockCamera::default());
    let ((), logs) = count_logs(|| controller.enable(&mut host));

    assert!(controller.is_enabled());
    let surface = controller.surface().unwrap().id;
    assert_eq!(host.camera_target(), Some(surface));
    assert_eq!(host.device.created.len(), 2);
    assert_eq!(host.device.live.len(), 1);
    let node = controller.overlay().unwrap().node();
    assert_eq!(host.ui.overlays[&node].surface, surface);
    assert_eq!(logs.warnings(), 1);
    assert_eq!(logs.errors(), 0);
}

#[test]
fn enable_again_reattaches_a_reset_camera() {
    let mut host = MockHost::new(1280, 720);
    let mut controller = MirrorController::new();
    controller.enable(&mut host);

    host.camera.as_mut().unwrap().set_target(None);
    controller.enable(&mut host);

    assert_eq!(host.camera_target(), Some(controller.surface().unwrap().id));
    assert_eq!(host.device.live.len(), 1);
}

#[test]
fn failed_overlay_retarget_on_resize_turns_the_mirror_off() {
    let mut host = MockHost::new(1920, 1080);
    let mut controller = MirrorController::new();
    let watch = controller.watch();
    controller.enable(&mut host);

    host.ui.fail_retarget = true;
    let ((), logs) = count_logs(|| controller.handle_resolution_change(&mut host, 1280, 720));

    assert_eq!(controller.state(), MirrorState::Disabled);
    assert!(host.device.live.is_empty());
    assert!(host.ui.overlays.is_empty());
    assert_eq!(host.camera_target(), None);
    assert!(!watch.is_mirrored());
    assert_eq!(logs.errors(), 1);
}
