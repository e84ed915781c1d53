use std::sync::Arc;

use tour_model::{Hotspot, Scene, Tour};

use super::*;
use crate::clock::ManualClock;
use crate::config::{BoundaryPolicy, RotationAxes};
use crate::platform::{HeadlessPlatform, PlatformRequest};
use crate::presentation::LOAD_FAILED_MESSAGE;

fn three_room_tour() -> Tour {
    Tour::new(vec![
        Scene::new("Living Room", "living.jpg")
            .with_hotspot(Hotspot::scene_link(50.0, 50.0, 1))
            .with_hotspot(Hotspot::info_note(20.0, 60.0, "Original fireplace")),
        Scene::new("Kitchen", "kitchen.jpg").with_hotspot(Hotspot::scene_link(50.0, 50.0, 2)),
        Scene::new("Bedroom", "bedroom.jpg").with_hotspot(Hotspot::scene_link(50.0, 50.0, 0)),
    ])
}

fn viewer_with(
    tour: Tour,
    config: ViewerConfig,
) -> (TourViewer<HeadlessPlatform>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let viewer = TourViewer::new(tour, config, HeadlessPlatform::new(), clock.clone());
    (viewer, clock)
}

fn ready_viewer(config: ViewerConfig) -> (TourViewer<HeadlessPlatform>, Arc<ManualClock>) {
    let (mut viewer, clock) = viewer_with(three_room_tour(), config);
    finish_loading(&mut viewer);
    (viewer, clock)
}

fn finish_loading(viewer: &mut TourViewer<HeadlessPlatform>) {
    let ticket = viewer.current_ticket().expect("active session");
    assert!(viewer.asset_loaded(ticket));
}

fn drag(viewer: &mut TourViewer<HeadlessPlatform>, from: (f32, f32), to: (f32, f32)) {
    assert!(viewer.pointer_down(from.0, from.1, PointerSource::Mouse));
    assert!(viewer.pointer_move(to.0, to.1));
    assert!(viewer.pointer_up());
}

#[test]
fn mount_requests_initial_image() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    assert_eq!(viewer.mode(), ViewerMode::Active);
    assert_eq!(viewer.current_scene(), Some(0));
    assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    let notifications = viewer.take_notifications();
    assert_eq!(
        notifications,
        vec![ViewerNotification::LoadRequested {
            ticket: viewer.current_ticket().expect("ticket"),
            image: "living.jpg".to_string(),
        }]
    );
    assert_eq!(viewer.platform().listener_count(), 2);
}

#[test]
fn go_to_resets_rotation_for_every_target() {
    for target in 0..3 {
        let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
        drag(&mut viewer, (0.0, 0.0), (40.0, 30.0));
        assert!(!viewer.rotation().is_origin());

        assert!(viewer.go_to(target));
        assert_eq!(viewer.current_scene(), Some(target));
        assert!(viewer.rotation().is_origin());
        assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    }
}

#[test]
fn go_to_out_of_range_is_rejected() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    viewer.take_notifications();
    assert!(!viewer.go_to(3));
    assert_eq!(viewer.current_scene(), Some(0));
    assert_eq!(viewer.load_state(), Some(&LoadState::Ready));
    assert!(viewer.take_notifications().is_empty());
}

#[test]
fn navigation_notifies_destination_and_requests_its_image() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    viewer.take_notifications();
    assert!(viewer.next());
    let ticket = viewer.current_ticket().expect("ticket");
    assert_eq!(
        viewer.take_notifications(),
        vec![
            ViewerNotification::SceneChanged {
                index: 1,
                title: "Kitchen".to_string()
            },
            ViewerNotification::LoadRequested {
                ticket,
                image: "kitchen.jpg".to_string()
            },
        ]
    );
}

#[test]
fn next_cycle_returns_to_start_in_wrap_mode() {
    for start in 0..3 {
        let config = ViewerConfig {
            initial_scene: start,
            ..ViewerConfig::default()
        };
        let (mut viewer, _clock) = viewer_with(three_room_tour(), config);
        for _ in 0..3 {
            assert!(viewer.next());
        }
        assert_eq!(viewer.current_scene(), Some(start));
    }
}

#[test]
fn clamp_mode_stops_at_edges_and_hides_arrows() {
    let config = ViewerConfig {
        boundary: BoundaryPolicy::Clamp,
        ..ViewerConfig::default()
    };
    let (mut viewer, _clock) = ready_viewer(config);
    assert!(!viewer.has_previous());
    assert!(!viewer.previous());
    assert_eq!(viewer.load_state(), Some(&LoadState::Ready));

    viewer.go_to(2);
    assert!(!viewer.has_next());
    assert!(!viewer.next());
    assert_eq!(viewer.current_scene(), Some(2));
}

#[test]
fn unavailable_tour_has_no_side_effects() {
    let (mut viewer, clock) = viewer_with(Tour::unavailable(), ViewerConfig {
        auto_rotate: true,
        ..ViewerConfig::default()
    });
    assert_eq!(viewer.mode(), ViewerMode::Unavailable);
    assert_eq!(viewer.platform().listener_count(), 0);

    assert!(!viewer.go_to(0));
    assert!(!viewer.next());
    assert!(!viewer.pointer_down(1.0, 1.0, PointerSource::Mouse));
    assert!(!viewer.set_focus(true));
    assert!(!viewer.key(ViewerKey::ArrowRight));
    assert!(!viewer.toggle_fullscreen());
    assert!(!viewer.set_auto_rotate(true));
    clock.advance_ms(1_000);
    assert!(!viewer.poll_timers());

    assert!(viewer.take_notifications().is_empty());
    assert!(viewer.platform().requests().is_empty());
    assert_eq!(viewer.current_scene(), None);
    assert!(viewer.next_deadline().is_none());
}

#[test]
fn horizontal_drag_changes_only_yaw() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    assert!(viewer.pointer_down(200.0, 100.0, PointerSource::Mouse));
    assert!(viewer.is_dragging());
    let mut last_yaw = viewer.rotation().yaw;
    for step in 1..=5 {
        viewer.pointer_move(200.0 + step as f32 * 10.0, 100.0);
        let rotation = viewer.rotation();
        assert!(rotation.yaw > last_yaw);
        assert_eq!(rotation.pitch, 0.0);
        last_yaw = rotation.yaw;
    }
    viewer.pointer_up();
    assert!(!viewer.is_dragging());
    assert!((viewer.rotation().yaw - 25.0).abs() < 1e-4);
}

#[test]
fn pitch_stays_within_configured_limit() {
    let config = ViewerConfig {
        pitch_limit: 45.0,
        ..ViewerConfig::default()
    };
    let (mut viewer, _clock) = ready_viewer(config);
    for (dy, touch) in [(400.0, false), (-900.0, true), (2_000.0, false)] {
        let source = if touch {
            PointerSource::Touch
        } else {
            PointerSource::Mouse
        };
        viewer.pointer_down(0.0, 0.0, source);
        viewer.pointer_move(5.0, dy);
        viewer.pointer_up();
        let pitch = viewer.rotation().pitch;
        assert!((-45.0..=45.0).contains(&pitch), "pitch {pitch}");
    }
}

#[test]
fn out_of_range_config_falls_back_to_defaults() {
    let config = ViewerConfig {
        pitch_limit: -10.0,
        touch_sensitivity: f32::NAN,
        ..ViewerConfig::default()
    };
    let (mut viewer, _clock) = ready_viewer(config);
    assert_eq!(viewer.config().pitch_limit, 90.0);
    assert_eq!(viewer.config().touch_sensitivity, 0.3);

    drag(&mut viewer, (0.0, 0.0), (0.0, 10.0));
    assert_eq!(viewer.rotation().pitch, 5.0);
}

#[test]
fn yaw_only_mode_ignores_vertical_drag() {
    let config = ViewerConfig {
        axes: RotationAxes::YawOnly,
        ..ViewerConfig::default()
    };
    let (mut viewer, _clock) = ready_viewer(config);
    drag(&mut viewer, (0.0, 0.0), (10.0, 300.0));
    assert_eq!(viewer.rotation().pitch, 0.0);
    assert!((viewer.rotation().yaw - 5.0).abs() < 1e-4);
}

#[test]
fn pointer_input_is_ignored_while_loading_or_failed() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    assert!(!viewer.pointer_down(0.0, 0.0, PointerSource::Mouse));
    assert!(!viewer.pointer_move(50.0, 50.0));
    assert!(viewer.rotation().is_origin());

    let ticket = viewer.current_ticket().expect("ticket");
    assert!(viewer.asset_failed(ticket, "404"));
    assert_eq!(
        viewer.load_state(),
        Some(&LoadState::Error(LOAD_FAILED_MESSAGE.to_string()))
    );
    assert!(!viewer.pointer_down(0.0, 0.0, PointerSource::Touch));
    assert!(!viewer.is_dragging());
}

#[test]
fn navigating_away_and_back_retries_failed_scene() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    let first = viewer.current_ticket().expect("ticket");
    viewer.asset_failed(first, "timeout");
    viewer.next();
    viewer.previous();
    let retry = viewer.current_ticket().expect("ticket");
    assert_eq!(retry.scene, 0);
    assert_ne!(retry, first);
    assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    assert!(viewer.asset_loaded(retry));
    assert_eq!(viewer.load_state(), Some(&LoadState::Ready));
}

#[test]
fn stale_load_completion_does_not_touch_new_scene() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    let scene_zero = viewer.current_ticket().expect("ticket");
    viewer.go_to(1);
    let scene_one = viewer.current_ticket().expect("ticket");
    viewer.take_notifications();

    assert!(!viewer.asset_loaded(scene_zero));
    assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    assert!(!viewer.asset_failed(scene_zero, "slow"));
    assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    assert!(viewer.take_notifications().is_empty());

    assert!(viewer.asset_loaded(scene_one));
    assert_eq!(viewer.load_state(), Some(&LoadState::Ready));
}

#[test]
fn info_note_leaves_scene_and_rotation() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    drag(&mut viewer, (0.0, 0.0), (20.0, 10.0));
    let rotation = viewer.rotation();
    viewer.take_notifications();

    assert!(viewer.activate_hotspot(1));
    assert_eq!(viewer.current_scene(), Some(0));
    assert_eq!(viewer.rotation(), rotation);
    let notifications = viewer.take_notifications();
    assert!(matches!(
        notifications.as_slice(),
        [
            ViewerNotification::HotspotActivated { scene: 0, index: 1, .. },
            ViewerNotification::InfoNote { description },
        ] if description == "Original fireplace"
    ));
}

#[test]
fn scene_link_navigates_and_resets_rotation() {
    let tour = Tour::new(vec![
        Scene::new("Entry", "entry.jpg").with_hotspot(Hotspot::scene_link(10.0, 10.0, 2)),
        Scene::new("Hall", "hall.jpg"),
        Scene::new("Study", "study.jpg"),
    ]);
    let (mut viewer, _clock) = viewer_with(tour, ViewerConfig::default());
    finish_loading(&mut viewer);
    drag(&mut viewer, (0.0, 0.0), (30.0, 30.0));

    assert!(viewer.activate_hotspot(0));
    assert_eq!(viewer.current_scene(), Some(2));
    assert!(viewer.rotation().is_origin());
}

#[test]
fn hotspot_chain_visits_every_room() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    let mut visited = Vec::new();
    for _ in 0..3 {
        assert!(viewer.activate_hotspot(0));
        visited.push(
            viewer
                .current_scene_data()
                .map(|scene| scene.title.clone())
                .expect("scene"),
        );
        finish_loading(&mut viewer);
    }
    assert_eq!(visited, vec!["Kitchen", "Bedroom", "Living Room"]);
}

#[test]
fn hotspots_are_inert_while_loading_or_hidden() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    assert!(viewer.interactive_hotspots().is_empty());
    assert!(!viewer.activate_hotspot(0));

    finish_loading(&mut viewer);
    assert_eq!(viewer.interactive_hotspots().len(), 2);
    viewer.toggle_hotspots();
    assert!(viewer.interactive_hotspots().is_empty());
    assert!(!viewer.activate_hotspot(0));
    assert_eq!(viewer.current_scene(), Some(0));
}

#[test]
fn keyboard_needs_focus_and_consumes_navigation_keys() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    assert!(!viewer.key(ViewerKey::ArrowRight));
    assert_eq!(viewer.current_scene(), Some(0));

    viewer.set_focus(true);
    assert!(viewer.key(ViewerKey::ArrowRight));
    assert_eq!(viewer.current_scene(), Some(1));
    assert!(viewer.key(ViewerKey::ArrowLeft));
    assert_eq!(viewer.current_scene(), Some(0));
    assert!(!viewer.key(ViewerKey::Char('z')));

    finish_loading(&mut viewer);
    assert!(viewer.key(ViewerKey::Space));
    assert!(viewer.auto_rotate_enabled());
}

#[test]
fn keyboard_path_activates_hotspots() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    viewer.set_focus(true);
    assert!(viewer.key(ViewerKey::Tab { shift: false }));
    assert_eq!(viewer.focused_hotspot(), Some(0));
    assert!(viewer.key(ViewerKey::Tab { shift: false }));
    assert_eq!(viewer.focused_hotspot(), Some(1));
    assert!(viewer.key(ViewerKey::Tab { shift: true }));
    assert_eq!(viewer.focused_hotspot(), Some(0));

    assert!(viewer.key(ViewerKey::Enter));
    assert_eq!(viewer.current_scene(), Some(1));
    assert_eq!(viewer.focused_hotspot(), None);
}

#[test]
fn fullscreen_flag_follows_platform_notification() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    assert!(viewer.toggle_fullscreen());
    assert!(!viewer.is_fullscreen());

    let change = viewer.platform_mut().take_change_notification();
    assert_eq!(change, Some(true));
    assert!(viewer.fullscreen_changed());
    assert!(viewer.is_fullscreen());

    viewer.set_focus(true);
    assert!(viewer.key(ViewerKey::Escape));
    assert!(viewer.is_fullscreen());
    viewer.platform_mut().take_change_notification();
    viewer.fullscreen_changed();
    assert!(!viewer.is_fullscreen());
    assert_eq!(
        viewer.platform().requests(),
        &[PlatformRequest::EnterFullscreen, PlatformRequest::ExitFullscreen]
    );
}

#[test]
fn escape_exits_before_the_enter_notification_arrives() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    viewer.set_focus(true);
    assert!(viewer.key(ViewerKey::Char('f')));
    assert!(viewer.platform().is_fullscreen());
    assert!(!viewer.is_fullscreen());

    assert!(viewer.key(ViewerKey::Escape));
    assert!(!viewer.platform().is_fullscreen());
    assert_eq!(
        viewer.platform().requests(),
        &[PlatformRequest::EnterFullscreen, PlatformRequest::ExitFullscreen]
    );
}

#[test]
fn denied_fullscreen_keeps_flag_consistent() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    viewer.platform_mut().deny_fullscreen(true);
    assert!(!viewer.toggle_fullscreen());
    assert!(!viewer.fullscreen_changed());
    assert!(!viewer.is_fullscreen());
}

#[test]
fn external_fullscreen_exit_is_mirrored() {
    let (mut viewer, _clock) = ready_viewer(ViewerConfig::default());
    viewer.toggle_fullscreen();
    viewer.fullscreen_changed();
    viewer.platform_mut().set_fullscreen_externally(false);
    viewer.take_notifications();
    assert!(viewer.fullscreen_changed());
    assert!(!viewer.is_fullscreen());
    assert_eq!(
        viewer.take_notifications(),
        vec![ViewerNotification::FullscreenChanged { fullscreen: false }]
    );
}

#[test]
fn auto_rotate_ticks_only_when_ready() {
    let config = ViewerConfig {
        auto_rotate: true,
        ..ViewerConfig::default()
    };
    let (mut viewer, clock) = viewer_with(three_room_tour(), config);
    assert!(!viewer.auto_rotate_running());
    clock.advance_ms(500);
    assert!(!viewer.poll_timers());
    assert!(viewer.rotation().is_origin());

    finish_loading(&mut viewer);
    assert!(viewer.auto_rotate_running());
    clock.advance_ms(300);
    assert!(viewer.poll_timers());
    assert!((viewer.rotation().yaw - 1.5).abs() < 1e-4);
}

#[test]
fn drag_suspends_auto_rotate_until_release() {
    let config = ViewerConfig {
        auto_rotate: true,
        ..ViewerConfig::default()
    };
    let (mut viewer, clock) = ready_viewer(config);
    assert!(viewer.pointer_down(0.0, 0.0, PointerSource::Mouse));
    assert!(!viewer.auto_rotate_running());
    let held = viewer.rotation();
    clock.advance_ms(1_000);
    assert!(!viewer.poll_timers());
    assert_eq!(viewer.rotation(), held);

    viewer.pointer_up();
    assert!(viewer.auto_rotate_enabled());
    clock.advance_ms(100);
    assert!(viewer.poll_timers());
}

#[test]
fn enabling_auto_rotate_mid_drag_waits_for_release() {
    let (mut viewer, clock) = ready_viewer(ViewerConfig::default());
    viewer.pointer_down(0.0, 0.0, PointerSource::Touch);
    assert!(viewer.set_auto_rotate(true));
    assert!(!viewer.auto_rotate_running());
    clock.advance_ms(400);
    assert!(!viewer.poll_timers());
    assert!(viewer.rotation().is_origin());

    viewer.pointer_up();
    clock.advance_ms(100);
    assert!(viewer.poll_timers());
}

#[test]
fn destroy_cancels_timer_and_listeners() {
    let config = ViewerConfig {
        auto_rotate: true,
        ..ViewerConfig::default()
    };
    let (mut viewer, clock) = ready_viewer(config);
    assert!(viewer.auto_rotate_running());
    let before = viewer.rotation();

    viewer.destroy();
    assert_eq!(viewer.mode(), ViewerMode::Destroyed);
    assert_eq!(viewer.platform().listener_count(), 0);
    assert!(viewer.next_deadline().is_none());

    clock.advance_ms(5_000);
    assert!(!viewer.poll_timers());
    assert_eq!(viewer.rotation(), before);
    assert!(!viewer.next());
    viewer.destroy();
}

#[test]
fn replacing_the_tour_starts_fresh() {
    let config = ViewerConfig {
        initial_scene: 2,
        ..ViewerConfig::default()
    };
    let (mut viewer, _clock) = viewer_with(three_room_tour(), config);
    finish_loading(&mut viewer);
    drag(&mut viewer, (0.0, 0.0), (50.0, 0.0));

    viewer.replace_tour(Tour::new(vec![
        Scene::new("Garage", "garage.jpg"),
        Scene::new("Yard", "yard.jpg"),
    ]));
    assert_eq!(viewer.current_scene(), Some(0));
    assert!(viewer.rotation().is_origin());
    assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    assert_eq!(viewer.platform().listener_count(), 2);

    viewer.replace_tour(Tour::unavailable());
    assert_eq!(viewer.mode(), ViewerMode::Unavailable);
    assert_eq!(viewer.platform().listener_count(), 0);
}

#[test]
fn load_from_replaced_tour_is_ignored() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    let old_ticket = viewer.current_ticket().expect("ticket");

    viewer.replace_tour(Tour::new(vec![Scene::new("Garage", "garage.jpg")]));
    let new_ticket = viewer.current_ticket().expect("ticket");
    assert_ne!(old_ticket, new_ticket);

    assert!(!viewer.asset_loaded(old_ticket));
    assert!(!viewer.asset_failed(old_ticket, "late"));
    assert_eq!(viewer.load_state(), Some(&LoadState::Loading));
    assert!(viewer.asset_loaded(new_ticket));
    assert_eq!(viewer.load_state(), Some(&LoadState::Ready));
}

#[test]
fn tickets_stay_unique_across_an_unavailable_tour() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    assert!(viewer.go_to(1));
    let old_ticket = viewer.current_ticket().expect("ticket");

    viewer.replace_tour(Tour::unavailable());
    viewer.replace_tour(three_room_tour());
    assert!(viewer.go_to(1));
    let new_ticket = viewer.current_ticket().expect("ticket");
    assert!(new_ticket.generation > old_ticket.generation);
    assert!(!viewer.asset_loaded(old_ticket));
    assert!(viewer.asset_loaded(new_ticket));
}

#[test]
fn handle_routes_inputs() {
    let (mut viewer, _clock) = viewer_with(three_room_tour(), ViewerConfig::default());
    let ticket = viewer.current_ticket().expect("ticket");
    assert!(viewer.handle(ViewerInput::AssetLoaded(ticket)));
    assert!(viewer.handle(ViewerInput::PointerDown {
        x: 0.0,
        y: 0.0,
        source: PointerSource::Mouse
    }));
    assert!(viewer.handle(ViewerInput::PointerMove { x: 4.0, y: 0.0 }));
    assert!(viewer.handle(ViewerInput::PointerLeave));
    assert!(!viewer.is_dragging());
    assert!(viewer.handle(ViewerInput::GoTo(2)));
    assert_eq!(viewer.current_scene(), Some(2));
}
