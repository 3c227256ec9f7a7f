//! Editor Session Tests
//!
//! End-to-end tests driving [`EditorSession`] through its frame loops:
//! - Recording keyframes from panel edits
//! - Playback without feedback into the timeline
//! - Transport (stop, pause, seek, go to start/end, loop)
//! - Render-side smoothing and the non-finite guard
//! - Snapshot import/export and teardown

use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;
use std::sync::Arc;

use glam::Quat;

use kinema::animation::TickStatus;
use kinema::{
    EditorSession, KinemaError, PanelState, ParameterRegistry, PlaybackEvent, TimelineSettings,
    TransformBinding,
};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

type Session = EditorSession<PanelState, TransformBinding>;

fn session() -> Session {
    session_with(TimelineSettings::default())
}

fn session_with(settings: TimelineSettings) -> Session {
    let _ = env_logger::builder().is_test(true).try_init();

    let registry = Arc::new(ParameterRegistry::cube_transform());
    let panel = PanelState::new(Arc::clone(&registry));
    let binding = TransformBinding::cube(&registry);
    EditorSession::new(settings, registry, panel, binding).expect("valid session")
}

fn keyframe_count(session: &Session) -> usize {
    session.timeline().model().map_or(0, |m| m.keyframe_count())
}

fn panel_value(session: &Session, name: &str) -> f32 {
    session.panel().value(name).expect("known control")
}

/// Edits `name` at `time` the way a user would: move the cursor, drag the
/// control, let the next UI frame pick it up.
fn edit_at(session: &mut Session, time: f32, name: &str, value: f32) {
    session.seek(time);
    session.panel_mut().edit(name, value).unwrap();
    session.ui_frame(0.0);
}

/// positionX: -3 at 0ms, 3 at 1000ms.
fn session_with_sweep() -> Session {
    let mut session = session();
    edit_at(&mut session, 0.0, "positionX", -3.0);
    edit_at(&mut session, 1000.0, "positionX", 3.0);
    session.go_to_start();
    session
}

/// Drives UI frames every `step` ms until playback stops (or `limit` is hit).
fn play_through(session: &mut Session, step: f64, limit: f64) {
    let mut timestamp = 0.0;
    while session.is_playing() && timestamp <= limit {
        session.ui_frame(timestamp);
        timestamp += step;
    }
}

// ============================================================================
// Setup
// ============================================================================

#[test]
fn new_session_starts_empty_and_stopped() {
    let session = session();

    assert!(session.timeline().is_initialized());
    assert_eq!(session.timeline().model().unwrap().tracks.len(), 8);
    assert_eq!(keyframe_count(&session), 0);
    assert!(!session.is_playing());
    assert!(approx(session.current_time(), 0.0));
    assert_eq!(session.current_frame(), 0);
}

#[test]
fn invalid_settings_are_rejected() {
    let registry = Arc::new(ParameterRegistry::cube_transform());
    let settings = TimelineSettings {
        duration_ms: 0.0,
        ..Default::default()
    };

    let result = EditorSession::new(
        settings,
        Arc::clone(&registry),
        PanelState::new(Arc::clone(&registry)),
        TransformBinding::cube(&registry),
    );
    assert!(matches!(result, Err(KinemaError::InvalidSettings(_))));
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn panel_edit_is_recorded_at_the_cursor() {
    let mut session = session();
    session.seek(1500.0);

    session.panel_mut().edit("rotationZ", 45.0).unwrap();
    let recorded = session.handle_control_changes();

    assert_eq!(recorded, vec!["rotationZ".to_string()]);
    let track = session.timeline().model().unwrap().track("rotationZ").unwrap();
    assert_eq!(track.len(), 1);
    assert!(approx(track.keyframes[0].time, 1500.0));
}

#[test]
fn seeking_writes_interpolated_values_into_the_panel() {
    let mut session = session_with_sweep();

    session.seek(250.0);
    assert!(approx(panel_value(&session, "positionX"), -1.5));

    session.seek(3000.0);
    assert!(approx(panel_value(&session, "positionX"), 3.0));
    assert_eq!(keyframe_count(&session), 2);
}

#[test]
fn record_keyframe_uses_the_current_time() {
    let mut session = session();
    session.seek(700.0);

    session.record_keyframe("scale", 2.0).unwrap();

    let kf = session.timeline().model().unwrap().track("scale").unwrap().keyframes[0];
    assert!(approx(kf.time, 700.0));
}

#[test]
fn edit_then_seek_records_the_edit() {
    let mut session = session();
    edit_at(&mut session, 0.0, "positionX", 1.0);
    session.seek(1000.0);

    // No UI frame between the edit and the next seek
    session.panel_mut().edit("positionX", 4.0).unwrap();
    session.seek(2000.0);
    session.ui_frame(0.0);

    let track = session.timeline().model().unwrap().track("positionX").unwrap();
    assert_eq!(track.len(), 2);
    assert!(approx(track.keyframes[1].time, 1000.0));
    assert!(approx(panel_value(&session, "positionX"), 4.0));
}

#[test]
fn edit_then_play_records_the_edit() {
    let mut session = session();
    session.seek(500.0);

    session.panel_mut().edit("positionY", 2.0).unwrap();
    assert!(session.play());
    session.ui_frame(0.0);

    let track = session.timeline().model().unwrap().track("positionY").unwrap();
    assert_eq!(track.len(), 1);
    assert!(approx(track.keyframes[0].time, 500.0));
}

#[test]
fn edit_then_stop_records_the_edit() {
    let mut session = session();
    session.seek(800.0);

    session.panel_mut().edit("scale", 2.0).unwrap();
    session.stop();

    let track = session.timeline().model().unwrap().track("scale").unwrap();
    assert_eq!(track.len(), 1);
    assert!(approx(track.keyframes[0].time, 800.0));
    assert!(approx(panel_value(&session, "scale"), 2.0));
}

#[test]
fn delete_at_cursor_removes_keyframes_on_every_track() {
    let mut session = session();
    session.seek(1000.0);
    session.panel_mut().edit("positionX", 1.0).unwrap();
    session.panel_mut().edit("positionY", 1.0).unwrap();
    session.handle_control_changes();
    assert_eq!(keyframe_count(&session), 2);

    session.seek(1020.0);
    assert_eq!(session.delete_keyframes_at_cursor(), 2);
    assert_eq!(keyframe_count(&session), 0);
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn playback_interpolates_into_the_panel() {
    let mut session = session_with_sweep();
    session.play();

    session.ui_frame(0.0);
    assert!(approx(panel_value(&session, "positionX"), -3.0));

    session.ui_frame(500.0);
    assert!(approx(session.current_time(), 500.0));
    assert!(approx(panel_value(&session, "positionX"), 0.0));
}

#[test]
fn playback_never_records_keyframes() {
    let mut session = session_with_sweep();
    let before = keyframe_count(&session);

    session.play();
    play_through(&mut session, 100.0, 10_000.0);

    assert!(!session.is_playing());
    assert!(approx(session.current_time(), 5000.0));
    assert_eq!(keyframe_count(&session), before);

    // Frames after playback ends must not pick up the final values either
    session.ui_frame(20_000.0);
    assert_eq!(keyframe_count(&session), before);
    assert!(approx(panel_value(&session, "positionX"), 3.0));
}

#[test]
fn edits_after_playback_are_recorded_normally() {
    let mut session = session_with_sweep();
    session.play();
    play_through(&mut session, 250.0, 10_000.0);

    session.panel_mut().edit("positionY", 2.0).unwrap();
    let recorded = session.handle_control_changes();

    assert_eq!(recorded, vec!["positionY".to_string()]);
}

#[test]
fn edits_during_playback_are_ignored() {
    let mut session = session_with_sweep();
    session.play();
    session.ui_frame(0.0);

    session.panel_mut().edit("positionZ", 2.0).unwrap();
    session.ui_frame(100.0);

    assert!(session.timeline().model().unwrap().track("positionZ").unwrap().is_empty());
}

#[test]
fn looping_playback_wraps_to_zero() {
    let mut session = session_with_sweep();
    session.set_looping(true);
    session.play();
    session.ui_frame(0.0);

    let tick = session.ui_frame(5000.0).unwrap();

    assert_eq!(tick.status, TickStatus::Looped);
    assert!(session.is_playing());
    assert!(approx(session.current_time(), 0.0));
    assert!(approx(panel_value(&session, "positionX"), -3.0));
}

// ============================================================================
// Transport
// ============================================================================

#[test]
fn stop_rewinds_and_refreshes_the_panel() {
    let mut session = session_with_sweep();
    session.play();
    session.ui_frame(0.0);
    session.ui_frame(800.0);

    session.stop();

    assert!(!session.is_playing());
    assert!(approx(session.current_time(), 0.0));
    assert!(approx(panel_value(&session, "positionX"), -3.0));
    assert!(session.ui_frame(900.0).is_none());
}

#[test]
fn pause_keeps_the_cursor() {
    let mut session = session_with_sweep();
    session.play();
    session.ui_frame(0.0);
    session.ui_frame(300.0);

    session.pause();

    assert!(approx(session.current_time(), 300.0));
    assert!(session.ui_frame(10_000.0).is_none());
    assert!(approx(session.current_time(), 300.0));
}

#[test]
fn play_near_the_end_restarts_from_zero() {
    let mut session = session_with_sweep();
    session.go_to_end();
    assert!(approx(session.current_time(), 5000.0));

    assert!(session.play());

    assert!(approx(session.current_time(), 0.0));
    assert!(approx(panel_value(&session, "positionX"), -3.0));
}

#[test]
fn go_to_start_cancels_playback() {
    let mut session = session_with_sweep();
    session.play();
    session.ui_frame(0.0);
    session.ui_frame(400.0);

    session.go_to_start();

    assert!(!session.is_playing());
    assert!(approx(session.current_time(), 0.0));
    assert!(session.scheduler().pending_frame().is_none());
}

#[test]
fn observers_receive_session_events() {
    let mut session = session_with_sweep();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    session.play();
    play_through(&mut session, 1000.0, 10_000.0);

    let events = events.borrow();
    assert_eq!(events.first(), Some(&PlaybackEvent::Started { from: 0.0 }));
    assert_eq!(events.last(), Some(&PlaybackEvent::Finished));
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn binding_follows_the_panel_when_stopped() {
    let mut session = session_with_sweep();
    session.seek(500.0);

    session.render_frame(0.016);

    let transform = session.binding().transform();
    assert!(approx(transform.position.x, 0.0));
    assert!(approx(transform.scale, 1.0));
    assert!(approx(transform.opacity, 1.0));
    assert_eq!(session.binding().frames_applied(), 1);
}

#[test]
fn binding_converts_rotation_degrees() {
    let mut session = session();
    session.panel_mut().edit("rotationY", 90.0).unwrap();

    session.render_frame(0.016);

    let rotation = session.binding().transform().rotation();
    assert!(rotation.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), EPSILON));
}

#[test]
fn binding_is_smoothed_during_playback() {
    let mut session = session_with_sweep();
    session.render_frame(0.016);
    assert!(approx(session.binding().transform().position.x, -3.0));

    session.play();
    session.ui_frame(0.0);
    session.ui_frame(500.0);
    session.render_frame(0.05);

    // 0.4 of the way from -3 toward the panel's 0
    let x = session.binding().transform().position.x;
    assert!(approx(x, -1.8), "Expected -1.8, got {x}");
}

#[test]
fn non_finite_timeline_values_never_reach_the_binding() {
    let mut session = session();
    // Denormalizes to +inf for positionX
    let json = r#"{"rows": [
        {"name": "positionX", "keyframes": [{"val": 0, "data": {"value": 3.4e38}}]},
        {"name": "positionY", "keyframes": [{"val": 0, "data": {"value": 0.75}}]}
    ]}"#;

    session.import_snapshot(json).unwrap();
    session.render_frame(0.016);

    let transform = session.binding().transform();
    assert!(transform.position.is_finite());
    assert!(approx(transform.position.x, 0.0));
    assert!(approx(transform.position.y, 2.5));
    assert!(session.sync().dropped_writes() >= 1);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn failed_import_leaves_the_session_unchanged() {
    let mut session = session_with_sweep();
    let before = session.export_snapshot().unwrap();

    assert!(session.import_snapshot("[]").is_err());
    assert!(session.import_snapshot(r#"{"rows": [{"name": "bogus"}]}"#).is_err());
    assert!(session.import_snapshot("not json").is_err());

    assert_eq!(session.export_snapshot().unwrap(), before);
}

#[test]
fn import_replaces_the_model_and_refreshes_the_panel() {
    let mut source = session_with_sweep();
    source.seek(1000.0);
    source.panel_mut().edit("opacity", 0.5).unwrap();
    source.handle_control_changes();
    let json = source.export_snapshot().unwrap();

    let mut target = session();
    target.seek(1000.0);
    target.import_snapshot(&json).unwrap();

    assert_eq!(keyframe_count(&target), 3);
    assert!(approx(panel_value(&target, "positionX"), 3.0));
    assert!(approx(panel_value(&target, "opacity"), 0.5));

    // Imported values must not be recorded back as edits
    target.ui_frame(0.0);
    assert_eq!(keyframe_count(&target), 3);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn dispose_stops_everything() {
    let mut session = session_with_sweep();
    session.play();
    session.ui_frame(0.0);

    session.dispose();

    assert!(session.is_disposed());
    assert!(!session.is_playing());
    assert!(session.scheduler().pending_frame().is_none());
    assert!(!session.timeline().is_initialized());
    assert!(session.ui_frame(100.0).is_none());
    assert!(!session.play());
    assert!(matches!(
        session.record_keyframe("positionX", 1.0),
        Err(KinemaError::Disposed)
    ));
    assert!(session.import_snapshot(r#"{"rows": []}"#).is_err());

    // Idempotent
    session.dispose();
}
