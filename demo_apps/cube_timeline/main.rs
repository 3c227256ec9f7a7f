//! Scripted cube animation.
//!
//! Records a few keyframes through the control panel, plays the timeline back
//! and logs the cube transform once per simulated 100ms. Pass a path to save
//! the resulting snapshot; pass `--realtime` to drive the loops from a
//! wall-clock [`FrameClock`] instead of a fixed-step one at 60 Hz.
//!
//! ```text
//! RUST_LOG=info cargo run -p cube_timeline -- cube.json
//! ```

use std::sync::Arc;
use std::time::Duration;

use kinema::animation::snapshot::DEFAULT_FILE_NAME;
use kinema::{
    EditorSession, FrameClock, PanelState, ParameterRegistry, PlaybackEvent, TimelineSettings,
    TransformBinding,
};

const FRAME_MS: f64 = 1000.0 / 60.0;

type CubeSession = EditorSession<PanelState, TransformBinding>;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut realtime = false;
    let mut output = None;
    for arg in std::env::args().skip(1) {
        if arg == "--realtime" {
            realtime = true;
        } else {
            output = Some(arg);
        }
    }

    let registry = Arc::new(ParameterRegistry::cube_transform());
    let settings = TimelineSettings {
        duration_ms: 2000.0,
        ..Default::default()
    };

    let panel = PanelState::new(Arc::clone(&registry));
    let binding = TransformBinding::cube(&registry);
    let mut session = EditorSession::new(settings, registry, panel, binding)?;

    session.subscribe(|event| match event {
        PlaybackEvent::Started { from } => println!("▶ playing from {from:.0}ms"),
        PlaybackEvent::Finished => println!("■ finished"),
        PlaybackEvent::Aborted(reason) => println!("✗ aborted: {reason}"),
        _ => {}
    });

    record_keyframes(&mut session)?;
    println!(
        "Recorded {} keyframes",
        session.timeline().model().map_or(0, |m| m.keyframe_count())
    );

    session.go_to_start();
    session.play();

    let clock = if realtime {
        FrameClock::new().with_max_delta(Duration::from_millis(100))
    } else {
        FrameClock::fixed_step(frame_step())
    };
    run(&mut session, clock);

    let path = output.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    session.save_snapshot(&path)?;
    println!("Snapshot written to {path}");

    session.dispose();
    Ok(())
}

/// Edits the panel at three cursor positions, the way a user would.
fn record_keyframes(session: &mut CubeSession) -> anyhow::Result<()> {
    let script: [(f32, &[(&str, f32)]); 3] = [
        (0.0, &[("positionX", -3.0), ("rotationY", 0.0), ("scale", 1.0)]),
        (1000.0, &[("positionX", 0.0), ("positionY", 2.0), ("rotationY", 180.0), ("scale", 2.0)]),
        (2000.0, &[("positionX", 3.0), ("positionY", 0.0), ("rotationY", 360.0), ("opacity", 0.25)]),
    ];

    for (time, edits) in script {
        session.seek(time);
        for &(name, value) in edits {
            session.panel_mut().edit(name, value)?;
        }
        let recorded = session.handle_control_changes();
        log::info!("t={time}ms: recorded {recorded:?}");
    }
    Ok(())
}

/// Drives UI and render frames from `clock` until playback stops, logging
/// the cube once per 100ms of timeline time.
fn run(session: &mut CubeSession, mut clock: FrameClock) {
    let mut last_report = -1;

    while session.is_playing() {
        clock.tick();
        session.ui_frame(clock.timestamp_ms());
        session.render_frame(clock.dt_seconds());

        let bucket = (session.current_time() / 100.0) as i32;
        if bucket != last_report {
            last_report = bucket;
            report(session);
        }
        if !clock.is_fixed_step() {
            std::thread::sleep(frame_step());
        }
    }
    log::info!("Playback finished after {} frames", clock.frame_count());
    report(session);
}

fn frame_step() -> Duration {
    Duration::from_secs_f64(FRAME_MS / 1000.0)
}

fn report(session: &CubeSession) {
    let transform = session.binding().transform();
    println!(
        "frame {:>3} | t={:>6.1}ms | pos=({:>5.2}, {:>5.2}, {:>5.2}) rotY={:>6.1}° scale={:.2} opacity={:.2}",
        session.current_frame(),
        session.current_time(),
        transform.position.x,
        transform.position.y,
        transform.position.z,
        transform.rotation_degrees.y,
        transform.scale,
        transform.opacity,
    );
}
