//! End-to-end runs of the harness on the in-memory backend.

use rotor_engine::core::{FrameLoop, FrameScheduler, Harness, TickOutcome};
use rotor_engine::device::{
    ContextKind, HeadlessBackend, HeadlessSurface, RenderError, ShaderStage, CLEAR_COLOR,
};
use rotor_engine::render::DrawCmd;
use rotor_engine::shader::{BASIC_FRAGMENT_SHADER, BASIC_VERTEX_SHADER};
use rotor_engine::{run_headless, HeadlessConfig};

#[derive(Default)]
struct Pending(bool);

impl FrameScheduler for Pending {
    fn request_frame(&mut self) {
        self.0 = true;
    }
}

#[test]
fn compatibility_context_renders_identically() {
    let primary = run_headless(&HeadlessConfig::default()).unwrap();

    let surface = HeadlessSurface::new(800, 600).without_primary();
    let mut h: Harness<HeadlessBackend> = Harness::with_default_shaders(&surface).unwrap();
    assert_eq!(h.context.kind(), ContextKind::Compatibility);
    assert_eq!(h.context.backend().clear_color(), Some(CLEAR_COLOR));

    let config = HeadlessConfig::default();
    let mut fl = FrameLoop::new();
    let mut s = Pending::default();
    for i in 0..config.frames {
        s.0 = false;
        let now_ms = f64::from(i) * config.frame_interval_ms;
        assert_eq!(fl.tick(now_ms, &mut h, &mut s), TickOutcome::Continue);
        assert!(s.0);
    }

    assert_eq!(primary.context_kind, ContextKind::Primary);
    assert_eq!(h.context.backend().frames_submitted(), primary.frames_rendered);
    assert_eq!(fl.rotation().degrees(), primary.final_angle_degrees);
}

#[test]
fn every_frame_is_one_triangle_draw() {
    let mut h: Harness<HeadlessBackend> =
        Harness::with_default_shaders(&HeadlessSurface::new(320, 240)).unwrap();
    let mut fl = FrameLoop::new();
    let mut s = Pending::default();

    for i in 0..4 {
        fl.tick(f64::from(i) * 16.0, &mut h, &mut s);
        let frame = h.context.backend().last_frame().unwrap();
        assert_eq!(frame.draw_calls(), 1);
        assert_eq!(
            frame.commands().first(),
            Some(&DrawCmd::Viewport { width: 320, height: 240 })
        );
    }
    assert_eq!(h.context.backend().vertices_drawn(), 12);
}

#[test]
fn setup_errors_reach_the_caller() {
    let none = HeadlessSurface::new(800, 600)
        .without_primary()
        .without_compatibility();
    assert_eq!(
        Harness::with_default_shaders(&none).err(),
        Some(RenderError::ContextUnavailable)
    );

    let tiny = HeadlessSurface::new(800, 600).with_memory_budget(16);
    assert!(matches!(
        Harness::with_default_shaders(&tiny).err(),
        Some(RenderError::ResourceExhausted { .. })
    ));

    let broken = HeadlessSurface::new(800, 600);
    let err = Harness::setup(&broken, "@vertex fn vs_main(", BASIC_FRAGMENT_SHADER).err();
    match err {
        Some(RenderError::ShaderCompileFailed { stage, log }) => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(!log.is_empty());
        }
        other => panic!("unexpected: {other:?}"),
    }

    let renamed = BASIC_VERTEX_SHADER.replace("aVertexColor", "aColor");
    assert!(matches!(
        Harness::setup(&broken, &renamed, BASIC_FRAGMENT_SHADER).err(),
        Some(RenderError::LinkFailed { .. })
    ));
}

#[test]
fn cancelled_loop_renders_no_more_frames() {
    let mut h: Harness<HeadlessBackend> =
        Harness::with_default_shaders(&HeadlessSurface::new(800, 600)).unwrap();
    let mut fl = FrameLoop::new();
    let cancel = fl.cancel_handle();
    let mut s = Pending::default();

    fl.tick(0.0, &mut h, &mut s);
    fl.tick(16.0, &mut h, &mut s);
    cancel.clone().cancel();

    s.0 = false;
    assert_eq!(fl.tick(32.0, &mut h, &mut s), TickOutcome::Stopped);
    assert!(!s.0);
    assert!(cancel.is_cancelled());
    assert_eq!(h.context.backend().frames_submitted(), 2);
    assert_eq!(fl.rotation().degrees(), 0.96);
}
