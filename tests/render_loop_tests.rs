//! Scenario tests for the frame loop running the CPU kernel.

use glam::{Vec2, Vec3};
use particle_interop::camera::PITCH_LIMIT;
use particle_interop::controls::MIN_POINT_SIZE;
use particle_interop::input::{FrameInput, KeyCode, PointerState};
use particle_interop::interop::Ownership;
use particle_interop::render_loop::MOUSE_SENSITIVITY;
use particle_interop::{
    ColorProfile, CpuKernel, CpuParticles, FrameRenderer, LoopState, ParticleMode,
    ParticleSystemError, Projection, ProjectionMode, RenderLoop, RenderUniforms,
    SimulationContext, Time,
};
use rand::{Rng, SeedableRng};

/// Renderer that records the uniforms of every draw.
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<RenderUniforms>,
    particle_counts: Vec<usize>,
}

impl FrameRenderer for RecordingRenderer {
    type Buffers = CpuParticles;

    fn viewport(&self) -> Vec2 {
        Vec2::new(1024.0, 768.0)
    }

    fn draw(
        &mut self,
        buffers: &CpuParticles,
        uniforms: &RenderUniforms,
    ) -> Result<(), ParticleSystemError> {
        self.particle_counts.push(buffers.len());
        self.frames.push(*uniforms);
        Ok(())
    }
}

fn new_loop(n: u32) -> RenderLoop<CpuKernel> {
    let projection = Projection::new(54.0, 1024.0 / 768.0);
    RenderLoop::new(
        CpuKernel::new(),
        CpuParticles::new(n),
        SimulationContext::new(projection),
        Time::fixed(1.0 / 60.0),
    )
}

fn press(keys: &[KeyCode]) -> FrameInput {
    FrameInput::new(keys.iter().copied(), keys.iter().copied(), PointerState::default())
}

fn hold(keys: &[KeyCode]) -> FrameInput {
    FrameInput::new([], keys.iter().copied(), PointerState::default())
}

#[test]
fn test_session_from_launch_to_escape() {
    let mut lp = new_loop(1_000);
    let mut renderer = RecordingRenderer::default();

    // A few idle frames, then cycle everything once, then quit.
    for _ in 0..5 {
        assert_eq!(lp.frame(&FrameInput::default(), &mut renderer).unwrap(), LoopState::Steady);
    }
    for _ in 0..ParticleMode::count() {
        lp.frame(&press(&[KeyCode::Tab]), &mut renderer).unwrap();
    }
    for _ in 0..ColorProfile::count() {
        lp.frame(&press(&[KeyCode::C]), &mut renderer).unwrap();
    }
    assert_eq!(lp.context.particle_mode(), ParticleMode::Stationary);
    assert_eq!(lp.context.color_profile(), ColorProfile::Confetti);

    let state = lp.frame(&press(&[KeyCode::Escape]), &mut renderer).unwrap();
    assert_eq!(state, LoopState::Closed);

    let drawn = 5 + ParticleMode::count() + ColorProfile::count();
    assert_eq!(renderer.frames.len(), drawn);
    assert!(renderer.particle_counts.iter().all(|&n| n == 1_000));

    let ledger = lp.ledger();
    // init + one update per drawn frame + one change_color per C press
    assert_eq!(ledger.acquires as usize, 1 + drawn + ColorProfile::count());
    assert_eq!(ledger.draws as usize, drawn);
    assert!(ledger.is_balanced());
    assert_eq!(lp.buffers().owner(), Ownership::GraphicsOwned);
}

#[test]
fn test_projection_toggle_reaches_uniforms() {
    let mut lp = new_loop(16);
    let mut renderer = RecordingRenderer::default();
    let perspective = lp.context.projection().perspective_matrix();
    let orthographic = lp.context.projection().orthographic_matrix();

    lp.frame(&FrameInput::default(), &mut renderer).unwrap();
    lp.frame(&press(&[KeyCode::P]), &mut renderer).unwrap();
    lp.frame(&press(&[KeyCode::P]), &mut renderer).unwrap();

    assert_eq!(renderer.frames[0].projection, perspective.to_cols_array_2d());
    assert_eq!(renderer.frames[1].projection, orthographic.to_cols_array_2d());
    assert_eq!(renderer.frames[2].projection, perspective.to_cols_array_2d());
    assert_eq!(lp.context.projection_mode(), ProjectionMode::Perspective);
}

#[test]
fn test_point_size_follows_held_page_keys() {
    let mut lp = new_loop(8);
    let mut renderer = RecordingRenderer::default();
    for _ in 0..5 {
        lp.frame(&hold(&[KeyCode::PageDown]), &mut renderer).unwrap();
    }
    assert_eq!(lp.context.point_size(), MIN_POINT_SIZE);
    for _ in 0..3 {
        lp.frame(&hold(&[KeyCode::PageUp]), &mut renderer).unwrap();
    }
    assert_eq!(lp.context.point_size(), MIN_POINT_SIZE + 3);
    assert_eq!(
        renderer.frames.last().map(|u| u.point_size),
        Some((MIN_POINT_SIZE + 3) as f32)
    );
}

#[test]
fn test_stationary_particles_hold_still_without_decay() {
    let mut lp = new_loop(64);
    let mut renderer = RecordingRenderer::default();
    lp.frame(&press(&[KeyCode::L]), &mut renderer).unwrap();
    assert!(!lp.context.is_decaying());
    let before = lp.buffers().inner().positions.clone();

    for _ in 0..20 {
        lp.frame(&FrameInput::default(), &mut renderer).unwrap();
    }
    assert_eq!(lp.buffers().inner().positions, before);
}

#[test]
fn test_generator_follows_pointer_then_spawns_there() {
    let mut lp = new_loop(256);
    let mut renderer = RecordingRenderer::default();
    lp.frame(&FrameInput::default(), &mut renderer).unwrap();

    let pointer = PointerState {
        ndc: Vec2::new(0.6, 0.0),
        delta: Vec2::new(3.0, 0.0),
        inside: true,
        moved: true,
    };
    lp.frame(&FrameInput::new([], [KeyCode::ControlLeft], pointer), &mut renderer)
        .unwrap();
    let generator = lp.context.generator.point();
    assert!(generator.x > 0.0);
    assert!(generator.y.abs() < 1e-4);

    // Let every particle expire at least once
    for _ in 0..(4 * 60) {
        lp.frame(&FrameInput::default(), &mut renderer).unwrap();
    }
    let particles = lp.buffers().inner();
    let centroid = particles
        .positions
        .iter()
        .map(|p| p.truncate())
        .fold(Vec3::ZERO, |acc, p| acc + p)
        / particles.len() as f32;
    assert!((centroid - generator).length() < 0.15, "centroid {centroid:?}");
}

#[test]
fn test_random_input_keeps_invariants() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut lp = new_loop(128);
    let mut renderer = RecordingRenderer::default();

    let keys = [
        KeyCode::P,
        KeyCode::Z,
        KeyCode::L,
        KeyCode::G,
        KeyCode::T,
        KeyCode::X,
        KeyCode::Tab,
        KeyCode::C,
        KeyCode::PageUp,
        KeyCode::PageDown,
        KeyCode::W,
        KeyCode::A,
        KeyCode::Up,
        KeyCode::Home,
        KeyCode::ShiftLeft,
    ];

    for _ in 0..300 {
        let pressed: Vec<KeyCode> = keys.iter().copied().filter(|_| rng.gen_bool(0.1)).collect();
        let pointer = PointerState {
            ndc: Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)),
            delta: Vec2::new(rng.gen_range(-400.0..400.0), rng.gen_range(-400.0..400.0)),
            inside: true,
            moved: rng.gen_bool(0.5),
        };
        let input = FrameInput::new(pressed.iter().copied(), pressed.iter().copied(), pointer);
        assert_eq!(lp.frame(&input, &mut renderer).unwrap(), LoopState::Steady);

        assert!(lp.context.camera.pitch().abs() <= PITCH_LIMIT);
        assert!(lp.context.point_size() >= MIN_POINT_SIZE);
        assert_eq!(lp.context.generator.position.w, 1.0);
        assert_eq!(lp.buffers().owner(), Ownership::GraphicsOwned);
    }

    assert_eq!(renderer.frames.len(), 300);
    assert!(lp.ledger().is_balanced());
}

#[test]
fn test_large_pointer_motion_clamps_pitch() {
    let mut lp = new_loop(4);
    let mut renderer = RecordingRenderer::default();
    let pointer = PointerState {
        delta: Vec2::new(0.0, 10.0 * PITCH_LIMIT / MOUSE_SENSITIVITY),
        moved: true,
        inside: true,
        ..Default::default()
    };
    lp.frame(&FrameInput::new([], [KeyCode::ShiftLeft], pointer), &mut renderer)
        .unwrap();
    assert_eq!(lp.context.camera.pitch(), PITCH_LIMIT);
}
