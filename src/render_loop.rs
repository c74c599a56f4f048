//! The frame loop.
//!
//! ```text
//! Priming ──init bracket──► Steady ──close signal──► Closed
//!                             │  ▲
//!                             └──┘ one iteration per frame
//! ```
//!
//! A Steady iteration samples the clock, applies the frame's input snapshot
//! to the [`SimulationContext`], runs `change_color` in its own bracket if the
//! profile changed, runs `update` in a bracket, and finally draws from the
//! buffers once they are back in graphics ownership.
//!
//! The loop is generic over the kernel and the renderer, so the same code
//! drives the wgpu backends in the application and the CPU reference in tests.

use glam::Vec2;

use crate::controls::SimulationContext;
use crate::error::Result;
use crate::input::{FrameInput, KeyCode};
use crate::interop::{ComputeLease, InteropLedger, SharedBufferSet, SharedBuffers};
use crate::kernel::{KernelParams, ParticleKernel};
use crate::time::Time;
use crate::uniforms::RenderUniforms;

/// Camera speed in world units per second for held movement keys.
pub const CAMERA_SPEED: f32 = 2.5;
/// Generator displacement per frame for held arrow/Home/End keys.
pub const GENERATOR_STEP: f32 = 0.02;
/// Degrees of rotation per pixel of pointer motion.
pub const MOUSE_SENSITIVITY: f32 = 0.05;

/// Draws the shared buffers to the screen.
pub trait FrameRenderer {
    type Buffers: SharedBuffers;

    /// Drawable size in pixels.
    fn viewport(&self) -> Vec2;

    /// Draw every particle and present the frame.
    fn draw(&mut self, buffers: &Self::Buffers, uniforms: &RenderUniforms) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// `init` has not run yet.
    Priming,
    Steady,
    /// A close was requested; no further frames run.
    Closed,
}

/// What applying one input snapshot changed beyond the context itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputResponse {
    pub close_requested: bool,
    pub color_changed: bool,
}

/// Apply one frame of input to the context.
pub fn apply_input(ctx: &mut SimulationContext, input: &FrameInput, dt: f32) -> InputResponse {
    let mut response = InputResponse::default();

    if input.pressed(KeyCode::Escape) {
        response.close_requested = true;
    }

    // Toggles
    if input.pressed(KeyCode::P) {
        ctx.toggle_projection_mode();
    }
    if input.pressed(KeyCode::Z) {
        ctx.toggle_spawn_location();
    }
    if input.pressed(KeyCode::L) {
        ctx.toggle_lifetime();
    }
    if input.pressed(KeyCode::G) {
        ctx.toggle_gravity();
    }
    if input.pressed(KeyCode::T) {
        ctx.toggle_texture();
    }
    if input.pressed(KeyCode::X) {
        ctx.toggle_shrinking();
    }
    if input.pressed(KeyCode::Tab) {
        ctx.toggle_particle_mode();
    }
    if input.pressed(KeyCode::C) {
        ctx.toggle_color_profile();
        response.color_changed = true;
    }

    // Point size, one step per frame while held
    if input.held(KeyCode::PageUp) {
        ctx.adjust_point_size(1);
    }
    if input.held(KeyCode::PageDown) {
        ctx.adjust_point_size(-1);
    }

    // Held camera movement
    let axes = ctx.camera.axes();
    let look = ctx.camera.front();
    let speed = CAMERA_SPEED * dt;
    let camera_moves = [
        (KeyCode::W, look),
        (KeyCode::S, -look),
        (KeyCode::D, axes.right),
        (KeyCode::A, -axes.right),
        (KeyCode::E, axes.up),
        (KeyCode::Q, -axes.up),
    ];
    for (key, direction) in camera_moves {
        if input.held(key) {
            ctx.camera.translate(direction * speed);
        }
    }

    // Held generator movement, relative to the camera
    let generator_moves = [
        (KeyCode::Right, axes.right),
        (KeyCode::Left, -axes.right),
        (KeyCode::Up, axes.up),
        (KeyCode::Down, -axes.up),
        (KeyCode::Home, look),
        (KeyCode::End, -look),
    ];
    for (key, direction) in generator_moves {
        if input.held(key) {
            ctx.move_generator(direction * GENERATOR_STEP);
        }
    }

    // Pointer
    let pointer = input.pointer;
    if pointer.moved && input.held(KeyCode::ShiftLeft) {
        ctx.camera.apply_orientation_delta(
            pointer.delta.x * MOUSE_SENSITIVITY,
            pointer.delta.y * MOUSE_SENSITIVITY,
        );
    }
    if pointer.moved && pointer.inside && input.held(KeyCode::ControlLeft) {
        ctx.place_generator_at_pointer(pointer.ndc);
    }

    response
}

/// Run one dispatch inside an acquire/release bracket.
fn bracket<K: ParticleKernel>(
    kernel: &mut K,
    buffers: &mut SharedBufferSet<K::Buffers>,
    dispatch: impl FnOnce(&mut K, &mut ComputeLease<'_, K::Buffers>),
) -> Result<()> {
    let mut lease = buffers.acquire_for_compute()?;
    dispatch(kernel, &mut lease);
    lease.release_to_graphics()?;
    Ok(())
}

/// Owns the kernel, the shared buffers and the simulation context.
pub struct RenderLoop<K: ParticleKernel> {
    kernel: K,
    buffers: SharedBufferSet<K::Buffers>,
    pub context: SimulationContext,
    time: Time,
    state: LoopState,
}

impl<K: ParticleKernel> RenderLoop<K> {
    pub fn new(kernel: K, buffers: K::Buffers, context: SimulationContext, time: Time) -> Self {
        Self {
            kernel,
            buffers: SharedBufferSet::new(buffers),
            context,
            time,
            state: LoopState::Priming,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ledger(&self) -> InteropLedger {
        self.buffers.ledger()
    }

    pub fn buffers(&self) -> &SharedBufferSet<K::Buffers> {
        &self.buffers
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Run `init` once. Does nothing after the first call.
    pub fn prime(&mut self) -> Result<()> {
        if self.state != LoopState::Priming {
            return Ok(());
        }
        let params = KernelParams::for_init(&self.context.generator);
        bracket(&mut self.kernel, &mut self.buffers, |kernel, lease| {
            kernel.init(lease, &params)
        })?;
        log::info!(
            "Initialized {} particles ({}, {})",
            self.buffers.particle_count(),
            self.context.particle_mode().name(),
            self.context.color_profile().name()
        );
        self.state = LoopState::Steady;
        Ok(())
    }

    /// External close signal (window closed).
    pub fn request_close(&mut self) {
        self.state = LoopState::Closed;
    }

    /// Run one frame. Primes first if needed; returns the state afterwards.
    pub fn frame<R>(&mut self, input: &FrameInput, renderer: &mut R) -> Result<LoopState>
    where
        R: FrameRenderer<Buffers = K::Buffers>,
    {
        self.prime()?;
        if self.state == LoopState::Closed {
            return Ok(LoopState::Closed);
        }

        let dt = self.time.update();

        let response = apply_input(&mut self.context, input, dt);
        if response.close_requested {
            log::info!("Close requested");
            self.state = LoopState::Closed;
            return Ok(LoopState::Closed);
        }

        if response.color_changed {
            let params = KernelParams::for_change_color(self.context.color_profile());
            bracket(&mut self.kernel, &mut self.buffers, |kernel, lease| {
                kernel.change_color(lease, &params)
            })?;
        }

        let params = KernelParams::for_update(
            &self.context.generator,
            self.context.is_decaying(),
            self.context.is_gravity_on(),
            dt,
        );
        bracket(&mut self.kernel, &mut self.buffers, |kernel, lease| {
            kernel.update(lease, &params)
        })?;

        let uniforms =
            RenderUniforms::from_context(&self.context, input.pointer.ndc, renderer.viewport());
        let view = self.buffers.graphics()?;
        renderer.draw(&view, &uniforms)?;

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{ColorProfile, ParticleMode, MIN_POINT_SIZE};
    use crate::input::PointerState;
    use crate::interop::Ownership;
    use crate::kernel::{CpuKernel, CpuParticles};
    use crate::projection::{Projection, ProjectionMode};
    use glam::Vec3;

    #[derive(Default)]
    struct CountingRenderer {
        draws: usize,
        last: Option<RenderUniforms>,
    }

    impl FrameRenderer for CountingRenderer {
        type Buffers = CpuParticles;

        fn viewport(&self) -> Vec2 {
            Vec2::new(800.0, 800.0)
        }

        fn draw(&mut self, buffers: &CpuParticles, uniforms: &RenderUniforms) -> Result<()> {
            assert!(!buffers.is_empty());
            self.draws += 1;
            self.last = Some(*uniforms);
            Ok(())
        }
    }

    fn context() -> SimulationContext {
        SimulationContext::new(Projection::new(54.0, 1.0))
    }

    fn new_loop(n: u32) -> RenderLoop<CpuKernel> {
        RenderLoop::new(CpuKernel::new(), CpuParticles::new(n), context(), Time::fixed(0.016))
    }

    fn press(keys: &[KeyCode]) -> FrameInput {
        FrameInput::new(keys.iter().copied(), keys.iter().copied(), PointerState::default())
    }

    fn hold(keys: &[KeyCode]) -> FrameInput {
        FrameInput::new([], keys.iter().copied(), PointerState::default())
    }

    #[test]
    fn test_priming_runs_init_once() {
        let mut lp = new_loop(64);
        assert_eq!(lp.state(), LoopState::Priming);
        lp.prime().unwrap();
        lp.prime().unwrap();
        assert_eq!(lp.state(), LoopState::Steady);
        assert_eq!(lp.ledger().acquires, 1);
        assert!(lp.buffers().inner().seeds.iter().all(|&s| s != 0));
    }

    #[test]
    fn test_frame_brackets_balance() {
        let mut lp = new_loop(64);
        let mut renderer = CountingRenderer::default();
        for _ in 0..10 {
            lp.frame(&FrameInput::default(), &mut renderer).unwrap();
        }
        let ledger = lp.ledger();
        // init + one update per frame
        assert_eq!(ledger.acquires, 11);
        assert_eq!(ledger.barriers, 11);
        assert_eq!(ledger.draws, 10);
        assert!(ledger.is_balanced());
        assert_eq!(renderer.draws, 10);
        assert_eq!(lp.buffers().owner(), Ownership::GraphicsOwned);
    }

    #[test]
    fn test_color_change_gets_its_own_bracket() {
        let mut lp = new_loop(32);
        let mut renderer = CountingRenderer::default();
        lp.frame(&FrameInput::default(), &mut renderer).unwrap();
        let before = lp.ledger().acquires;

        lp.frame(&press(&[KeyCode::C]), &mut renderer).unwrap();
        assert_eq!(lp.context.color_profile(), ColorProfile::Monochrome);
        assert_eq!(lp.ledger().acquires, before + 2);
        assert!(lp.ledger().is_balanced());
    }

    #[test]
    fn test_escape_closes_without_drawing() {
        let mut lp = new_loop(16);
        let mut renderer = CountingRenderer::default();
        let state = lp.frame(&press(&[KeyCode::Escape]), &mut renderer).unwrap();
        assert_eq!(state, LoopState::Closed);
        assert_eq!(renderer.draws, 0);

        // Closed is terminal
        lp.frame(&FrameInput::default(), &mut renderer).unwrap();
        assert_eq!(renderer.draws, 0);
        assert!(lp.ledger().is_balanced());
    }

    #[test]
    fn test_toggle_keys() {
        let mut ctx = context();
        let input = press(&[
            KeyCode::P,
            KeyCode::Z,
            KeyCode::L,
            KeyCode::G,
            KeyCode::T,
            KeyCode::X,
            KeyCode::Tab,
            KeyCode::PageUp,
        ]);
        let response = apply_input(&mut ctx, &input, 0.016);
        assert!(!response.close_requested);
        assert!(!response.color_changed);
        assert_eq!(ctx.projection_mode(), ProjectionMode::Orthographic);
        assert!(ctx.spawn_in_cube());
        assert!(!ctx.is_decaying());
        assert!(ctx.is_gravity_on());
        assert!(ctx.is_texture());
        assert!(ctx.is_shrinking());
        assert_eq!(ctx.particle_mode(), ParticleMode::FallingDown);
        assert_eq!(ctx.point_size(), 2);
    }

    #[test]
    fn test_held_keys_do_not_toggle() {
        let mut ctx = context();
        apply_input(&mut ctx, &hold(&[KeyCode::P, KeyCode::C]), 0.016);
        assert_eq!(ctx.projection_mode(), ProjectionMode::Perspective);
        assert_eq!(ctx.color_profile(), ColorProfile::Confetti);
    }

    #[test]
    fn test_held_page_keys_resize_every_frame() {
        let mut ctx = context();
        for _ in 0..5 {
            apply_input(&mut ctx, &hold(&[KeyCode::PageUp]), 0.016);
        }
        assert_eq!(ctx.point_size(), MIN_POINT_SIZE + 5);

        for _ in 0..10 {
            apply_input(&mut ctx, &hold(&[KeyCode::PageDown]), 0.016);
        }
        assert_eq!(ctx.point_size(), MIN_POINT_SIZE);
    }

    #[test]
    fn test_forward_movement_scales_with_dt() {
        let mut ctx = context();
        apply_input(&mut ctx, &hold(&[KeyCode::W]), 0.1);
        // Default camera looks down -Z from z = 5
        assert!((ctx.camera.position - Vec3::new(0.0, 0.0, 5.0 - CAMERA_SPEED * 0.1)).length() < 1e-5);

        apply_input(&mut ctx, &hold(&[KeyCode::S]), 0.1);
        assert!((ctx.camera.position - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_generator_moves_along_camera_axes() {
        let mut ctx = context();
        apply_input(&mut ctx, &hold(&[KeyCode::Right]), 0.016);
        assert!((ctx.generator.point() - Vec3::new(GENERATOR_STEP, 0.0, 0.0)).length() < 1e-6);
        apply_input(&mut ctx, &hold(&[KeyCode::Home]), 0.016);
        assert!(
            (ctx.generator.point() - Vec3::new(GENERATOR_STEP, 0.0, -GENERATOR_STEP)).length()
                < 1e-6
        );
    }

    #[test]
    fn test_shift_pointer_rotates_camera() {
        let mut ctx = context();
        let pointer = PointerState {
            delta: Vec2::new(100.0, 20.0),
            moved: true,
            inside: true,
            ..Default::default()
        };
        let input = FrameInput::new([], [KeyCode::ShiftLeft], pointer);
        apply_input(&mut ctx, &input, 0.016);
        assert!((ctx.camera.yaw() - (-90.0 + 5.0)).abs() < 1e-4);
        assert!((ctx.camera.pitch() - 1.0).abs() < 1e-4);

        // Without the modifier the pointer does nothing
        let mut ctx = context();
        apply_input(&mut ctx, &FrameInput::new([], [], pointer), 0.016);
        assert_eq!(ctx.camera.yaw(), -90.0);
    }

    #[test]
    fn test_control_pointer_places_generator_only_inside() {
        let mut ctx = context();
        let outside = PointerState {
            ndc: Vec2::new(0.5, 0.5),
            delta: Vec2::ONE,
            moved: true,
            inside: false,
        };
        apply_input(&mut ctx, &FrameInput::new([], [KeyCode::ControlLeft], outside), 0.016);
        assert_eq!(ctx.generator.point(), Vec3::ZERO);

        let inside = PointerState {
            inside: true,
            ..outside
        };
        apply_input(&mut ctx, &FrameInput::new([], [KeyCode::ControlLeft], inside), 0.016);
        assert_ne!(ctx.generator.point(), Vec3::ZERO);
        assert!(ctx.generator.point().x > 0.0 && ctx.generator.point().y > 0.0);
    }

    #[test]
    fn test_uniforms_reach_renderer() {
        let mut lp = new_loop(8);
        let mut renderer = CountingRenderer::default();
        let pointer = PointerState {
            ndc: Vec2::new(0.25, -0.75),
            ..Default::default()
        };
        lp.frame(&FrameInput::new([KeyCode::T], [KeyCode::T], pointer), &mut renderer)
            .unwrap();
        let u = renderer.last.unwrap();
        assert_eq!(u.is_texture, 1);
        assert_eq!((u.mouse_x, u.mouse_y), (0.25, -0.75));
        assert_eq!(u.viewport, [800.0, 800.0]);
    }
}
