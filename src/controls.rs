//! Simulation context: every user-facing toggle, the camera and the generator.
//!
//! State is mutated only through the named operations below. The render loop
//! owns one [`SimulationContext`] and passes it by reference into each frame,
//! so tests can build a context in any state without a window.

use glam::{Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::projection::{Projection, ProjectionMode};

/// Motion rule applied to every particle by the update kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ParticleMode {
    #[default]
    Stationary = 0,
    FallingDown = 1,
    GravityFountain = 2,
    RadialExplosion = 3,
    ChaosNova = 4,
    VortexAttractor = 5,
}

impl ParticleMode {
    pub const ALL: [ParticleMode; 6] = [
        ParticleMode::Stationary,
        ParticleMode::FallingDown,
        ParticleMode::GravityFountain,
        ParticleMode::RadialExplosion,
        ParticleMode::ChaosNova,
        ParticleMode::VortexAttractor,
    ];

    /// Number of modes.
    pub const fn count() -> usize {
        Self::ALL.len()
    }

    /// Kernel id of this mode.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Mode for a kernel id; ids wrap around.
    pub fn from_id(id: i32) -> Self {
        Self::ALL[id.rem_euclid(Self::count() as i32) as usize]
    }

    /// The following mode, wrapping after the last one.
    pub fn next(self) -> Self {
        Self::from_id(self.id() + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            ParticleMode::Stationary => "Stationary",
            ParticleMode::FallingDown => "Falling Down",
            ParticleMode::GravityFountain => "Gravity Fountain",
            ParticleMode::RadialExplosion => "Radial Explosion",
            ParticleMode::ChaosNova => "Chaos Nova",
            ParticleMode::VortexAttractor => "Vortex Attractor",
        }
    }
}

/// Rule mapping a particle's stream, index and lifetime to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ColorProfile {
    #[default]
    Confetti = 0,
    Monochrome = 1,
    RedAndWhite = 2,
    CyanMagentaYellow = 3,
    RainbowDash = 4,
}

impl ColorProfile {
    pub const ALL: [ColorProfile; 5] = [
        ColorProfile::Confetti,
        ColorProfile::Monochrome,
        ColorProfile::RedAndWhite,
        ColorProfile::CyanMagentaYellow,
        ColorProfile::RainbowDash,
    ];

    pub const fn count() -> usize {
        Self::ALL.len()
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Self {
        Self::ALL[id.rem_euclid(Self::count() as i32) as usize]
    }

    pub fn next(self) -> Self {
        Self::from_id(self.id() + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorProfile::Confetti => "Confetti",
            ColorProfile::Monochrome => "Monochrome",
            ColorProfile::RedAndWhite => "Red and White",
            ColorProfile::CyanMagentaYellow => "Cyan Magenta Yellow",
            ColorProfile::RainbowDash => "Rainbow Dash",
        }
    }
}

/// Spawn point and spawn rules passed by value into every kernel dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorState {
    /// Homogeneous spawn point, `w` is always 1.
    pub position: Vec4,
    pub spawn_in_cube: bool,
    pub particle_mode: ParticleMode,
    pub color_profile: ColorProfile,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self {
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            spawn_in_cube: false,
            particle_mode: ParticleMode::default(),
            color_profile: ColorProfile::default(),
        }
    }
}

impl GeneratorState {
    pub fn point(&self) -> Vec3 {
        self.position.truncate()
    }

    /// Move the spawn point, keeping `w = 1`.
    pub fn set_point(&mut self, point: Vec3) {
        self.position = point.extend(1.0);
    }
}

/// Smallest point size in pixels.
pub const MIN_POINT_SIZE: i32 = 1;

/// Everything the user can change while the simulation runs.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub camera: Camera,
    pub generator: GeneratorState,
    projection: Projection,
    is_decaying: bool,
    is_gravity_on: bool,
    is_texture: bool,
    is_shrinking: bool,
    point_size: i32,
}

impl SimulationContext {
    pub fn new(projection: Projection) -> Self {
        Self {
            camera: Camera::new(),
            generator: GeneratorState::default(),
            projection,
            is_decaying: true,
            is_gravity_on: false,
            is_texture: false,
            is_shrinking: false,
            point_size: MIN_POINT_SIZE,
        }
    }

    // ========== Queries ==========

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection.mode()
    }

    pub fn spawn_in_cube(&self) -> bool {
        self.generator.spawn_in_cube
    }

    pub fn is_decaying(&self) -> bool {
        self.is_decaying
    }

    pub fn is_gravity_on(&self) -> bool {
        self.is_gravity_on
    }

    pub fn is_texture(&self) -> bool {
        self.is_texture
    }

    pub fn is_shrinking(&self) -> bool {
        self.is_shrinking
    }

    pub fn particle_mode(&self) -> ParticleMode {
        self.generator.particle_mode
    }

    pub fn color_profile(&self) -> ColorProfile {
        self.generator.color_profile
    }

    pub fn point_size(&self) -> i32 {
        self.point_size
    }

    // ========== Toggles ==========

    pub fn toggle_projection_mode(&mut self) -> ProjectionMode {
        let mode = self.projection.mode().toggled();
        self.projection.set_mode(mode);
        log::info!("Projection: {}", mode.name());
        mode
    }

    pub fn toggle_spawn_location(&mut self) -> bool {
        self.generator.spawn_in_cube = !self.generator.spawn_in_cube;
        log::info!(
            "Spawn in: {}",
            if self.generator.spawn_in_cube { "Cube" } else { "Sphere" }
        );
        self.generator.spawn_in_cube
    }

    pub fn toggle_lifetime(&mut self) -> bool {
        self.is_decaying = !self.is_decaying;
        log::info!("Life decay: {}", on_off(self.is_decaying));
        self.is_decaying
    }

    pub fn toggle_gravity(&mut self) -> bool {
        self.is_gravity_on = !self.is_gravity_on;
        log::info!("Gravity mod: {}", on_off(self.is_gravity_on));
        self.is_gravity_on
    }

    pub fn toggle_texture(&mut self) -> bool {
        self.is_texture = !self.is_texture;
        log::info!("Texture: {}", on_off(self.is_texture));
        self.is_texture
    }

    pub fn toggle_shrinking(&mut self) -> bool {
        self.is_shrinking = !self.is_shrinking;
        log::info!("Shrinking: {}", on_off(self.is_shrinking));
        self.is_shrinking
    }

    pub fn toggle_particle_mode(&mut self) -> ParticleMode {
        self.generator.particle_mode = self.generator.particle_mode.next();
        log::info!("Particle Mode: {}", self.generator.particle_mode.name());
        self.generator.particle_mode
    }

    /// Select the next color profile. The caller is responsible for running
    /// the `change_color` kernel afterwards.
    pub fn toggle_color_profile(&mut self) -> ColorProfile {
        self.generator.color_profile = self.generator.color_profile.next();
        log::info!("Color Profile: {}", self.generator.color_profile.name());
        self.generator.color_profile
    }

    // ========== Continuous adjustments ==========

    /// Grow or shrink the point size, never below [`MIN_POINT_SIZE`].
    pub fn adjust_point_size(&mut self, offset: i32) -> i32 {
        self.point_size = self.point_size.saturating_add(offset).max(MIN_POINT_SIZE);
        self.point_size
    }

    /// Shift the generator by a world-space offset.
    pub fn move_generator(&mut self, offset: Vec3) {
        let point = self.generator.point() + offset;
        self.generator.set_point(point);
    }

    /// Place the generator under the pointer, keeping its distance to the camera.
    pub fn place_generator_at_pointer(&mut self, ndc: Vec2) {
        let distance = (self.generator.point() - self.camera.position).length();
        let point = self.camera.unproject(ndc, distance);
        self.generator.set_point(point);
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "On"
    } else {
        "Off"
    }
}
