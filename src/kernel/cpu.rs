//! CPU reference kernel.
//!
//! Follows `kernel.wgsl` statement for statement over plain vectors: same
//! draw order, same constants, same branch structure. Tests and benches run
//! against it; the GPU path is never read back during a frame.

use glam::{Vec3, Vec4};

use super::rng::{seed_from_index, ParticleRng};
use super::{
    KernelParams, ParticleKernel, EXPLOSION_DRAG, FALLING_ACCELERATION, FOUNTAIN_GRAVITY,
    GRAVITY_MODIFIER, LIFETIME_MAX, LIFETIME_MIN, NOVA_KICK, RAINBOW_PERIOD, SPAWN_EXTENT,
    VORTEX_PULL, VORTEX_SWIRL,
};
use crate::controls::{ColorProfile, ParticleMode};
use crate::error::InteropError;
use crate::interop::{ComputeLease, SharedBuffers};
use crate::math::normalize;

/// Particle buffers in host memory, one slot per particle index.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuParticles {
    pub positions: Vec<Vec4>,
    pub colors: Vec<Vec4>,
    pub lifetimes: Vec<f32>,
    pub velocities: Vec<Vec4>,
    pub seeds: Vec<u64>,
}

impl CpuParticles {
    /// Zeroed buffers for `count` particles; run `init` before use.
    pub fn new(count: u32) -> Self {
        let n = count as usize;
        Self {
            positions: vec![Vec4::ZERO; n],
            colors: vec![Vec4::ZERO; n],
            lifetimes: vec![0.0; n],
            velocities: vec![Vec4::ZERO; n],
            seeds: vec![0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl SharedBuffers for CpuParticles {
    // Work happens eagerly inside the kernel call.
    type Work = ();

    fn particle_count(&self) -> u32 {
        self.positions.len() as u32
    }

    fn submit(&mut self, _work: Vec<()>) -> Result<(), InteropError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), InteropError> {
        Ok(())
    }
}

/// Single-threaded implementation of the three entry points.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuKernel;

impl CpuKernel {
    pub fn new() -> Self {
        Self
    }

    pub fn init_particles(&self, particles: &mut CpuParticles, params: &KernelParams) {
        let n = particles.len() as u32;
        for i in 0..n {
            let mut rng = ParticleRng::new(seed_from_index(i));
            spawn(particles, i, n, params, &mut rng);
            particles.seeds[i as usize] = rng.state();
        }
    }

    pub fn update_particles(&self, particles: &mut CpuParticles, params: &KernelParams) {
        let n = particles.len() as u32;
        let dt = params.delta_time;
        let generator = params.generator_point();

        for i in 0..n {
            let idx = i as usize;
            let mut rng = ParticleRng::new(particles.seeds[idx]);
            let p = particles.positions[idx].truncate();
            let mut v = particles.velocities[idx].truncate();

            match params.particle_mode() {
                ParticleMode::Stationary => v = Vec3::ZERO,
                ParticleMode::FallingDown => v.y -= FALLING_ACCELERATION * dt,
                ParticleMode::GravityFountain => v.y -= FOUNTAIN_GRAVITY * dt,
                ParticleMode::RadialExplosion => v *= (1.0 - EXPLOSION_DRAG * dt).max(0.0),
                ParticleMode::ChaosNova => {
                    let u = Vec3::from_array(rng.next_vec3());
                    v += (u * 2.0 - Vec3::ONE) * NOVA_KICK * dt;
                }
                ParticleMode::VortexAttractor => {
                    let r = p - generator;
                    v = normalize(Vec3::new(-r.z, 0.0, r.x)) * VORTEX_SWIRL - r * VORTEX_PULL;
                }
            }

            if params.is_gravity_on != 0 {
                v.y -= GRAVITY_MODIFIER * dt;
            }

            particles.positions[idx] = (p + v * dt).extend(1.0);
            particles.velocities[idx] = v.extend(0.0);

            if params.is_decaying != 0 {
                let remaining = particles.lifetimes[idx] - dt;
                if remaining <= 0.0 {
                    spawn(particles, i, n, params, &mut rng);
                } else {
                    particles.lifetimes[idx] = remaining;
                }
            }

            if params.color_profile() == ColorProfile::RainbowDash {
                particles.colors[idx] = rainbow(i, n, particles.lifetimes[idx]);
            }

            particles.seeds[idx] = rng.state();
        }
    }

    pub fn recolor_particles(&self, particles: &mut CpuParticles, params: &KernelParams) {
        let n = particles.len() as u32;
        let profile = params.color_profile();
        for i in 0..n {
            let idx = i as usize;
            let mut rng = ParticleRng::new(particles.seeds[idx]);
            particles.colors[idx] = profile_color(profile, i, n, 0.0, &mut rng);
            particles.seeds[idx] = rng.state();
        }
    }
}

impl ParticleKernel for CpuKernel {
    type Buffers = CpuParticles;

    fn init(&mut self, lease: &mut ComputeLease<'_, CpuParticles>, params: &KernelParams) {
        self.init_particles(lease.buffers(), params);
        lease.enqueue(());
    }

    fn update(&mut self, lease: &mut ComputeLease<'_, CpuParticles>, params: &KernelParams) {
        self.update_particles(lease.buffers(), params);
        lease.enqueue(());
    }

    fn change_color(&mut self, lease: &mut ComputeLease<'_, CpuParticles>, params: &KernelParams) {
        self.recolor_particles(lease.buffers(), params);
        lease.enqueue(());
    }
}

fn spawn(particles: &mut CpuParticles, i: u32, n: u32, params: &KernelParams, rng: &mut ParticleRng) {
    let idx = i as usize;
    let offset = spawn_offset(params.spawn_in_cube != 0, rng);
    let velocity = spawn_velocity(params.particle_mode(), offset, rng);
    let lifetime = LIFETIME_MIN + (LIFETIME_MAX - LIFETIME_MIN) * rng.next_f32();

    particles.positions[idx] = (params.generator_point() + offset).extend(1.0);
    particles.velocities[idx] = velocity.extend(0.0);
    particles.lifetimes[idx] = lifetime;
    particles.colors[idx] = profile_color(params.color_profile(), i, n, lifetime, rng);
}

/// Offset from the generator, uniform in the cube or the ball.
pub fn spawn_offset(in_cube: bool, rng: &mut ParticleRng) -> Vec3 {
    let u = Vec3::from_array(rng.next_vec3());
    if in_cube {
        return (u * 2.0 - Vec3::ONE) * SPAWN_EXTENT;
    }
    let cos_theta = u.x * 2.0 - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = std::f32::consts::TAU * u.y;
    let r = SPAWN_EXTENT * u.z.cbrt();
    Vec3::new(
        r * sin_theta * phi.cos(),
        r * sin_theta * phi.sin(),
        r * cos_theta,
    )
}

/// Launch velocity for `mode`. Always consumes three draws.
pub fn spawn_velocity(mode: ParticleMode, offset: Vec3, rng: &mut ParticleRng) -> Vec3 {
    let u = Vec3::from_array(rng.next_vec3());
    match mode {
        ParticleMode::GravityFountain => Vec3::new(u.x * 0.8 - 0.4, 2.5 + u.y, u.z * 0.8 - 0.4),
        ParticleMode::RadialExplosion => normalize(offset) * (0.8 + 1.2 * u.x),
        ParticleMode::ChaosNova => (u * 2.0 - Vec3::ONE) * 0.5,
        ParticleMode::Stationary | ParticleMode::FallingDown | ParticleMode::VortexAttractor => {
            Vec3::ZERO
        }
    }
}

/// Color for particle `i` of `n`. Always consumes three draws.
pub fn profile_color(
    profile: ColorProfile,
    i: u32,
    n: u32,
    lifetime: f32,
    rng: &mut ParticleRng,
) -> Vec4 {
    let u = Vec3::from_array(rng.next_vec3());
    let rgb = match profile {
        ColorProfile::Confetti => u,
        ColorProfile::Monochrome => hsv_to_rgb(0.58, 0.8, 0.3 + 0.7 * u.x),
        ColorProfile::RedAndWhite => {
            if u.x < 0.5 {
                Vec3::new(1.0, 0.0, 0.0)
            } else {
                Vec3::ONE
            }
        }
        ColorProfile::CyanMagentaYellow => match ((u.x * 3.0) as u32).min(2) {
            0 => Vec3::new(0.0, 1.0, 1.0),
            1 => Vec3::new(1.0, 0.0, 1.0),
            _ => Vec3::new(1.0, 1.0, 0.0),
        },
        ColorProfile::RainbowDash => return rainbow(i, n, lifetime),
    };
    rgb.extend(1.0)
}

pub fn rainbow(i: u32, n: u32, lifetime: f32) -> Vec4 {
    let phase = i as f32 / n as f32 + lifetime / RAINBOW_PERIOD;
    let hue = phase - phase.floor();
    hsv_to_rgb(hue, 1.0, 1.0).extend(1.0)
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let k = (Vec3::new(5.0, 3.0, 1.0) + Vec3::splat(h * 6.0)) % 6.0;
    let ramp = k.min(Vec3::splat(4.0) - k).clamp(Vec3::ZERO, Vec3::ONE);
    Vec3::splat(v) - v * s * ramp
}
