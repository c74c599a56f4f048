//! Configuration: the [`ParticleSystem`] builder and command-line parsing.
//!
//! ```ignore
//! ParticleSystem::new(100_000)
//!     .with_texture("assets/spark.png")
//!     .with_window_size(1024, 768)
//!     .run()?;
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{ParticleSystemError, Result};
use crate::gpu::{GpuParticleBuffers, RENDER_SOURCE, RENDER_SOURCE_NAME};
use crate::kernel::{KERNEL_SOURCE, KERNEL_SOURCE_NAME};
use crate::projection::Projection;
use crate::textures::SpriteTexture;

pub const SCREEN_WIDTH: u32 = 800;
pub const SCREEN_HEIGHT: u32 = 800;
/// Vertical field of view of the perspective projection, in degrees.
pub const FIELD_OF_VIEW: f32 = 54.0;
pub const WINDOW_TITLE: &str = "Particle System";
/// Edge length of the procedural sprite used without `--texture`.
pub const DEFAULT_SPRITE_SIZE: u32 = 64;

pub const USAGE: &str =
    "usage: particle-interop <n_particles> [--kernel <path>] [--shaders <path>] [--texture <path>]";

pub const CONTROLS: &str = "\
Controls:
  P              toggle perspective / orthographic projection
  Z              toggle spawn shape (sphere / cube)
  L              toggle lifetime decay
  G              toggle gravity
  T              toggle sprite texture
  X              toggle shrink with age
  Tab            next particle mode
  C              next color profile
  W/S A/D Q/E    move camera forward/back, left/right, down/up
  Arrows         move generator left/right/up/down
  Home/End       move generator away from / towards the camera
  PageUp/Down    grow / shrink points
  Shift + mouse  rotate camera
  Ctrl + mouse   place generator under the pointer
  Esc            quit";

/// A source program: its text plus the name used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: String,
    pub text: String,
}

impl ShaderSource {
    fn builtin(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ParticleSystemError::ResourceIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            name: path.display().to_string(),
            text,
        })
    }
}

/// Builder for a particle system run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    particle_count: u32,
    kernel_path: Option<PathBuf>,
    shader_path: Option<PathBuf>,
    texture_path: Option<PathBuf>,
    window_size: (u32, u32),
    fov_degrees: f32,
}

impl ParticleSystem {
    pub fn new(particle_count: u32) -> Self {
        Self {
            particle_count,
            kernel_path: None,
            shader_path: None,
            texture_path: None,
            window_size: (SCREEN_WIDTH, SCREEN_HEIGHT),
            fov_degrees: FIELD_OF_VIEW,
        }
    }

    /// Load the compute kernel from a WGSL file instead of the built-in one.
    pub fn with_kernel_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.kernel_path = Some(path.into());
        self
    }

    /// Load the render shader from a WGSL file instead of the built-in one.
    pub fn with_render_shader(mut self, path: impl Into<PathBuf>) -> Self {
        self.shader_path = Some(path.into());
        self
    }

    /// Use an image file as the point sprite.
    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture_path = Some(path.into());
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.fov_degrees = degrees;
        self
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Reject configurations no run can start from.
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            return Err(ParticleSystemError::InvalidConfig(
                "particle count must be positive".into(),
            ));
        }
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return Err(ParticleSystemError::InvalidConfig(format!(
                "window size {w}x{h} has no area"
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ParticleSystemError::InvalidConfig(format!(
                "field of view {} is outside (0, 180) degrees",
                self.fov_degrees
            )));
        }
        self.validate_for_limits(&wgpu::Limits::default())
    }

    /// Reject particle counts a device with `limits` cannot allocate or
    /// dispatch in one pass.
    pub fn validate_for_limits(&self, limits: &wgpu::Limits) -> Result<()> {
        let max = GpuParticleBuffers::max_particles(limits);
        if self.particle_count > max {
            return Err(ParticleSystemError::InvalidConfig(format!(
                "{} particles exceed the device maximum of {max}",
                self.particle_count
            )));
        }
        Ok(())
    }

    pub fn kernel_source(&self) -> Result<ShaderSource> {
        match &self.kernel_path {
            Some(path) => ShaderSource::load(path),
            None => Ok(ShaderSource::builtin(KERNEL_SOURCE_NAME, KERNEL_SOURCE)),
        }
    }

    pub fn render_source(&self) -> Result<ShaderSource> {
        match &self.shader_path {
            Some(path) => ShaderSource::load(path),
            None => Ok(ShaderSource::builtin(RENDER_SOURCE_NAME, RENDER_SOURCE)),
        }
    }

    pub fn sprite(&self) -> Result<SpriteTexture> {
        match &self.texture_path {
            Some(path) => SpriteTexture::from_file(path),
            None => Ok(SpriteTexture::soft_disc(DEFAULT_SPRITE_SIZE)),
        }
    }

    /// Projection pair for a drawable of `width` x `height` pixels.
    pub fn projection(&self, width: u32, height: u32) -> Projection {
        Projection::new(self.fov_degrees, width as f32 / height.max(1) as f32)
    }
}

/// Command-line misuse. Reported with [`USAGE`] and [`CONTROLS`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing <n_particles>")]
    MissingCount,
    #[error("invalid particle count '{0}': expected a positive integer")]
    InvalidCount(String),
    #[error("option {0} requires a path")]
    MissingValue(String),
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
    #[error("help requested")]
    HelpRequested,
}

/// Parse the arguments after the program name.
pub fn parse_args<I, S>(args: I) -> std::result::Result<ParticleSystem, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut count = None;
    let mut system = ParticleSystem::new(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(CliError::HelpRequested),
            "--kernel" | "--shaders" | "--texture" => {
                let path = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                system = match arg.as_str() {
                    "--kernel" => system.with_kernel_source(path),
                    "--shaders" => system.with_render_shader(path),
                    _ => system.with_texture(path),
                };
            }
            other if other.starts_with('-') && other.parse::<i64>().is_err() => {
                return Err(CliError::UnknownArgument(arg));
            }
            _ if count.is_none() => {
                let n = arg
                    .parse::<u32>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| CliError::InvalidCount(arg.clone()))?;
                count = Some(n);
            }
            _ => return Err(CliError::UnknownArgument(arg)),
        }
    }

    let count = count.ok_or(CliError::MissingCount)?;
    system.particle_count = count;
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_only() {
        let system = parse_args(["1000"]).unwrap();
        assert_eq!(system.particle_count(), 1000);
        assert_eq!(system.window_size(), (SCREEN_WIDTH, SCREEN_HEIGHT));
        assert!(system.validate().is_ok());
    }

    #[test]
    fn test_paths_in_any_order() {
        let system = parse_args(["--texture", "spark.png", "50", "--kernel", "k.wgsl"]).unwrap();
        assert_eq!(system.particle_count(), 50);
        assert_eq!(system.texture_path, Some(PathBuf::from("spark.png")));
        assert_eq!(system.kernel_path, Some(PathBuf::from("k.wgsl")));
        assert_eq!(system.shader_path, None);
    }

    #[test]
    fn test_rejects_non_positive_counts() {
        assert_eq!(parse_args(["0"]), Err(CliError::InvalidCount("0".into())));
        assert_eq!(parse_args(["-5"]), Err(CliError::InvalidCount("-5".into())));
        assert_eq!(parse_args(["lots"]), Err(CliError::InvalidCount("lots".into())));
        assert_eq!(parse_args(Vec::<String>::new()), Err(CliError::MissingCount));
    }

    #[test]
    fn test_option_without_value() {
        assert_eq!(
            parse_args(["10", "--shaders"]),
            Err(CliError::MissingValue("--shaders".into()))
        );
    }

    #[test]
    fn test_unknown_arguments() {
        assert_eq!(
            parse_args(["10", "--fast"]),
            Err(CliError::UnknownArgument("--fast".into()))
        );
        assert_eq!(
            parse_args(["10", "20"]),
            Err(CliError::UnknownArgument("20".into()))
        );
        assert_eq!(parse_args(["--help"]), Err(CliError::HelpRequested));
    }

    #[test]
    fn test_builtin_sources() {
        let system = ParticleSystem::new(10);
        assert_eq!(system.kernel_source().unwrap().name, KERNEL_SOURCE_NAME);
        assert!(system.render_source().unwrap().text.contains("vs_main"));
        assert_eq!(system.sprite().unwrap().width, DEFAULT_SPRITE_SIZE);
    }

    #[test]
    fn test_missing_kernel_file_is_resource_io() {
        let system = ParticleSystem::new(10).with_kernel_source("no/such/kernel.wgsl");
        let err = system.kernel_source().unwrap_err();
        assert_eq!(err.category(), "I/O error");
        assert!(err.to_string().contains("kernel.wgsl"));
    }

    #[test]
    fn test_validate() {
        assert!(ParticleSystem::new(0).validate().is_err());
        assert!(ParticleSystem::new(1).with_window_size(0, 10).validate().is_err());
        assert!(ParticleSystem::new(1).with_fov(180.0).validate().is_err());
    }

    #[test]
    fn test_validate_bounds_particle_count_by_device_limits() {
        let max = GpuParticleBuffers::max_particles(&wgpu::Limits::default());
        assert!(ParticleSystem::new(max).validate().is_ok());

        let err = ParticleSystem::new(max + 1).validate().unwrap_err();
        assert_eq!(err.category(), "Configuration error");

        // Parses fine, rejected before any device work
        let system = parse_args(["20000000"]).unwrap();
        assert!(matches!(
            system.validate(),
            Err(ParticleSystemError::InvalidConfig(_))
        ));

        let small = wgpu::Limits {
            max_compute_workgroups_per_dimension: 4,
            ..wgpu::Limits::default()
        };
        assert!(ParticleSystem::new(1024).validate_for_limits(&small).is_ok());
        assert!(ParticleSystem::new(1025).validate_for_limits(&small).is_err());
    }

    #[test]
    fn test_controls_list_every_toggle() {
        for key in ["P ", "Z ", "L ", "G ", "T ", "X ", "Tab", "C ", "Esc"] {
            assert!(CONTROLS.contains(key), "missing {key}");
        }
    }
}
