//! Frame timing.
//!
//! The loop is not throttled; frame time is measured and handed to the
//! update kernel as its integration step.
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // In the frame loop:
//! let dt = time.update();
//! log::debug!("frame {} took {:.4}s ({:.0} fps)", time.frame(), dt, time.fps());
//! ```

use std::time::{Duration, Instant};

/// Largest step handed to the kernel, in seconds.
pub const MAX_DELTA: f32 = 0.1;

/// Time tracking for the render loop.
///
/// The measured frame time is clamped to [`MAX_DELTA`] before it reaches the
/// kernel, so a stalled frame integrates at most one 0.1 s step instead of
/// the full wall-clock gap.
#[derive(Debug)]
pub struct Time {
    /// When the timer was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Time since last frame in seconds, clamped to [`MAX_DELTA`].
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
        }
    }

    /// Tracker that always reports the same step. Used by headless runs and tests.
    pub fn fixed(delta: f32) -> Self {
        let mut time = Self::new();
        time.fixed_delta = Some(delta);
        time
    }

    /// Sample the clock. Call once per frame; returns the step in seconds.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta).clamp(0.0, MAX_DELTA);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total elapsed time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
