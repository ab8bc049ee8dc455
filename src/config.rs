//! Render parameters. Everything is compiled in; two environment variables
//! can redirect the backend and the output directory without a rebuild.

use std::{env, path::PathBuf};

use crate::{
    backend::{BackendKind, KernelSource},
    error::{Error, Result},
    screen,
    zoom::ZoomSequence,
};

pub const BACKEND_VAR: &str = "MANDELBROT_ZOOM_BACKEND";
pub const OUT_DIR_VAR: &str = "MANDELBROT_ZOOM_OUT_DIR";

/// Seahorse valley.
pub const DEFAULT_FOCAL_POINT: (f64, f64) = (-0.743643887037151, 0.131825904205330);

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub size: screen::Size,
    pub max_iterations: u32,
    pub focal_points: Vec<(f64, f64)>,
    pub iterations_per_phase: usize,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    pub queue_capacity: usize,
    pub output_dir: PathBuf,
    /// Frames `0..stale_frame_bound` left by an earlier run are deleted first.
    pub stale_frame_bound: u64,
    pub backend: BackendKind,
    pub kernel: KernelSource,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: screen::Size::new(1920, 1080),
            max_iterations: 10_000,
            focal_points: vec![DEFAULT_FOCAL_POINT],
            iterations_per_phase: 2400,
            zoom_in_factor: 1.015,
            zoom_out_factor: 0.970873786407767,
            queue_capacity: 64,
            output_dir: PathBuf::from("."),
            stale_frame_bound: 10_000,
            backend: BackendKind::Accelerated,
            kernel: KernelSource::Embedded,
        }
    }
}

impl RenderConfig {
    /// Defaults, with [`BACKEND_VAR`] and [`OUT_DIR_VAR`] applied when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(backend) = env::var(BACKEND_VAR) {
            config.backend = backend.parse()?;
        }
        if let Some(dir) = env::var_os(OUT_DIR_VAR) {
            config.output_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.is_empty() {
            return Err(Error::config("frame width/height must be non-zero"));
        }
        if self.focal_points.is_empty() {
            return Err(Error::config("at least one focal point is required"));
        }
        if self.iterations_per_phase == 0 {
            return Err(Error::config("iterations per phase must be non-zero"));
        }
        for (name, factor) in [
            ("zoom-in", self.zoom_in_factor),
            ("zoom-out", self.zoom_out_factor),
        ] {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(Error::config(format!(
                    "{name} factor must be positive and finite, got {factor}"
                )));
            }
        }
        if self
            .focal_points
            .iter()
            .any(|(x, y)| !(x.is_finite() && y.is_finite()))
        {
            return Err(Error::config("focal points must be finite"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("output queue capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn zoom_sequence(&self) -> ZoomSequence {
        ZoomSequence::new(
            self.focal_points.clone(),
            self.iterations_per_phase,
            self.zoom_in_factor,
            self.zoom_out_factor,
        )
    }
}
