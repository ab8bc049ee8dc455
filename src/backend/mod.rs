//! Frame-filling backends.

use std::{borrow::Cow, fs, path::PathBuf};

use log::info;

use crate::{
    error::{Error, Result},
    frame::FrameBuffer,
    screen,
    viewport::Viewport,
};

mod accelerated;
mod scalar;

pub use accelerated::{AcceleratorSession, Params};
pub use scalar::ScalarBackend;

/// Fills a whole frame with escape-time colours for one viewport.
pub trait ComputeBackend {
    fn name(&self) -> &'static str;

    fn fill_frame(
        &mut self,
        frame: &mut FrameBuffer,
        viewport: &Viewport,
        max_iterations: u32,
    ) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Accelerated,
    Scalar,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accelerated" | "gpu" => Ok(Self::Accelerated),
            "scalar" | "cpu" => Ok(Self::Scalar),
            other => Err(Error::config(format!(
                "unknown backend '{other}', expected 'accelerated' or 'scalar'"
            ))),
        }
    }
}

/// Where the accelerator kernel comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KernelSource {
    /// `compute.wgsl`, compiled into the binary.
    #[default]
    Embedded,
    File(PathBuf),
}

impl KernelSource {
    pub fn load(&self) -> Result<Cow<'static, str>> {
        match self {
            Self::Embedded => Ok(Cow::Borrowed(include_str!("../compute.wgsl"))),
            Self::File(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| Error::KernelSource {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// Creates the backend for `kind`. There is no fallback: if the accelerator
/// cannot be set up the error is returned.
pub fn create(
    kind: BackendKind,
    size: screen::Size,
    kernel: &KernelSource,
) -> Result<Box<dyn ComputeBackend>> {
    let backend: Box<dyn ComputeBackend> = match kind {
        BackendKind::Accelerated => Box::new(AcceleratorSession::new(size, kernel)?),
        BackendKind::Scalar => Box::new(ScalarBackend::new()),
    };
    info!("using {} backend", backend.name());
    Ok(backend)
}
