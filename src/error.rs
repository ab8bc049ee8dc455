use std::{io, path::PathBuf};

use crate::screen;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no compatible compute adapter found")]
    NoAdapter,

    #[error("failed to open compute device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to read kernel source {path:?}: {source}")]
    KernelSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("kernel build failed: {0}")]
    KernelBuild(String),

    #[error("kernel dispatch failed: {0}")]
    Dispatch(String),

    #[error("device readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("frame is {actual:?} but the backend renders {expected:?}")]
    FrameSize {
        expected: screen::Size,
        actual: screen::Size,
    },

    #[error("failed to save frame {index}: {source}")]
    Save {
        index: u64,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("frame {actual} submitted out of order, expected {expected}")]
    OutOfOrder { expected: u64, actual: u64 },

    #[error("output pipeline is closed")]
    PipelineClosed,

    #[error("persistence worker panicked")]
    WorkerPanicked,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }
}
