//! Renders the frames of a Mandelbrot zoom video.
//!
//! A [`zoom::ZoomSequence`] yields one [`viewport::Viewport`] per frame, a
//! [`backend::ComputeBackend`] colours a [`frame::FrameBuffer`] for it, and an
//! [`pipeline::OutputPipeline`] writes the finished frames on a separate thread.

pub mod backend;
pub mod colour;
pub mod command_buffer;
pub mod command_encoder;
pub mod compute;
pub mod config;
pub mod error;
pub mod escape;
pub mod frame;
pub mod pipeline;
pub mod pixel;
pub mod render;
pub mod screen;
pub mod typed_buffer;
pub mod var;
pub mod viewport;
pub mod zoom;

pub use backend::{BackendKind, ComputeBackend, KernelSource};
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use frame::FrameBuffer;
pub use pipeline::{BmpSink, FrameSink, OutputPipeline, QueueEntry};
pub use pixel::Rgb;
pub use viewport::Viewport;
pub use zoom::ZoomSequence;
