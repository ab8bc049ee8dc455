use std::{
    fs,
    io::{self, Write},
    path::Path,
    time::{Duration, Instant},
};

use log::{info, trace};

use crate::{
    backend::ComputeBackend,
    config::RenderConfig,
    error::{Error, Result},
    frame::FrameBuffer,
    pipeline::{self, FrameSink, OutputPipeline, QueueEntry},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames_produced: u64,
    pub frames_written: usize,
    pub elapsed: Duration,
}

/// Best-effort removal of `<directory>/<i>.bmp` for `i in 0..upper_bound`.
/// Missing or locked files are skipped.
pub fn remove_stale_frames(directory: &Path, upper_bound: u64) -> usize {
    let mut removed = 0;
    for index in 0..upper_bound {
        let path = pipeline::frame_path(directory, index);
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => trace!("could not remove {}: {err}", path.display()),
        }
    }
    if removed > 0 {
        info!("removed {removed} stale frames from {}", directory.display());
    }
    removed
}

/// Renders every viewport of the configured zoom sequence with `backend` and
/// hands each frame to `sink` through an [`OutputPipeline`].
///
/// A backend error stops the run; frames already queued are still written
/// before the error is returned. A sink error stops the run with that error.
pub fn run(
    config: &RenderConfig,
    backend: &mut dyn ComputeBackend,
    sink: impl FrameSink + 'static,
) -> Result<RenderSummary> {
    run_with_progress(config, backend, sink, &mut io::stdout())
}

/// [`run`], writing the progress line to `progress` instead of stdout.
pub fn run_with_progress(
    config: &RenderConfig,
    backend: &mut dyn ComputeBackend,
    sink: impl FrameSink + 'static,
    progress: &mut dyn Write,
) -> Result<RenderSummary> {
    config.validate()?;

    let start = Instant::now();
    let sequence = config.zoom_sequence();
    let output = OutputPipeline::new(sink, config.queue_capacity)?;
    info!(
        "rendering {} frames of {}x{} at depth {} with the {} backend",
        sequence.len(),
        config.size.width,
        config.size.height,
        config.max_iterations,
        backend.name()
    );

    let mut frames_produced = 0;
    for (index, viewport) in (0u64..).zip(&sequence) {
        let mut frame = FrameBuffer::new(config.size);
        frame.load_from(backend, &viewport, config.max_iterations)?;
        match output.push(QueueEntry {
            sequence_index: index,
            frame,
        }) {
            Ok(()) => {}
            // The worker stopped on a sink error; report that instead.
            Err(Error::PipelineClosed) => {
                let _ = writeln!(progress);
                return Err(output.finish().err().unwrap_or(Error::PipelineClosed));
            }
            Err(err) => return Err(err),
        }
        frames_produced = index + 1;

        let _ = write!(
            progress,
            "\rframes: {}, queue depth: {}, queue capacity: {}          ",
            frames_produced,
            output.depth(),
            output.capacity()
        );
        let _ = progress.flush();
    }
    let _ = writeln!(progress);

    info!("all frames produced, waiting for {} queued frames", output.depth());
    let frames_written = output.finish()?;

    let summary = RenderSummary {
        frames_produced,
        frames_written,
        elapsed: start.elapsed(),
    };
    info!(
        "wrote {} frames in {:.1?}",
        summary.frames_written, summary.elapsed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_frames_are_removed_and_missing_ones_ignored() {
        let dir = tempfile::tempdir().unwrap();
        for index in [0, 2, 5] {
            fs::write(pipeline::frame_path(dir.path(), index), b"old").unwrap();
        }
        fs::write(dir.path().join("keep.txt"), b"keep").unwrap();

        assert_eq!(remove_stale_frames(dir.path(), 4), 2);
        assert!(pipeline::frame_path(dir.path(), 5).exists());
        assert!(dir.path().join("keep.txt").exists());

        assert_eq!(remove_stale_frames(dir.path(), 10), 1);
        assert_eq!(remove_stale_frames(Path::new("/definitely/not/here"), 3), 0);
    }
}
