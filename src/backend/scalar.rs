use log::trace;
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use super::ComputeBackend;
use crate::{error::Result, escape, frame::FrameBuffer, viewport::Viewport};

/// Parallel CPU fallback.
///
/// The frame is split into one band of whole rows per worker. Bands are
/// contiguous, disjoint slices of the pixel buffer, so every worker writes its
/// pixels in place without any locking.
pub struct ScalarBackend {
    workers: usize,
}

impl ScalarBackend {
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get())
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ScalarBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for ScalarBackend {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn fill_frame(
        &mut self,
        frame: &mut FrameBuffer,
        viewport: &Viewport,
        max_iterations: u32,
    ) -> Result<()> {
        let size = frame.size();
        if size.is_empty() {
            return Ok(());
        }

        let width = size.width as usize;
        let rows_per_band = (size.height as usize + self.workers - 1) / self.workers;
        trace!(
            "filling {}x{} frame in bands of {} rows",
            size.width,
            size.height,
            rows_per_band
        );

        frame
            .pixels_mut()
            .par_chunks_mut(rows_per_band * width)
            .enumerate()
            .for_each(|(band, pixels)| {
                let first_row = band * rows_per_band;
                for (offset, pixel) in pixels.iter_mut().enumerate() {
                    let x = (offset % width) as u32;
                    let y = (first_row + offset / width) as u32;
                    *pixel = escape::evaluate(x, y, size, viewport, max_iterations);
                }
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pixel::Rgb, screen};

    fn reference(size: screen::Size, viewport: &Viewport, depth: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(size);
        for y in 0..size.height {
            for x in 0..size.width {
                frame.set(x, y, escape::evaluate(x, y, size, viewport, depth));
            }
        }
        frame
    }

    #[test]
    fn matches_sequential_evaluation_for_any_worker_count() {
        let size = screen::Size::new(17, 11);
        let viewport = Viewport::CANONICAL;
        let expected = reference(size, &viewport, 40);

        for workers in [1, 2, 3, 8, 64] {
            let mut frame = FrameBuffer::new(size);
            ScalarBackend::with_workers(workers)
                .fill_frame(&mut frame, &viewport, 40)
                .unwrap();
            assert_eq!(frame, expected, "{workers} workers");
        }
    }

    #[test]
    fn interior_and_exterior_both_appear() {
        let size = screen::Size::new(16, 16);
        let mut frame = FrameBuffer::new(size);
        ScalarBackend::new()
            .fill_frame(&mut frame, &Viewport::CANONICAL, 50)
            .unwrap();
        assert!(frame.pixels().iter().any(|pixel| *pixel == Rgb::BLACK));
        assert!(frame.pixels().iter().any(|pixel| *pixel != Rgb::BLACK));
    }

    #[test]
    fn empty_frame_is_a_no_op() {
        let mut frame = FrameBuffer::new(screen::Size::new(0, 4));
        ScalarBackend::with_workers(0)
            .fill_frame(&mut frame, &Viewport::CANONICAL, 50)
            .unwrap();
        assert!(frame.pixels().is_empty());
    }
}
