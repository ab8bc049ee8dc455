//! The sequence of viewports that makes up a zoom video.

use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Zooms into each focal point for `iterations_per_phase` frames, back out for
/// the same number of frames, then resets to [`Viewport::CANONICAL`] before the
/// next focal point.
///
/// The sequence holds only parameters; [`ZoomSequence::iter`] starts a fresh
/// walk every time it is called.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomSequence {
    focal_points: Vec<(f64, f64)>,
    iterations_per_phase: usize,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
}

impl ZoomSequence {
    pub fn new(
        focal_points: Vec<(f64, f64)>,
        iterations_per_phase: usize,
        zoom_in_factor: f64,
        zoom_out_factor: f64,
    ) -> Self {
        Self {
            focal_points,
            iterations_per_phase,
            zoom_in_factor,
            zoom_out_factor,
        }
    }

    /// Total number of viewports: two phases per focal point.
    pub fn len(&self) -> usize {
        self.focal_points.len() * 2 * self.iterations_per_phase
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> ZoomIter<'_> {
        ZoomIter {
            sequence: self,
            viewport: Viewport::CANONICAL,
            point: 0,
            direction: Direction::In,
            step: 0,
            emitted: 0,
        }
    }

    fn factor(&self, direction: Direction) -> f64 {
        match direction {
            Direction::In => self.zoom_in_factor,
            Direction::Out => self.zoom_out_factor,
        }
    }
}

impl<'a> IntoIterator for &'a ZoomSequence {
    type Item = Viewport;
    type IntoIter = ZoomIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ZoomIter<'a> {
    sequence: &'a ZoomSequence,
    viewport: Viewport,
    point: usize,
    direction: Direction,
    step: usize,
    emitted: usize,
}

impl<'a> ZoomIter<'a> {
    /// The viewport the next call to `next` will emit.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Index of the focal point currently being zoomed.
    pub fn focal_point(&self) -> usize {
        self.point
    }

    fn advance(&mut self) {
        self.step += 1;
        if self.step < self.sequence.iterations_per_phase {
            return;
        }

        self.step = 0;
        match self.direction {
            Direction::In => self.direction = Direction::Out,
            Direction::Out => {
                self.direction = Direction::In;
                self.point += 1;
                self.viewport = self.viewport.reset();
            }
        }
    }
}

impl<'a> Iterator for ZoomIter<'a> {
    type Item = Viewport;

    fn next(&mut self) -> Option<Viewport> {
        if self.sequence.iterations_per_phase == 0 {
            return None;
        }
        let &(x, y) = self.sequence.focal_points.get(self.point)?;

        let current = self.viewport;
        self.viewport = current.zoom(x, y, self.sequence.factor(self.direction));
        self.emitted += 1;
        self.advance();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len() - self.emitted;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for ZoomIter<'a> {}
