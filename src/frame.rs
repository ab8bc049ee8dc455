use crate::{
    backend::ComputeBackend,
    error::Result,
    pixel::Rgb,
    screen,
    viewport::Viewport,
};

/// One rendered image: `width * height` pixels, row-major, indexed `x + y * width`.
///
/// A frame has a single owner at a time. It is filled by the producer, moved
/// into the output queue and dropped by the persistence worker after it has
/// been written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    size: screen::Size,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    pub fn new(size: screen::Size) -> Self {
        Self {
            size,
            pixels: vec![Rgb::BLACK; size.pixel_count()],
        }
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.size.width && y < self.size.height);
        x as usize + y as usize * self.size.width as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, colour: Rgb) {
        let index = self.index(x, y);
        self.pixels[index] = colour;
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    /// Packed `r, g, b` bytes, `width * height * 3` of them.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Mutable byte view for bulk transfers. The borrow lasts exactly as long
    /// as the copy into it.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    /// Fills every pixel from `backend`.
    pub fn load_from(
        &mut self,
        backend: &mut dyn ComputeBackend,
        viewport: &Viewport,
        max_iterations: u32,
    ) -> Result<()> {
        backend.fill_frame(self, viewport, max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_access_is_row_major() {
        let mut frame = FrameBuffer::new(screen::Size::new(3, 2));
        frame.set(2, 1, Rgb::new(9, 8, 7));
        assert_eq!(frame.get(2, 1), Rgb::new(9, 8, 7));
        assert_eq!(frame.pixels()[2 + 3], Rgb::new(9, 8, 7));
        assert_eq!(&frame.as_bytes()[15..18], &[9, 8, 7]);
    }

    #[test]
    fn byte_view_covers_every_pixel() {
        let mut frame = FrameBuffer::new(screen::Size::new(5, 4));
        assert_eq!(frame.as_bytes().len(), 5 * 4 * 3);
        frame.as_bytes_mut()[..3].copy_from_slice(&[1, 2, 3]);
        assert_eq!(frame.get(0, 0), Rgb::new(1, 2, 3));
    }
}
