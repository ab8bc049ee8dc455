//! Escape-time evaluation of the quadratic Mandelbrot map `z -> z^2 + c`.
//!
//! This is the reference the accelerator kernel (`compute.wgsl`) mirrors in
//! 32-bit floats.

use crate::{colour, pixel::Rgb, screen, viewport::Viewport};

/// Squared escape radius.
pub const BAILOUT: f64 = 4.0;

/// Outcome of iterating a single point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Escape {
    /// Still bounded after the iteration budget.
    Interior,
    Escaped { iteration: u32, modulus: f64 },
}

pub fn iterate(cx: f64, cy: f64, max_iterations: u32) -> Escape {
    let (mut zx, mut zy) = (0.0f64, 0.0f64);
    let mut iteration = 0;
    while zx * zx + zy * zy < BAILOUT && iteration < max_iterations {
        let next_x = zx * zx - zy * zy + cx;
        zy = 2.0 * zx * zy + cy;
        zx = next_x;
        iteration += 1;
    }

    if iteration == max_iterations {
        Escape::Interior
    } else {
        Escape::Escaped {
            iteration,
            modulus: (zx * zx + zy * zy).sqrt(),
        }
    }
}

/// Smooth-coloured escape colour of the complex point `(cx, cy)`. Interior
/// points are black.
pub fn escape_colour(cx: f64, cy: f64, max_iterations: u32) -> Rgb {
    match iterate(cx, cy, max_iterations) {
        Escape::Interior => Rgb::BLACK,
        Escape::Escaped { iteration, modulus } => {
            let smoothed = colour::smooth_iteration(iteration, modulus);
            colour::hsv_to_rgb(colour::hue(smoothed, max_iterations), 1.0, 1.0)
        }
    }
}

/// Colour of pixel `(x, y)` of a `size` grid laid over `viewport`.
pub fn evaluate(
    x: u32,
    y: u32,
    size: screen::Size,
    viewport: &Viewport,
    max_iterations: u32,
) -> Rgb {
    let (cx, cy) = viewport.map_pixel(x, y, size);
    escape_colour(cx, cy, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_interior() {
        for depth in [2, 3, 50, 1000] {
            assert_eq!(escape_colour(0.0, 0.0, depth), Rgb::BLACK);
        }
    }

    #[test]
    fn zero_depth_is_black() {
        assert_eq!(escape_colour(5.0, 5.0, 0), Rgb::BLACK);
    }

    #[test]
    fn far_point_escapes_after_one_step() {
        match iterate(5.0, 5.0, 50) {
            Escape::Escaped { iteration, modulus } => {
                assert_eq!(iteration, 1);
                assert!((modulus - 50f64.sqrt()).abs() < 1e-12);
            }
            Escape::Interior => panic!("(5, 5) should escape"),
        }
    }

    #[test]
    fn far_point_colour_is_deterministic_and_not_black() {
        let first = escape_colour(5.0, 5.0, 50);
        let second = escape_colour(5.0, 5.0, 50);
        assert!(!first.is_black());
        assert_eq!(first, second);
        // Smoothed count ~1.03 of 50: the red sector.
        assert_eq!(first.r, 255);
        assert_eq!(first.b, 0);
    }

    #[test]
    fn evaluate_maps_through_the_viewport() {
        let size = screen::Size::new(16, 16);
        let far = Viewport::new(5.0, 6.0, 5.0, 6.0).unwrap();
        assert_eq!(evaluate(0, 0, size, &far, 50), escape_colour(5.0, 5.0, 50));

        // Pixel (10, 8) of the canonical window is c = (-0.3125, 0): inside the cardioid.
        assert_eq!(evaluate(10, 8, size, &Viewport::CANONICAL, 50), Rgb::BLACK);
    }
}
