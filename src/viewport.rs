//! The window of the complex plane mapped onto the pixel grid.

use crate::{
    error::{Error, Result},
    screen,
};

/// Linear interpolation of a pixel coordinate in `[0, pixel_max]` onto
/// `[output_min, output_max]`. Pixel 0 maps exactly to `output_min`.
pub fn map(value: f64, pixel_max: f64, output_min: f64, output_max: f64) -> f64 {
    value * (output_max - output_min) / pixel_max + output_min
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Viewport {
    /// The starting window: real axis `[-2.5, 1]`, imaginary axis `[-1, 1]`.
    pub const CANONICAL: Self = Viewport {
        xmin: -2.5,
        xmax: 1.0,
        ymin: -1.0,
        ymax: 1.0,
    };

    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self> {
        // Written so that NaN bounds are rejected too.
        if !(xmax > xmin && ymax > ymin) {
            return Err(Error::config(format!(
                "viewport [{xmin}, {xmax}] x [{ymin}, {ymax}] is empty"
            )));
        }
        Ok(Self {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn centre(&self) -> (f64, f64) {
        (
            self.xmin + self.width() / 2.0,
            self.ymin + self.height() / 2.0,
        )
    }

    /// Complex point for pixel `(x, y)`. Row 0 is `ymin`.
    pub fn map_pixel(&self, x: u32, y: u32, size: screen::Size) -> (f64, f64) {
        (
            map(x as f64, size.width as f64, self.xmin, self.xmax),
            map(y as f64, size.height as f64, self.ymin, self.ymax),
        )
    }

    /// A window `factor` times smaller in both axes, centred on `(centre_x, centre_y)`.
    /// `factor` must be positive; values below 1 zoom out.
    pub fn zoom(&self, centre_x: f64, centre_y: f64, factor: f64) -> Self {
        debug_assert!(factor > 0.0, "zoom factor must be positive, got {factor}");

        let half_width = self.width() / factor / 2.0;
        let half_height = self.height() / factor / 2.0;
        Self {
            xmin: centre_x - half_width,
            xmax: centre_x + half_width,
            ymin: centre_y - half_height,
            ymax: centre_y + half_height,
        }
    }

    pub fn reset(&self) -> Self {
        Self::CANONICAL
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::CANONICAL
    }
}
