//! Colouring algorithms.

use crate::pixel::Rgb;

/// Continuous iteration estimate for a point that escaped after `iteration`
/// steps with final modulus `modulus` ([Wikipedia](https://en.wikipedia.org/wiki/Plotting_algorithms_for_the_Mandelbrot_set#Continuous_(smooth)_coloring)).
///
/// `ln(ln |z|)` is undefined for `|z| <= 1`, which only happens if the escape
/// test is bypassed. The raw count is returned in that case so the result is
/// never NaN.
pub fn smooth_iteration(iteration: u32, modulus: f64) -> f64 {
    let log_modulus = modulus.ln();
    if log_modulus > 0.0 {
        iteration as f64 + 1.0 - log_modulus.ln() / std::f64::consts::LN_2
    } else {
        iteration as f64
    }
}

/// Normalises a smoothed count to a hue in `[0, 1)`. Counts past
/// `max_iterations` wrap around the colour wheel.
pub fn hue(smoothed: f64, max_iterations: u32) -> f64 {
    let hue = (smoothed / max_iterations as f64).rem_euclid(1.0);
    if hue.is_finite() {
        hue
    } else {
        0.0
    }
}

/// Six-sector HSV to RGB conversion. The sector is `floor(hue * 6) mod 6`, so a
/// hue exactly on a sector boundary always belongs to the sector that starts
/// there.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let scaled = hue * 6.0;
    let sector = (scaled.floor() as i64).rem_euclid(6);
    let f = scaled - scaled.floor();
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - f * saturation);
    let t = value * (1.0 - (1.0 - f) * saturation);

    let (r, g, b) = match sector {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };

    Rgb::new(channel(r), channel(g), channel(b))
}

fn channel(value: f64) -> u8 {
    (value * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(0.5, 1.0, 1.0), Rgb::new(0, 255, 255));
        assert_eq!(hsv_to_rgb(4.0 / 6.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn sector_boundary_belongs_to_next_sector() {
        // hue * 6 == 3 exactly: sector 3 with f == 0, not sector 2 with f == 1.
        let colour = hsv_to_rgb(0.5, 1.0, 1.0);
        assert_eq!(colour.r, 0);
        assert_eq!(colour.b, 255);
    }

    #[test]
    fn hue_wraps_into_unit_interval() {
        assert_eq!(hue(50.0, 50), 0.0);
        assert!((hue(75.0, 50) - 0.5).abs() < 1e-12);
        assert!((hue(-25.0, 100) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn degenerate_modulus_does_not_produce_nan() {
        assert_eq!(smooth_iteration(7, 1.0), 7.0);
        assert_eq!(smooth_iteration(7, 0.0), 7.0);
        assert!(hue(smooth_iteration(7, 1.0), 10).is_finite());
    }

    #[test]
    fn smoothing_is_continuous_around_the_bailout() {
        // At |z| == 2 the correction is 1 - log2(ln 2) ~= 1.53.
        let smoothed = smooth_iteration(10, 2.0);
        let expected = 11.0 - std::f64::consts::LN_2.ln() / std::f64::consts::LN_2;
        assert!((smoothed - expected).abs() < 1e-12);
        assert!(smooth_iteration(10, 4.0) < smoothed);
    }
}
