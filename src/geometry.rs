//! Data-space to canvas-pixel conversions.
//!
//! Every helper reads the axes transform at call time; limits move with zoom,
//! pan and range buttons, so nothing here caches a mapping.

use crate::core::{AxesView, SECONDS_PER_DAY};
use crate::error::PlotResult;

/// Canvas-relative pixel x of a timestamp.
pub fn x_to_canvas_px(axes: &dyn AxesView, time: f64) -> PlotResult<f64> {
    Ok(axes.x_to_px(time)? + axes.bounds().left)
}

/// Canvas-relative pixel y of a value.
pub fn y_to_canvas_px(axes: &dyn AxesView, value: f64) -> PlotResult<f64> {
    Ok(axes.y_to_px(value)? + axes.bounds().top)
}

/// Timestamp under a canvas-relative pixel x.
pub fn canvas_px_to_time(axes: &dyn AxesView, px: f64) -> PlotResult<f64> {
    axes.px_to_x(px - axes.bounds().left)
}

/// Width of the visible x range in fractional days.
#[must_use]
pub fn visible_range_days(axes: &dyn AxesView) -> f64 {
    let (start, end) = axes.x_domain();
    (end - start).abs() / SECONDS_PER_DAY
}

/// Visible y range ordered as `(min, max)`.
#[must_use]
pub fn visible_y_range(axes: &dyn AxesView) -> (f64, f64) {
    let (start, end) = axes.y_domain();
    (start.min(end), start.max(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AxesLimits, LinearAxes, PixelRect};

    fn axes() -> LinearAxes {
        LinearAxes::new(
            PixelRect::new(50.0, 20.0, 500.0, 200.0),
            AxesLimits::new((0.0, 10.0 * SECONDS_PER_DAY), (0.0, 100.0)),
        )
        .expect("axes")
    }

    #[test]
    fn canvas_pixels_include_axes_offset() {
        let axes = axes();
        let x = x_to_canvas_px(&axes, 5.0 * SECONDS_PER_DAY).expect("x");
        let y = y_to_canvas_px(&axes, 100.0).expect("y");
        assert!((x - 300.0).abs() <= 1e-9);
        assert!((y - 20.0).abs() <= 1e-9);
    }

    #[test]
    fn canvas_pixel_inverts_back_to_time() {
        let axes = axes();
        let time = canvas_px_to_time(&axes, 100.0).expect("time");
        assert!((time - SECONDS_PER_DAY).abs() <= 1e-6);
        assert!((visible_range_days(&axes) - 10.0).abs() <= 1e-12);
    }
}
