use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};

/// Linear mapping from a data domain onto a pixel range.
///
/// The range may be reversed (`(height, 0.0)`) for y axes that grow upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> PlotResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(PlotError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    pub fn domain_to_pixel(self, value: f64, range: (f64, f64)) -> PlotResult<f64> {
        validate_range(range)?;
        if !value.is_finite() {
            return Err(PlotError::InvalidData("value must be finite".to_owned()));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = (value - self.domain_start) / span;
        Ok(range.0 + normalized * (range.1 - range.0))
    }

    pub fn pixel_to_domain(self, pixel: f64, range: (f64, f64)) -> PlotResult<f64> {
        validate_range(range)?;
        if !pixel.is_finite() {
            return Err(PlotError::InvalidData("pixel must be finite".to_owned()));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = (pixel - range.0) / (range.1 - range.0);
        Ok(self.domain_start + normalized * span)
    }
}

fn validate_range(range: (f64, f64)) -> PlotResult<()> {
    if !range.0.is_finite() || !range.1.is_finite() || range.0 == range.1 {
        return Err(PlotError::InvalidData(
            "pixel range must be finite and non-zero".to_owned(),
        ));
    }
    Ok(())
}
