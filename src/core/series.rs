use std::cell::Cell;

use crate::core::DataPoint;
use crate::error::{PlotError, PlotResult};
use crate::render::Color;

/// One plotted line: time-ordered samples plus display metadata.
///
/// `hidden` is the visibility flag shared by every plugin. Only the legend
/// (through `VisibilityState`) writes it after construction.
#[derive(Debug)]
pub struct Series {
    id: String,
    label: String,
    color: Color,
    points: Vec<DataPoint>,
    hidden: Cell<bool>,
    opacity: Cell<f64>,
}

impl Series {
    /// Builds a series; `x` values must be finite and non-decreasing.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        color: Color,
        points: Vec<DataPoint>,
    ) -> PlotResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(PlotError::InvalidData("series id must not be empty".to_owned()));
        }
        color.validate()?;

        let mut previous = f64::NEG_INFINITY;
        for point in &points {
            if !point.x.is_finite() {
                return Err(PlotError::InvalidData(format!(
                    "series `{id}` contains a non-finite time value"
                )));
            }
            if point.x < previous {
                return Err(PlotError::InvalidData(format!(
                    "series `{id}` time values must be non-decreasing"
                )));
            }
            previous = point.x;
        }

        Ok(Self {
            id,
            label: label.into(),
            color,
            points,
            hidden: Cell::new(false),
            opacity: Cell::new(1.0),
        })
    }

    /// Sets the visibility the host rendered the line with.
    #[must_use]
    pub fn with_hidden(self, hidden: bool) -> Self {
        self.hidden.set(hidden);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.opacity.get()
    }

    /// First and last sample times.
    #[must_use]
    pub fn x_range(&self) -> Option<(f64, f64)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.x, last.x)),
            _ => None,
        }
    }

    pub(crate) fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    pub(crate) fn set_opacity(&self, opacity: f64) {
        self.opacity.set(opacity);
    }
}
