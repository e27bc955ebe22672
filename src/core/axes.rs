use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{LinearScale, PixelRect};
use crate::error::{PlotError, PlotResult};

/// Duration used by every plugin-driven limit change.
pub const LIMIT_TRANSITION_MS: u32 = 750;

/// Data-space limits of one axes: `x` in Unix seconds, `y` in series units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxesLimits {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl AxesLimits {
    #[must_use]
    pub const fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    pub fn validate(self) -> PlotResult<Self> {
        for (name, (start, end)) in [("x", self.x), ("y", self.y)] {
            if !start.is_finite() || !end.is_finite() || start == end {
                return Err(PlotError::InvalidData(format!(
                    "{name} limits must be finite and non-empty"
                )));
            }
        }
        Ok(self)
    }
}

/// How a limit change should be presented by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitTransition {
    pub duration_ms: u32,
    /// Also move axes linked to this one.
    pub propagate: bool,
}

impl LimitTransition {
    #[must_use]
    pub const fn animated() -> Self {
        Self {
            duration_ms: LIMIT_TRANSITION_MS,
            propagate: true,
        }
    }
}

/// Geometry of one rendered axes as seen by plugins.
///
/// Transforms are axes-relative; `bounds` gives the offset of the axes inside
/// the figure canvas. Implementations must answer from their current limits,
/// so callers never cache a transform across events.
pub trait AxesView {
    fn bounds(&self) -> PixelRect;
    fn x_domain(&self) -> (f64, f64);
    fn y_domain(&self) -> (f64, f64);
    fn x_to_px(&self, x: f64) -> PlotResult<f64>;
    fn y_to_px(&self, y: f64) -> PlotResult<f64>;
    fn px_to_x(&self, px: f64) -> PlotResult<f64>;
    /// Limits the axes were first rendered with.
    fn initial_limits(&self) -> AxesLimits;
    fn set_limits(&mut self, limits: AxesLimits, transition: LimitTransition) -> PlotResult<()>;
}

pub type SharedAxes = Rc<RefCell<dyn AxesView>>;

/// Linear time/value axes with optional shared-x links.
#[derive(Debug)]
pub struct LinearAxes {
    bounds: PixelRect,
    x_scale: LinearScale,
    y_scale: LinearScale,
    initial: AxesLimits,
    linked: Vec<Weak<RefCell<LinearAxes>>>,
    last_transition: Option<LimitTransition>,
}

impl LinearAxes {
    pub fn new(bounds: PixelRect, limits: AxesLimits) -> PlotResult<Self> {
        if !bounds.is_valid() {
            return Err(PlotError::InvalidData(
                "axes bounds must be finite with positive size".to_owned(),
            ));
        }
        let limits = limits.validate()?;
        Ok(Self {
            bounds,
            x_scale: LinearScale::new(limits.x.0, limits.x.1)?,
            y_scale: LinearScale::new(limits.y.0, limits.y.1)?,
            initial: limits,
            linked: Vec::new(),
            last_transition: None,
        })
    }

    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Links `other` so x-limit changes propagate to it.
    pub fn link_x(&mut self, other: &Rc<RefCell<LinearAxes>>) {
        self.linked.push(Rc::downgrade(other));
    }

    #[must_use]
    pub fn limits(&self) -> AxesLimits {
        AxesLimits::new(self.x_scale.domain(), self.y_scale.domain())
    }

    #[must_use]
    pub fn last_transition(&self) -> Option<LimitTransition> {
        self.last_transition
    }

    fn x_range(&self) -> (f64, f64) {
        (0.0, self.bounds.width)
    }

    fn y_range(&self) -> (f64, f64) {
        (self.bounds.height, 0.0)
    }

    fn apply_x(&mut self, x: (f64, f64), transition: LimitTransition) -> PlotResult<()> {
        self.x_scale = LinearScale::new(x.0, x.1)?;
        self.last_transition = Some(transition);
        Ok(())
    }
}

impl AxesView for LinearAxes {
    fn bounds(&self) -> PixelRect {
        self.bounds
    }

    fn x_domain(&self) -> (f64, f64) {
        self.x_scale.domain()
    }

    fn y_domain(&self) -> (f64, f64) {
        self.y_scale.domain()
    }

    fn x_to_px(&self, x: f64) -> PlotResult<f64> {
        self.x_scale.domain_to_pixel(x, self.x_range())
    }

    fn y_to_px(&self, y: f64) -> PlotResult<f64> {
        self.y_scale.domain_to_pixel(y, self.y_range())
    }

    fn px_to_x(&self, px: f64) -> PlotResult<f64> {
        self.x_scale.pixel_to_domain(px, self.x_range())
    }

    fn initial_limits(&self) -> AxesLimits {
        self.initial
    }

    fn set_limits(&mut self, limits: AxesLimits, transition: LimitTransition) -> PlotResult<()> {
        let limits = limits.validate()?;
        self.x_scale = LinearScale::new(limits.x.0, limits.x.1)?;
        self.y_scale = LinearScale::new(limits.y.0, limits.y.1)?;
        self.last_transition = Some(transition);
        debug!(x = ?limits.x, y = ?limits.y, duration_ms = transition.duration_ms, "axes limits set");

        if !transition.propagate {
            return Ok(());
        }
        self.linked.retain(|link| link.strong_count() > 0);
        for link in &self.linked {
            let Some(other) = link.upgrade() else {
                continue;
            };
            match other.try_borrow_mut() {
                Ok(mut other) => other.apply_x(limits.x, transition)?,
                Err(_) => warn!("skipping linked axes that is already borrowed"),
            }
        }
        Ok(())
    }
}
