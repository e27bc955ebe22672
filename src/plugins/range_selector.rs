//! Range selector buttons: relative windows, year-to-date, fit and reset.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{
    AxesLimits, LimitTransition, PixelRect, SECONDS_PER_DAY, Series, datetime_to_unix_seconds,
    unix_seconds_to_datetime,
};
use crate::error::{PlotError, PlotResult};
use crate::plugins::{
    ChartHandle, ChartPlugin, PluginEvent, RANGE_SELECTOR_PLUGIN, RangeSelectorConfig,
};
use crate::render::{Color, ElementId, RectPrimitive, Shape, TextHAlign, TextPrimitive};

const BUTTON_FILL: Color = Color::rgb(0.94, 0.94, 0.94);
const BUTTON_STROKE: Color = Color::rgb(0.6, 0.6, 0.6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl RangeUnit {
    /// Label suffix. Minutes are `M`, months are `m`.
    #[must_use]
    pub fn suffix(self) -> char {
        match self {
            Self::Second => 's',
            Self::Minute => 'M',
            Self::Hour => 'h',
            Self::Day => 'd',
            Self::Week => 'w',
            Self::Month => 'm',
            Self::Year => 'y',
        }
    }

    #[must_use]
    pub fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            's' => Some(Self::Second),
            'M' => Some(Self::Minute),
            'h' => Some(Self::Hour),
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            'm' => Some(Self::Month),
            'y' => Some(Self::Year),
            _ => None,
        }
    }

    /// Approximate width in days, used only to rank label candidates.
    #[must_use]
    pub fn nominal_days(self) -> f64 {
        match self {
            Self::Second => 1.0 / SECONDS_PER_DAY,
            Self::Minute => 1.0 / 1440.0,
            Self::Hour => 1.0 / 24.0,
            Self::Day => 1.0,
            Self::Week => 7.0,
            Self::Month => 30.5,
            Self::Year => 365.25,
        }
    }
}

/// One parsed button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeButton {
    Relative { amount: u32, unit: RangeUnit },
    YearToDate,
    Fit,
    Reset,
}

impl FromStr for RangeButton {
    type Err = PlotError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "ytd" => return Ok(Self::YearToDate),
            "fit" => return Ok(Self::Fit),
            "reset" => return Ok(Self::Reset),
            _ => {}
        }
        let invalid = || {
            PlotError::InvalidConfig(format!("invalid range selector button label `{label}`"))
        };
        let suffix = label.chars().last().ok_or_else(invalid)?;
        let unit = RangeUnit::from_suffix(suffix).ok_or_else(invalid)?;
        let amount = label[..label.len() - suffix.len_utf8()]
            .parse::<u32>()
            .map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }
        Ok(Self::Relative { amount, unit })
    }
}

impl fmt::Display for RangeButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relative { amount, unit } => write!(f, "{amount}{}", unit.suffix()),
            Self::YearToDate => f.write_str("ytd"),
            Self::Fit => f.write_str("fit"),
            Self::Reset => f.write_str("reset"),
        }
    }
}

/// Lower x bound `amount` units before `upper`, using calendar arithmetic.
///
/// Month and year steps clamp to the last valid day of the target month.
pub fn relative_lower_bound(upper: f64, amount: u32, unit: RangeUnit) -> PlotResult<f64> {
    let upper_time = unix_seconds_to_datetime(upper)?;
    let amount_i64 = i64::from(amount);
    let lower = match unit {
        RangeUnit::Second => TimeDelta::try_seconds(amount_i64)
            .and_then(|delta| upper_time.checked_sub_signed(delta)),
        RangeUnit::Minute => TimeDelta::try_minutes(amount_i64)
            .and_then(|delta| upper_time.checked_sub_signed(delta)),
        RangeUnit::Hour => TimeDelta::try_hours(amount_i64)
            .and_then(|delta| upper_time.checked_sub_signed(delta)),
        RangeUnit::Day => upper_time.checked_sub_days(Days::new(u64::from(amount))),
        RangeUnit::Week => upper_time.checked_sub_days(Days::new(u64::from(amount) * 7)),
        RangeUnit::Month => upper_time.checked_sub_months(Months::new(amount)),
        RangeUnit::Year => amount
            .checked_mul(12)
            .and_then(|months| upper_time.checked_sub_months(Months::new(months))),
    };
    lower.map(datetime_to_unix_seconds).ok_or_else(|| {
        PlotError::InvalidData(format!(
            "cannot subtract {amount}{} from {upper}",
            unit.suffix()
        ))
    })
}

/// January 1st, 00:00 UTC, of the year containing `upper`.
pub fn year_to_date_lower_bound(upper: f64) -> PlotResult<f64> {
    let year = unix_seconds_to_datetime(upper)?.year();
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .map(datetime_to_unix_seconds)
        .ok_or_else(|| PlotError::InvalidData(format!("no January 1st for year {year}")))
}

/// Tightest limits around every visible series, with 1% y padding per side.
///
/// Returns `None` when no visible series has finite data.
#[must_use]
pub fn fit_limits(series: &[Rc<Series>]) -> Option<AxesLimits> {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);

    for line in series.iter().filter(|line| !line.is_hidden()) {
        let Some((first, last)) = line.x_range() else {
            continue;
        };
        let mut any_finite = false;
        for point in line.points().iter().filter(|point| point.y.is_finite()) {
            y.0 = y.0.min(point.y);
            y.1 = y.1.max(point.y);
            any_finite = true;
        }
        if any_finite {
            x.0 = x.0.min(first);
            x.1 = x.1.max(last);
        }
    }

    if !x.0.is_finite() || !y.0.is_finite() {
        return None;
    }

    if x.1 <= x.0 {
        x = (x.0 - SECONDS_PER_DAY / 2.0, x.1 + SECONDS_PER_DAY / 2.0);
    }
    let span = y.1 - y.0;
    let padding = if span > 0.0 {
        span * 0.01
    } else if y.0 != 0.0 {
        y.0.abs() * 0.01
    } else {
        1.0
    };
    Some(AxesLimits::new(x, (y.0 - padding, y.1 + padding)))
}

/// Picks button labels suited to a data set.
///
/// The smallest button shows at least ten samples spaced `min_diff_secs`
/// apart. The run stops before the first larger candidate that would show
/// more than twice `total_range_secs`. `ytd` follows month/year buttons and
/// `reset`/`fit` lead when `include_standard` is set.
#[must_use]
pub fn suggest_range_button_labels(
    total_range_secs: f64,
    min_diff_secs: f64,
    include_standard: bool,
) -> Vec<String> {
    use RangeUnit::{Day, Hour, Minute, Month, Second, Year};
    const LADDER: [(u32, RangeUnit); 18] = [
        (1, Second),
        (10, Second),
        (30, Second),
        (1, Minute),
        (10, Minute),
        (30, Minute),
        (1, Hour),
        (6, Hour),
        (12, Hour),
        (1, Day),
        (5, Day),
        (7, Day),
        (1, Month),
        (3, Month),
        (6, Month),
        (1, Year),
        (2, Year),
        (5, Year),
    ];
    let width = |(amount, unit): (u32, RangeUnit)| f64::from(amount) * unit.nominal_days();
    let count = LADDER.len();

    let min_window = min_diff_secs / SECONDS_PER_DAY * 10.0;
    let first = LADDER[..count - 1]
        .iter()
        .position(|&entry| width(entry) > min_window)
        .unwrap_or(count - 2);

    let max_window = total_range_secs / SECONDS_PER_DAY * 2.0;
    let last = LADDER[first + 1..]
        .iter()
        .position(|&entry| width(entry) > max_window)
        .map_or(count - 1, |offset| first + offset);

    let mut labels: Vec<String> = LADDER[first..=last]
        .iter()
        .map(|&(amount, unit)| RangeButton::Relative { amount, unit }.to_string())
        .collect();

    if matches!(LADDER[last].1, Month | Year) {
        labels.push(RangeButton::YearToDate.to_string());
    }
    if include_standard {
        labels.insert(0, RangeButton::Fit.to_string());
        labels.insert(0, RangeButton::Reset.to_string());
    }
    labels
}

/// One rendered range button.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeButtonView {
    pub button: RangeButton,
    pub bounds: PixelRect,
    /// `false` when the button would cross the right margin.
    pub placed: bool,
    background: ElementId,
    text: ElementId,
}

impl RangeButtonView {
    /// Scene elements as `(background, text)`.
    #[must_use]
    pub fn elements(&self) -> (ElementId, ElementId) {
        (self.background, self.text)
    }
}

#[derive(Debug)]
pub struct RangeSelectorController {
    chart: ChartHandle,
    config: RangeSelectorConfig,
    fit_series: Vec<Rc<Series>>,
    buttons: Vec<RangeButtonView>,
}

impl RangeSelectorController {
    pub fn new(chart: &ChartHandle, config: RangeSelectorConfig) -> PlotResult<Self> {
        config.validate()?;
        let fit_series = match &config.line_ids {
            Some(ids) => chart.resolve_series(ids)?,
            None => Vec::new(),
        };
        Ok(Self {
            chart: chart.clone(),
            config,
            fit_series,
            buttons: Vec::new(),
        })
    }

    #[must_use]
    pub fn buttons(&self) -> &[RangeButtonView] {
        &self.buttons
    }

    /// Computes and applies the limits for `button`.
    ///
    /// Returns `false` when the button has nothing to apply (`fit` with every
    /// series hidden).
    pub fn apply(&self, button: RangeButton) -> PlotResult<bool> {
        let mut axes = self.chart.axes().borrow_mut();
        let (_, upper) = axes.x_domain();
        let y = axes.y_domain();

        let limits = match button {
            RangeButton::Reset => axes.initial_limits(),
            RangeButton::Fit => match fit_limits(&self.fit_series) {
                Some(limits) => limits,
                None => {
                    debug!("fit skipped: no visible series");
                    return Ok(false);
                }
            },
            RangeButton::YearToDate => {
                AxesLimits::new((year_to_date_lower_bound(upper)?, upper), y)
            }
            RangeButton::Relative { amount, unit } => {
                AxesLimits::new((relative_lower_bound(upper, amount, unit)?, upper), y)
            }
        };

        debug!(%button, x = ?limits.x, y = ?limits.y, "range button applied");
        axes.set_limits(limits, LimitTransition::animated())?;
        Ok(true)
    }

    /// Parses `label` and applies it.
    pub fn apply_label(&self, label: &str) -> PlotResult<bool> {
        self.apply(label.parse()?)
    }

    fn button_at(&self, x: f64, y: f64) -> Option<RangeButton> {
        self.buttons
            .iter()
            .find(|view| view.placed && view.bounds.contains(x, y))
            .map(|view| view.button)
    }
}

impl ChartPlugin for RangeSelectorController {
    fn name(&self) -> &'static str {
        RANGE_SELECTOR_PLUGIN
    }

    fn draw(&mut self) -> PlotResult<()> {
        let buttons = self.config.buttons()?;
        let layout = self.config.layout;
        let fontsize = self.config.fontsize;
        let height = layout.height(fontsize);
        let axes_bounds = self.chart.axes_bounds();
        let limit = self.chart.viewport().width_px() - self.config.margin_right;
        let top = (axes_bounds.top - height - layout.offset).max(0.0);

        let mut scene = self.chart.scene().borrow_mut();
        let mut x = axes_bounds.left;
        self.buttons.clear();

        for button in buttons {
            let background = scene.insert(
                "autoplot-range-button autoplot-range-button-rect",
                Shape::Rect(RectPrimitive::new(x, top, 0.0, height, BUTTON_STROKE).filled(BUTTON_FILL)),
            );
            let text = scene.insert(
                "autoplot-range-button autoplot-range-button-text",
                Shape::Text(TextPrimitive::new(
                    button.to_string(),
                    x + layout.padding_x,
                    top + layout.padding_y + fontsize * 0.8,
                    fontsize,
                    Color::BLACK,
                    TextHAlign::Left,
                )),
            );
            let label_width = scene.rendered_text_width(text).unwrap_or_default();
            let width = label_width + 2.0 * layout.padding_x;
            let bounds = PixelRect::new(x, top, width, height);

            let placed = bounds.right() <= limit;
            if placed {
                if let Some(rect) = scene.rect_mut(background) {
                    rect.width = width;
                }
                x += width + layout.spacing;
            } else {
                warn!(%button, right = bounds.right(), limit, "range button skipped past right margin");
                scene.set_visible(background, false);
                scene.set_visible(text, false);
            }

            self.buttons.push(RangeButtonView {
                button,
                bounds,
                placed,
                background,
                text,
            });
        }

        debug!(
            placed = self.buttons.iter().filter(|view| view.placed).count(),
            total = self.buttons.len(),
            "range selector drawn"
        );
        Ok(())
    }

    fn on_event(&mut self, event: PluginEvent) -> PlotResult<()> {
        let PluginEvent::Click { x, y } = event else {
            return Ok(());
        };
        match self.button_at(x, y) {
            Some(button) => self.apply(button).map(|_| ()),
            None => {
                trace!(x, y, "click outside range buttons");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_units_and_sentinels() {
        assert_eq!(
            "10M".parse::<RangeButton>().expect("minutes"),
            RangeButton::Relative {
                amount: 10,
                unit: RangeUnit::Minute
            }
        );
        assert_eq!(
            "3m".parse::<RangeButton>().expect("months"),
            RangeButton::Relative {
                amount: 3,
                unit: RangeUnit::Month
            }
        );
        assert_eq!("ytd".parse::<RangeButton>().expect("ytd"), RangeButton::YearToDate);
        assert!(matches!("5q".parse::<RangeButton>(), Err(PlotError::InvalidConfig(_))));
        assert!(matches!("d".parse::<RangeButton>(), Err(PlotError::InvalidConfig(_))));
        assert!(matches!("".parse::<RangeButton>(), Err(PlotError::InvalidConfig(_))));
        assert!(matches!("0d".parse::<RangeButton>(), Err(PlotError::InvalidConfig(_))));
    }

    #[test]
    fn labels_round_trip_through_display() {
        for label in ["1s", "30M", "12h", "7d", "2w", "6m", "5y", "ytd", "fit", "reset"] {
            let button: RangeButton = label.parse().expect("label");
            assert_eq!(button.to_string(), label);
        }
    }

    #[test]
    fn suggested_labels_for_a_daily_year() {
        let labels = suggest_range_button_labels(365.0 * SECONDS_PER_DAY, SECONDS_PER_DAY, true);
        assert_eq!(labels, vec!["reset", "fit", "1m", "3m", "6m", "1y", "ytd"]);
    }

    #[test]
    fn suggested_labels_for_a_short_minute_series() {
        let labels = suggest_range_button_labels(3_600.0, 30.0, false);
        assert_eq!(labels, vec!["10M", "30M", "1h"]);
    }
}
