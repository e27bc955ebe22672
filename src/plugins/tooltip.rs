//! Click-and-drag time series tooltip.
//!
//! One vertical time indicator is shared by all series; every visible series
//! gets a marker on its nearest sample plus a value label right of the axes.

use std::rc::Rc;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{AxesView, PixelRect, Series};
use crate::error::PlotResult;
use crate::format::{date_format, number_format};
use crate::geometry::{
    canvas_px_to_time, visible_range_days, visible_y_range, x_to_canvas_px, y_to_canvas_px,
};
use crate::plugins::{ChartHandle, ChartPlugin, PluginEvent, TOOLTIP_PLUGIN, TooltipConfig};
use crate::render::{
    CirclePrimitive, Color, ElementId, LinePrimitive, OverlayScene, RectPrimitive, Shape,
    TextHAlign, TextPrimitive,
};
use crate::search::{DEFAULT_TOLERANCE_PX, nearest_sample, tolerance_buffer};

const LABEL_FILL: Color = Color::rgb(1.0, 1.0, 1.0);
const INDICATOR_COLOR: Color = Color::rgb(0.3, 0.3, 0.3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TooltipPhase {
    #[default]
    Idle,
    /// Indicators shown at the last tracked position.
    Visible,
    /// Pointer held; indicators follow pointer moves.
    Dragging,
}

/// Tops that keep labels of equal height from overlapping.
///
/// Labels are processed from the smallest anchor down; each one moves down
/// only as far as the previous label's bottom. The result is in input order.
#[must_use]
pub fn resolve_label_overlaps(anchors: &[f64], label_height: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..anchors.len()).collect();
    order.sort_by_key(|&index| OrderedFloat(anchors[index]));

    let mut tops = anchors.to_vec();
    let mut previous_bottom = f64::NEG_INFINITY;
    for index in order {
        let top = anchors[index].max(previous_bottom);
        tops[index] = top;
        previous_bottom = top + label_height;
    }
    tops
}

fn insert_hidden(scene: &mut OverlayScene, class: &str, shape: Shape) -> ElementId {
    let id = scene.insert(class, shape);
    scene.set_visible(id, false);
    id
}

#[derive(Debug, Clone, Copy)]
struct TimeIndicator {
    line: ElementId,
    background: ElementId,
    label: ElementId,
}

/// Marker and value label for one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueIndicator {
    marker: ElementId,
    background: ElementId,
    label: ElementId,
    visible: bool,
    /// Canvas y of the sample the marker sits on.
    pub marker_y: f64,
    /// Canvas y of the label box's top edge after de-overlap.
    pub label_top: f64,
}

impl ValueIndicator {
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Scene elements as `(marker, background, label)`.
    #[must_use]
    pub fn elements(&self) -> (ElementId, ElementId, ElementId) {
        (self.marker, self.background, self.label)
    }
}

#[derive(Debug)]
pub struct TooltipController {
    chart: ChartHandle,
    config: TooltipConfig,
    series: Vec<Rc<Series>>,
    phase: TooltipPhase,
    /// Set between a pointer-down inside the axes and the next pointer-up.
    pointer_held: bool,
    time_indicator: Option<TimeIndicator>,
    value_indicators: IndexMap<String, ValueIndicator>,
}

impl TooltipController {
    pub fn new(chart: &ChartHandle, config: TooltipConfig) -> PlotResult<Self> {
        config.validate()?;
        let series = chart.resolve_series(&config.line_ids)?;
        Ok(Self {
            chart: chart.clone(),
            config,
            series,
            phase: TooltipPhase::Idle,
            pointer_held: false,
            time_indicator: None,
            value_indicators: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn phase(&self) -> TooltipPhase {
        self.phase
    }

    #[must_use]
    pub fn value_indicator(&self, series_id: &str) -> Option<&ValueIndicator> {
        self.value_indicators.get(series_id)
    }

    /// Current time label text, when the indicator is shown.
    #[must_use]
    pub fn time_label(&self) -> Option<String> {
        let indicator = self.time_indicator?;
        let scene = self.chart.scene().borrow();
        if !scene.is_visible(indicator.label) {
            return None;
        }
        match &scene.get(indicator.label)?.shape {
            Shape::Text(text) => Some(text.text.clone()),
            _ => None,
        }
    }

    /// Current value label text for a series, when shown.
    #[must_use]
    pub fn value_label(&self, series_id: &str) -> Option<String> {
        let indicator = self.value_indicators.get(series_id)?;
        if !indicator.visible {
            return None;
        }
        let scene = self.chart.scene().borrow();
        match &scene.get(indicator.label)?.shape {
            Shape::Text(text) => Some(text.text.clone()),
            _ => None,
        }
    }

    fn label_height(&self) -> f64 {
        self.config.fontsize + 2.0 * self.config.layout.label_padding
    }

    /// Moves every indicator to the canvas x `pointer_x`.
    pub fn update(&mut self, pointer_x: f64) -> PlotResult<()> {
        let Some(time_indicator) = self.time_indicator else {
            return Ok(());
        };
        let axes_ref = self.chart.axes().borrow();
        let axes: &dyn AxesView = &*axes_ref;
        let bounds = axes.bounds();
        let x = bounds.clamp_x(pointer_x);
        let time = canvas_px_to_time(axes, x)?;
        let time_text = date_format(visible_range_days(axes)).format(time);
        let (y_min, y_max) = visible_y_range(axes);

        let mut placements: Vec<(String, f64, f64, String)> = Vec::new();
        let mut hidden: Vec<String> = Vec::new();
        for series in &self.series {
            if series.is_hidden() {
                hidden.push(series.id().to_owned());
                continue;
            }
            let tolerance = tolerance_buffer(axes, series.points(), DEFAULT_TOLERANCE_PX)?;
            let Some(sample) = nearest_sample(series.points(), time, tolerance) else {
                hidden.push(series.id().to_owned());
                continue;
            };
            let value = sample.point.y;
            if !value.is_finite() || value < y_min || value > y_max {
                hidden.push(series.id().to_owned());
                continue;
            }
            placements.push((
                series.id().to_owned(),
                x_to_canvas_px(axes, sample.point.x)?,
                y_to_canvas_px(axes, value)?,
                number_format(value).format(value),
            ));
        }
        drop(axes_ref);

        let label_height = self.label_height();
        let anchors: Vec<f64> = placements
            .iter()
            .map(|(_, _, marker_y, _)| marker_y - label_height / 2.0)
            .collect();
        let tops = resolve_label_overlaps(&anchors, label_height);

        let mut scene = self.chart.scene().borrow_mut();
        self.place_time_indicator(&mut scene, time_indicator, bounds, x, time_text);

        for id in hidden {
            if let Some(indicator) = self.value_indicators.get_mut(&id) {
                indicator.visible = false;
                for element in [indicator.marker, indicator.background, indicator.label] {
                    scene.set_visible(element, false);
                }
            }
        }

        let padding = self.config.layout.label_padding;
        let label_left = bounds.right() + self.config.layout.value_label_gap;
        for ((id, marker_x, marker_y, text), top) in placements.into_iter().zip(tops) {
            let Some(indicator) = self.value_indicators.get_mut(&id) else {
                continue;
            };
            if let Some(circle) = scene.circle_mut(indicator.marker) {
                circle.cx = marker_x;
                circle.cy = marker_y;
            }
            if let Some(label) = scene.text_mut(indicator.label) {
                label.text = text;
                label.x = label_left + padding;
                label.y = top + padding + self.config.fontsize * 0.85;
            }
            let label_width = scene.rendered_text_width(indicator.label).unwrap_or_default();
            if let Some(background) = scene.rect_mut(indicator.background) {
                background.x = label_left;
                background.y = top;
                background.width = label_width + 2.0 * padding;
                background.height = label_height;
            }
            for element in [indicator.marker, indicator.background, indicator.label] {
                scene.set_visible(element, true);
            }
            indicator.visible = true;
            indicator.marker_y = marker_y;
            indicator.label_top = top;
        }

        trace!(x, time, "tooltip updated");
        Ok(())
    }

    fn place_time_indicator(
        &self,
        scene: &mut OverlayScene,
        indicator: TimeIndicator,
        bounds: PixelRect,
        x: f64,
        text: String,
    ) {
        let padding = self.config.layout.label_padding;
        let top = bounds.bottom() + self.config.layout.time_label_gap;

        if let Some(line) = scene.line_mut(indicator.line) {
            line.x1 = x;
            line.x2 = x;
            line.y1 = bounds.top;
            line.y2 = bounds.bottom();
        }
        if let Some(label) = scene.text_mut(indicator.label) {
            label.text = text;
            label.x = x;
            label.y = top + padding + self.config.fontsize * 0.85;
        }
        let width = scene.rendered_text_width(indicator.label).unwrap_or_default();
        if let Some(background) = scene.rect_mut(indicator.background) {
            background.x = x - width / 2.0 - padding;
            background.y = top;
            background.width = width + 2.0 * padding;
            background.height = self.label_height();
        }
        for element in [indicator.line, indicator.background, indicator.label] {
            scene.set_visible(element, true);
        }
    }

    fn pointer_down(&mut self, x: f64, y: f64) -> PlotResult<()> {
        if !self.chart.axes_bounds().contains_y(y) {
            trace!(y, "pointer down outside axes ignored");
            return Ok(());
        }
        self.update(x)?;
        self.pointer_held = true;
        self.phase = TooltipPhase::Visible;
        debug!(x, "tooltip jumped to pointer");
        Ok(())
    }

    fn pointer_move(&mut self, x: f64, y: f64) -> PlotResult<()> {
        if !self.pointer_held || !self.chart.axes_bounds().contains_y(y) {
            return Ok(());
        }
        self.phase = TooltipPhase::Dragging;
        self.update(x)
    }

    fn pointer_up(&mut self) {
        self.pointer_held = false;
        if self.phase == TooltipPhase::Dragging {
            self.phase = TooltipPhase::Visible;
            debug!("tooltip tracking stopped");
        }
    }
}

impl ChartPlugin for TooltipController {
    fn name(&self) -> &'static str {
        TOOLTIP_PLUGIN
    }

    fn draw(&mut self) -> PlotResult<()> {
        let fontsize = self.config.fontsize;
        let layout = self.config.layout;
        let mut scene = self.chart.scene().borrow_mut();

        let time_indicator = TimeIndicator {
            line: insert_hidden(
                &mut scene,
                "autoplot-tooltip autoplot-tooltip-x-line",
                Shape::Line(LinePrimitive::new(0.0, 0.0, 0.0, 0.0, layout.line_width, INDICATOR_COLOR)),
            ),
            background: insert_hidden(
                &mut scene,
                "autoplot-tooltip autoplot-tooltip-x-background",
                Shape::Rect(RectPrimitive::new(0.0, 0.0, 0.0, 0.0, INDICATOR_COLOR).filled(LABEL_FILL)),
            ),
            label: insert_hidden(
                &mut scene,
                "autoplot-tooltip autoplot-tooltip-x-label",
                Shape::Text(TextPrimitive::new(
                    "",
                    0.0,
                    0.0,
                    fontsize,
                    Color::BLACK,
                    TextHAlign::Center,
                )),
            ),
        };

        self.value_indicators.clear();
        for series in &self.series {
            let indicator = ValueIndicator {
                marker: insert_hidden(
                    &mut scene,
                    "autoplot-tooltip autoplot-tooltip-marker",
                    Shape::Circle(CirclePrimitive::new(0.0, 0.0, layout.marker_radius, series.color())),
                ),
                background: insert_hidden(
                    &mut scene,
                    "autoplot-tooltip autoplot-tooltip-y-background",
                    Shape::Rect(RectPrimitive::new(0.0, 0.0, 0.0, 0.0, series.color()).filled(LABEL_FILL)),
                ),
                label: insert_hidden(
                    &mut scene,
                    "autoplot-tooltip autoplot-tooltip-y-label",
                    Shape::Text(TextPrimitive::new(
                        "",
                        0.0,
                        0.0,
                        fontsize,
                        series.color(),
                        TextHAlign::Left,
                    )),
                ),
                visible: false,
                marker_y: 0.0,
                label_top: 0.0,
            };
            self.value_indicators.insert(series.id().to_owned(), indicator);
        }

        self.time_indicator = Some(time_indicator);
        self.phase = TooltipPhase::Idle;
        self.pointer_held = false;
        debug!(series = self.series.len(), "tooltip drawn");
        Ok(())
    }

    fn on_event(&mut self, event: PluginEvent) -> PlotResult<()> {
        match event {
            PluginEvent::PointerDown { x, y } => self.pointer_down(x, y),
            PluginEvent::PointerMove { x, y } => self.pointer_move(x, y),
            PluginEvent::PointerUp { .. } => {
                self.pointer_up();
                Ok(())
            }
            PluginEvent::Click { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_label_overlaps;

    #[test]
    fn overlapping_labels_are_pushed_down_in_anchor_order() {
        let tops = resolve_label_overlaps(&[50.0, 10.0, 15.0], 10.0);
        assert_eq!(tops, vec![50.0, 10.0, 20.0]);
    }

    #[test]
    fn separated_labels_keep_their_anchor() {
        let tops = resolve_label_overlaps(&[0.0, 30.0], 10.0);
        assert_eq!(tops, vec![0.0, 30.0]);
    }

    #[test]
    fn push_cascades_through_a_stack() {
        let tops = resolve_label_overlaps(&[5.0, 0.0, 8.0], 10.0);
        assert_eq!(tops, vec![10.0, 0.0, 20.0]);
    }
}
