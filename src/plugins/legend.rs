//! Clickable legend that toggles series visibility.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::core::{PixelRect, Series};
use crate::error::{PlotError, PlotResult};
use crate::notify::{ToastKind, toast};
use crate::plugins::{ChartHandle, ChartPlugin, LEGEND_PLUGIN, LegendConfig, PluginEvent};
use crate::render::{Color, ElementId, RectPrimitive, Shape, TextHAlign, TextPrimitive};
use crate::state::VisibilityState;

/// One legend entry bound to its series.
#[derive(Debug)]
pub struct LegendItem {
    label: String,
    series: Rc<Series>,
    alpha_visible: f64,
    alpha_hidden: f64,
    rect: ElementId,
    text: ElementId,
    hit_box: PixelRect,
    placed: bool,
    visibility: Rc<VisibilityState>,
}

impl LegendItem {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn series(&self) -> &Rc<Series> {
        &self.series
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.series.is_hidden()
    }

    /// Box and label extent; empty until the legend is laid out.
    #[must_use]
    pub fn hit_box(&self) -> PixelRect {
        self.hit_box
    }

    /// `false` when the item was dropped for lack of vertical room.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    #[must_use]
    pub fn elements(&self) -> (ElementId, ElementId) {
        (self.rect, self.text)
    }

    /// Restores the series; the box fill follows through the shared state.
    pub fn show(&self) {
        self.visibility
            .apply(&self.series, &self.label, false, self.alpha_visible);
    }

    pub fn hide(&self) {
        self.visibility
            .apply(&self.series, &self.label, true, self.alpha_hidden);
    }

    pub fn toggle(&self) {
        if self.is_hidden() {
            self.show();
        } else {
            self.hide();
        }
        debug!(label = %self.label, hidden = self.is_hidden(), "legend item toggled");
    }
}

#[derive(Debug)]
pub struct LegendController {
    chart: ChartHandle,
    config: LegendConfig,
    items: Vec<LegendItem>,
}

impl LegendController {
    pub fn new(chart: &ChartHandle, config: LegendConfig) -> PlotResult<Self> {
        config.validate()?;
        chart.resolve_series(&config.line_ids)?;
        Ok(Self {
            chart: chart.clone(),
            config,
            items: Vec::new(),
        })
    }

    #[must_use]
    pub fn items(&self) -> &[LegendItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, label: &str) -> Option<&LegendItem> {
        self.items.iter().find(|item| item.label == label)
    }

    /// Toggles the item at `index`.
    pub fn toggle(&self, index: usize) -> PlotResult<()> {
        let item = self.items.get(index).ok_or_else(|| {
            PlotError::InvalidData(format!("legend has no item at index {index}"))
        })?;
        item.toggle();
        Ok(())
    }

    fn warn(&self, message: String) {
        warn!(chart = self.chart.id(), %message, "legend layout overflow");
        toast(self.chart.notifier().as_ref(), ToastKind::Warning, message);
    }

    /// Places items in rows below the axes, wrapping at the figure width.
    ///
    /// A label wider than the figure stays on its fresh row after one warning.
    /// Rows past the figure bottom are hidden, also after one warning.
    fn layout(&mut self) {
        let fontsize = self.config.fontsize;
        let layout = self.config.layout;
        let figure = self.chart.viewport();
        let axes = self.chart.axes_bounds();
        let row_step = fontsize + layout.row_padding;

        let mut x = axes.left;
        let mut row_top = axes.bottom() + layout.top_offset;
        let mut fresh_row = true;
        let mut width_warned = false;
        let mut overflow_from = None;

        for index in 0..self.items.len() {
            let label_width = {
                let scene = self.chart.scene().borrow();
                scene
                    .rendered_text_width(self.items[index].text)
                    .unwrap_or_default()
            };
            let width = fontsize + layout.box_label_gap + label_width;

            if x + width > figure.width_px() && !fresh_row {
                x = axes.left;
                row_top += row_step;
                fresh_row = true;
            }
            if x + width > figure.width_px() && !width_warned {
                width_warned = true;
                self.warn(format!(
                    "Legend label '{}' is wider than the figure.",
                    self.items[index].label
                ));
            }
            if row_top + fontsize > figure.height_px() {
                overflow_from = Some(index);
                break;
            }

            self.place(index, x, row_top, label_width);
            x += width + layout.item_spacing;
            fresh_row = false;
        }

        if let Some(first_hidden) = overflow_from {
            self.warn(format!(
                "Not enough room for the legend; {} of {} entries hidden. Increase the figure height.",
                self.items.len() - first_hidden,
                self.items.len()
            ));
            let mut scene = self.chart.scene().borrow_mut();
            for item in &mut self.items[first_hidden..] {
                item.placed = false;
                scene.set_visible(item.rect, false);
                scene.set_visible(item.text, false);
            }
        }
    }

    fn place(&mut self, index: usize, x: f64, top: f64, label_width: f64) {
        let fontsize = self.config.fontsize;
        let gap = self.config.layout.box_label_gap;
        let item = &mut self.items[index];
        let mut scene = self.chart.scene().borrow_mut();
        if let Some(rect) = scene.rect_mut(item.rect) {
            rect.x = x;
            rect.y = top;
        }
        if let Some(text) = scene.text_mut(item.text) {
            text.x = x + fontsize + gap;
            text.y = top + fontsize * 0.85;
        }
        item.hit_box = PixelRect::new(x, top, fontsize + gap + label_width, fontsize);
        item.placed = true;
    }
}

impl ChartPlugin for LegendController {
    fn name(&self) -> &'static str {
        LEGEND_PLUGIN
    }

    fn draw(&mut self) -> PlotResult<()> {
        let fontsize = self.config.fontsize;
        let series = self.chart.resolve_series(&self.config.line_ids)?;
        self.items.clear();

        for (series, label) in series.into_iter().zip(&self.config.labels) {
            let (rect, text) = {
                let mut scene = self.chart.scene().borrow_mut();
                let rect = scene.insert(
                    "autoplot-legend autoplot-legend-rect",
                    Shape::Rect(RectPrimitive::new(0.0, 0.0, fontsize, fontsize, series.color())),
                );
                let text = scene.insert(
                    "autoplot-legend autoplot-legend-text",
                    Shape::Text(TextPrimitive::new(
                        label.clone(),
                        0.0,
                        0.0,
                        fontsize,
                        Color::BLACK,
                        TextHAlign::Left,
                    )),
                );
                (rect, text)
            };

            let item = LegendItem {
                label: label.clone(),
                series,
                alpha_visible: self.config.alpha_visible,
                alpha_hidden: self.config.alpha_hidden,
                rect,
                text,
                hit_box: PixelRect::new(0.0, 0.0, 0.0, 0.0),
                placed: false,
                visibility: Rc::clone(self.chart.visibility()),
            };
            item.visibility
                .register_swatch(&item.series, self.chart.scene(), rect);
            if self.chart.visibility().persisted_hidden(label) {
                item.hide();
            } else {
                item.show();
            }
            self.items.push(item);
        }

        self.layout();
        debug!(
            chart = self.chart.id(),
            items = self.items.len(),
            hidden = self.items.iter().filter(|item| item.is_hidden()).count(),
            "legend drawn"
        );
        Ok(())
    }

    fn on_event(&mut self, event: PluginEvent) -> PlotResult<()> {
        let PluginEvent::Click { x, y } = event else {
            return Ok(());
        };
        if let Some(item) = self
            .items
            .iter()
            .find(|item| item.placed && item.hit_box.contains(x, y))
        {
            item.toggle();
        }
        Ok(())
    }
}
