//! Save buttons exporting the chart as SVG or PNG.
//!
//! The encoded image is stored in the session store under a fresh key and
//! announced with an `autoplot-embed-image` event. Each chart holds at most
//! one unclaimed export: storing a newer one drops the previous entry, and a
//! PNG decode that completes after a newer export was stored is discarded.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::core::PixelRect;
use crate::error::{PlotError, PlotResult};
use crate::export::{
    ExportFormat, IMAGE_KEY_PREFIX, PNG_EXPORT_SCALE, RasterImage, export_svg_markup, svg_data_uri,
};
use crate::notify::{EmbedImageEvent, HostEvent, Notifier, ToastKind, toast};
use crate::plugins::{ChartHandle, ChartPlugin, PluginEvent, SAVE_IMAGE_PLUGIN, SaveImageConfig};
use crate::render::{Color, ElementId, RectPrimitive, Shape, TextHAlign, TextPrimitive};
use crate::state::SharedSessionStore;

const BUTTON_FILL: Color = Color::rgb(0.94, 0.94, 0.94);
const BUTTON_STROKE: Color = Color::rgb(0.6, 0.6, 0.6);

#[derive(Debug, Clone, PartialEq)]
pub struct SaveButtonView {
    pub format: ExportFormat,
    pub bounds: PixelRect,
    background: ElementId,
    text: ElementId,
}

impl SaveButtonView {
    #[must_use]
    pub fn elements(&self) -> (ElementId, ElementId) {
        (self.background, self.text)
    }
}

#[derive(Debug)]
pub struct SaveImageController {
    chart: ChartHandle,
    config: SaveImageConfig,
    buttons: Vec<SaveButtonView>,
    exports: Cell<u64>,
    /// Sequence number of the export held in the store; 0 when none was stored.
    stored: Rc<Cell<u64>>,
}

fn image_key(chart_id: &str, sequence: u64) -> String {
    format!("{IMAGE_KEY_PREFIX}{chart_id}-{sequence}")
}

/// Stores export `sequence` for `chart_id` and announces its key.
///
/// Returns `false` when a newer export is already stored.
fn announce(
    store: &SharedSessionStore,
    stored: &Cell<u64>,
    notifier: &dyn Notifier,
    chart_id: &str,
    sequence: u64,
    data_uri: String,
) -> bool {
    let previous = stored.get();
    if sequence < previous {
        debug!(chart_id, sequence, previous, "export superseded before it completed");
        return false;
    }

    let key = image_key(chart_id, sequence);
    {
        let mut store = store.borrow_mut();
        if previous != 0 && previous != sequence {
            store.remove(&image_key(chart_id, previous));
        }
        store.set(&key, data_uri);
    }
    stored.set(sequence);
    notifier.dispatch(HostEvent::EmbedImage(EmbedImageEvent { session_key: key }));
    true
}

impl SaveImageController {
    pub fn new(chart: &ChartHandle, config: SaveImageConfig) -> PlotResult<Self> {
        config.validate()?;
        Ok(Self {
            chart: chart.clone(),
            config,
            buttons: Vec::new(),
            exports: Cell::new(0),
            stored: Rc::new(Cell::new(0)),
        })
    }

    #[must_use]
    pub fn buttons(&self) -> &[SaveButtonView] {
        &self.buttons
    }

    fn next_sequence(&self) -> u64 {
        let count = self.exports.get() + 1;
        self.exports.set(count);
        count
    }

    /// Starts an export and returns the session key the image lands under.
    ///
    /// SVG completes before returning. PNG completes when the rasterizer
    /// calls back; failures at that point are reported as an error toast.
    pub fn export(&self, format: ExportFormat) -> PlotResult<String> {
        let markup = {
            let root = self.chart.svg_root().borrow();
            let scene = self.chart.scene().borrow();
            export_svg_markup(&root, &scene, &self.config.styles)
        };
        let sequence = self.next_sequence();
        let chart_id = self.chart.id().to_owned();
        let key = image_key(&chart_id, sequence);
        let store = self.chart.session_store();

        match format {
            ExportFormat::Svg => {
                announce(
                    &store,
                    &self.stored,
                    self.chart.notifier().as_ref(),
                    &chart_id,
                    sequence,
                    svg_data_uri(&markup),
                );
                debug!(%key, "svg export stored");
            }
            ExportFormat::Png => {
                let rasterizer = self.chart.rasterizer().ok_or_else(|| {
                    PlotError::Export("png export needs a rasterizer".to_owned())
                })?;
                let notifier = Rc::clone(self.chart.notifier());
                let stored = Rc::clone(&self.stored);
                let pending_key = key.clone();
                rasterizer.decode(
                    &markup,
                    PNG_EXPORT_SCALE,
                    Box::new(move |decoded: PlotResult<RasterImage>| {
                        match decoded.and_then(|image| image.to_png_data_uri()) {
                            Ok(data_uri) => {
                                if announce(
                                    &store,
                                    &stored,
                                    notifier.as_ref(),
                                    &chart_id,
                                    sequence,
                                    data_uri,
                                ) {
                                    debug!(key = %pending_key, "png export stored");
                                }
                            }
                            Err(err) => {
                                error!(key = %pending_key, error = %err, "png export failed");
                                toast(
                                    notifier.as_ref(),
                                    ToastKind::Error,
                                    format!("Image export failed: {err}"),
                                );
                            }
                        }
                    }),
                );
            }
        }
        Ok(key)
    }
}

impl ChartPlugin for SaveImageController {
    fn name(&self) -> &'static str {
        SAVE_IMAGE_PLUGIN
    }

    /// Lays the buttons out right-aligned along the top of the figure.
    fn draw(&mut self) -> PlotResult<()> {
        let formats = self.config.formats()?;
        let layout = self.config.layout;
        let fontsize = self.config.fontsize;
        let height = layout.height(fontsize);
        let top = layout.offset;
        let mut scene = self.chart.scene().borrow_mut();

        let mut pending = Vec::with_capacity(formats.len());
        for format in formats {
            let background = scene.insert(
                "autoplot-save-button autoplot-save-button-rect",
                Shape::Rect(RectPrimitive::new(0.0, top, 0.0, height, BUTTON_STROKE).filled(BUTTON_FILL)),
            );
            let text = scene.insert(
                "autoplot-save-button autoplot-save-button-text",
                Shape::Text(TextPrimitive::new(
                    format.label(),
                    0.0,
                    top + layout.padding_y + fontsize * 0.8,
                    fontsize,
                    Color::BLACK,
                    TextHAlign::Left,
                )),
            );
            let width = scene.rendered_text_width(text).unwrap_or_default() + 2.0 * layout.padding_x;
            pending.push((format, background, text, width));
        }

        let total: f64 = pending.iter().map(|(_, _, _, width)| width).sum::<f64>()
            + layout.spacing * pending.len().saturating_sub(1) as f64;
        let mut x = (self.chart.viewport().width_px() - layout.offset - total).max(0.0);

        self.buttons.clear();
        for (format, background, text, width) in pending {
            if let Some(rect) = scene.rect_mut(background) {
                rect.x = x;
                rect.width = width;
            }
            if let Some(label) = scene.text_mut(text) {
                label.x = x + layout.padding_x;
            }
            self.buttons.push(SaveButtonView {
                format,
                bounds: PixelRect::new(x, top, width, height),
                background,
                text,
            });
            x += width + layout.spacing;
        }

        debug!(buttons = self.buttons.len(), "save buttons drawn");
        Ok(())
    }

    fn on_event(&mut self, event: PluginEvent) -> PlotResult<()> {
        let PluginEvent::Click { x, y } = event else {
            return Ok(());
        };
        let Some(format) = self
            .buttons
            .iter()
            .find(|button| button.bounds.contains(x, y))
            .map(|button| button.format)
        else {
            trace!(x, y, "click outside save buttons");
            return Ok(());
        };
        self.export(format).map(|_| ())
    }
}
