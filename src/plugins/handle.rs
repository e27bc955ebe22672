use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{Series, SharedAxes, Viewport};
use crate::error::{PlotError, PlotResult};
use crate::export::Rasterizer;
use crate::notify::Notifier;
use crate::render::{MonospaceMeasure, OverlayScene, Renderer, TextMeasure};
use crate::state::{SharedSessionStore, VisibilityState};
use crate::svg::{SVG_NAMESPACE, SvgNode};

/// Everything a plugin may touch on one rendered chart.
///
/// Cloning is cheap; clones share the same axes, series, scene and state.
#[derive(Clone)]
pub struct ChartHandle {
    id: Rc<str>,
    viewport: Viewport,
    axes: SharedAxes,
    series: Vec<Rc<Series>>,
    scene: Rc<RefCell<OverlayScene>>,
    svg_root: Rc<RefCell<SvgNode>>,
    visibility: Rc<VisibilityState>,
    notifier: Rc<dyn Notifier>,
    rasterizer: Option<Rc<dyn Rasterizer>>,
}

impl std::fmt::Debug for ChartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartHandle")
            .field("id", &self.id)
            .field("viewport", &self.viewport)
            .field("series", &self.series.len())
            .field("rasterizer", &self.rasterizer.is_some())
            .finish()
    }
}

impl ChartHandle {
    pub fn new(
        id: impl Into<String>,
        viewport: Viewport,
        axes: SharedAxes,
        visibility: Rc<VisibilityState>,
        notifier: Rc<dyn Notifier>,
    ) -> PlotResult<Self> {
        let id: String = id.into();
        if id.is_empty() {
            return Err(PlotError::InvalidData("chart id must not be empty".to_owned()));
        }
        if !viewport.is_valid() {
            return Err(PlotError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let svg_root = SvgNode::new("svg")
            .with_attr("xmlns", SVG_NAMESPACE)
            .with_attr("width", viewport.width.to_string())
            .with_attr("height", viewport.height.to_string())
            .with_attr(
                "viewBox",
                format!("0 0 {} {}", viewport.width, viewport.height),
            );

        Ok(Self {
            id: Rc::from(id),
            viewport,
            axes,
            series: Vec::new(),
            scene: Rc::new(RefCell::new(OverlayScene::new(
                viewport,
                Rc::new(MonospaceMeasure::default()),
            ))),
            svg_root: Rc::new(RefCell::new(svg_root)),
            visibility,
            notifier,
            rasterizer: None,
        })
    }

    /// Adds a line and registers it for cross-chart visibility updates.
    pub fn with_series(mut self, series: Series) -> PlotResult<Self> {
        if self.series_by_id(series.id()).is_some() {
            return Err(PlotError::InvalidData(format!(
                "series `{}` is already attached to chart `{}`",
                series.id(),
                self.id
            )));
        }
        let series = Rc::new(series);
        self.visibility.register(&self.id, &series);
        self.series.push(series);
        Ok(self)
    }

    /// Replaces the host SVG tree used for image export.
    #[must_use]
    pub fn with_svg_root(self, root: SvgNode) -> Self {
        *self.svg_root.borrow_mut() = root;
        self
    }

    /// Swaps the text measurer. Call before any plugin draws.
    #[must_use]
    pub fn with_text_measure(mut self, measure: Rc<dyn TextMeasure>) -> Self {
        self.scene = Rc::new(RefCell::new(OverlayScene::new(self.viewport, measure)));
        self
    }

    #[must_use]
    pub fn with_rasterizer(mut self, rasterizer: Rc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn axes(&self) -> &SharedAxes {
        &self.axes
    }

    #[must_use]
    pub fn series(&self) -> &[Rc<Series>] {
        &self.series
    }

    #[must_use]
    pub fn series_by_id(&self, id: &str) -> Option<&Rc<Series>> {
        self.series.iter().find(|series| series.id() == id)
    }

    /// Looks up configured line ids; an unknown id is a configuration error.
    pub fn resolve_series(&self, ids: &[String]) -> PlotResult<Vec<Rc<Series>>> {
        ids.iter()
            .map(|id| {
                self.series_by_id(id).cloned().ok_or_else(|| {
                    PlotError::InvalidConfig(format!(
                        "line id `{id}` is not part of chart `{}`",
                        self.id
                    ))
                })
            })
            .collect()
    }

    #[must_use]
    pub fn scene(&self) -> &Rc<RefCell<OverlayScene>> {
        &self.scene
    }

    #[must_use]
    pub fn svg_root(&self) -> &Rc<RefCell<SvgNode>> {
        &self.svg_root
    }

    #[must_use]
    pub fn visibility(&self) -> &Rc<VisibilityState> {
        &self.visibility
    }

    #[must_use]
    pub fn session_store(&self) -> SharedSessionStore {
        self.visibility.store()
    }

    #[must_use]
    pub fn notifier(&self) -> &Rc<dyn Notifier> {
        &self.notifier
    }

    #[must_use]
    pub fn rasterizer(&self) -> Option<&Rc<dyn Rasterizer>> {
        self.rasterizer.as_ref()
    }

    /// Axes bounds at call time.
    #[must_use]
    pub fn axes_bounds(&self) -> crate::core::PixelRect {
        self.axes.borrow().bounds()
    }

    /// Draws the visible overlay through `renderer`.
    pub fn render_overlay<R: Renderer>(&self, renderer: &mut R) -> PlotResult<()> {
        let frame = self.scene.borrow().to_render_frame();
        frame.validate()?;
        renderer.render(&frame)
    }
}
