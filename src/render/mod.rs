mod frame;
mod measure;
mod null_renderer;
mod primitives;
mod scene;

pub use frame::RenderFrame;
pub use measure::{MonospaceMeasure, TextMeasure};
pub use null_renderer::NullRenderer;
pub use primitives::{
    CirclePrimitive, Color, LinePrimitive, RectPrimitive, TextHAlign, TextPrimitive,
};
pub use scene::{ElementId, OverlayElement, OverlayScene, Shape};

use crate::error::PlotResult;

/// Contract implemented by any overlay rendering backend.
///
/// Backends receive a fully materialized `RenderFrame` so drawing code stays
/// isolated from plugin state and pointer handling.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> PlotResult<()>;
}
