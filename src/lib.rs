//! autoplot-charts: interactive plugins for notebook time series charts.
//!
//! The host plotting library renders a chart once and hands over its axes,
//! lines and SVG tree. Plugins layer a clickable legend, range selector
//! buttons, a drag tooltip and image export on top, sharing series visibility
//! through a session-scoped store.

pub mod core;
pub mod error;
pub mod export;
pub mod format;
pub mod geometry;
pub mod notify;
pub mod plugins;
pub mod render;
pub mod search;
pub mod state;
pub mod svg;
pub mod telemetry;

pub use error::{PlotError, PlotResult};
pub use plugins::{ChartHandle, ChartPlugin, PluginEvent, PluginHost, PluginRegistry};
