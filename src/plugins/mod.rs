//! Interactive chart plugins and their registry.
//!
//! Each plugin attaches to a `ChartHandle`, draws its chrome once the host
//! chart exists, then reacts to pointer events routed by `PluginHost`.

mod config;
mod handle;
pub mod legend;
pub mod range_selector;
pub mod save_image;
pub mod tooltip;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{PlotError, PlotResult};

pub use config::{
    ButtonLayout, LEGEND_PLUGIN, LegendConfig, LegendLayout, PluginConfig, RANGE_SELECTOR_PLUGIN,
    RangeSelectorConfig, SAVE_IMAGE_PLUGIN, SaveImageConfig, TOOLTIP_PLUGIN, TooltipConfig,
    TooltipLayout,
};
pub use handle::ChartHandle;
pub use legend::{LegendController, LegendItem};
pub use range_selector::{RangeButton, RangeSelectorController, RangeUnit};
pub use save_image::SaveImageController;
pub use tooltip::{TooltipController, TooltipPhase};

/// Pointer input in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PluginEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    Click { x: f64, y: f64 },
}

/// One interactive feature attached to a chart.
pub trait ChartPlugin {
    /// Stable plugin name, e.g. `interactive_legend`.
    fn name(&self) -> &'static str;

    /// Called once after the host chart's geometry exists.
    fn draw(&mut self) -> PlotResult<()>;

    fn on_event(&mut self, _event: PluginEvent) -> PlotResult<()> {
        Ok(())
    }
}

pub type PluginFactory = fn(&ChartHandle, serde_json::Value) -> PlotResult<Box<dyn ChartPlugin>>;

fn build_legend(chart: &ChartHandle, config: serde_json::Value) -> PlotResult<Box<dyn ChartPlugin>> {
    let config: LegendConfig = serde_json::from_value(config)?;
    Ok(Box::new(LegendController::new(chart, config)?))
}

fn build_range_selector(
    chart: &ChartHandle,
    config: serde_json::Value,
) -> PlotResult<Box<dyn ChartPlugin>> {
    let config: RangeSelectorConfig = serde_json::from_value(config)?;
    Ok(Box::new(RangeSelectorController::new(chart, config)?))
}

fn build_tooltip(chart: &ChartHandle, config: serde_json::Value) -> PlotResult<Box<dyn ChartPlugin>> {
    let config: TooltipConfig = serde_json::from_value(config)?;
    Ok(Box::new(TooltipController::new(chart, config)?))
}

fn build_save_image(
    chart: &ChartHandle,
    config: serde_json::Value,
) -> PlotResult<Box<dyn ChartPlugin>> {
    let config: SaveImageConfig = serde_json::from_value(config)?;
    Ok(Box::new(SaveImageController::new(chart, config)?))
}

/// Plugin constructors keyed by the `"type"` field of their configuration.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    factories: IndexMap<String, PluginFactory>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the legend, range selector, tooltip and save
    /// image plugins.
    #[must_use]
    pub fn with_builtin_plugins() -> Self {
        let mut factories: IndexMap<String, PluginFactory> = IndexMap::new();
        factories.insert(LEGEND_PLUGIN.to_owned(), build_legend);
        factories.insert(RANGE_SELECTOR_PLUGIN.to_owned(), build_range_selector);
        factories.insert(TOOLTIP_PLUGIN.to_owned(), build_tooltip);
        factories.insert(SAVE_IMAGE_PLUGIN.to_owned(), build_save_image);
        Self { factories }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: PluginFactory) -> PlotResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(PlotError::InvalidConfig(
                "plugin name must not be empty".to_owned(),
            ));
        }
        if self.factories.contains_key(&name) {
            return Err(PlotError::InvalidConfig(format!(
                "plugin `{name}` is already registered"
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Builds the plugin named by `config["type"]`.
    pub fn build(
        &self,
        chart: &ChartHandle,
        config: serde_json::Value,
    ) -> PlotResult<Box<dyn ChartPlugin>> {
        let name = config
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                PlotError::InvalidConfig("plugin config has no string `type`".to_owned())
            })?
            .to_owned();
        let factory = self
            .factories
            .get(&name)
            .ok_or_else(|| PlotError::InvalidConfig(format!("unknown plugin type `{name}`")))?;
        factory(chart, config)
    }
}

/// Plugins attached to one chart, drawn and fed events in attach order.
pub struct PluginHost {
    chart: ChartHandle,
    plugins: Vec<Box<dyn ChartPlugin>>,
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("PluginHost")
            .field("chart", &self.chart.id())
            .field("plugins", &names)
            .finish()
    }
}

impl PluginHost {
    #[must_use]
    pub fn new(chart: ChartHandle) -> Self {
        Self {
            chart,
            plugins: Vec::new(),
        }
    }

    #[must_use]
    pub fn chart(&self) -> &ChartHandle {
        &self.chart
    }

    /// Attaches a plugin; one instance per plugin name.
    pub fn attach(&mut self, plugin: Box<dyn ChartPlugin>) -> PlotResult<()> {
        let name = plugin.name();
        if self.has_plugin(name) {
            return Err(PlotError::InvalidConfig(format!(
                "plugin `{name}` is already attached to chart `{}`",
                self.chart.id()
            )));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Builds a plugin from JSON through `registry` and attaches it.
    pub fn attach_config(
        &mut self,
        registry: &PluginRegistry,
        config: serde_json::Value,
    ) -> PlotResult<()> {
        let plugin = registry.build(&self.chart, config)?;
        self.attach(plugin)
    }

    #[must_use]
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|plugin| plugin.name() == name)
    }

    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Draws every plugin. A failing plugin is logged and skipped.
    ///
    /// Returns how many plugins drew successfully.
    pub fn draw_all(&mut self) -> usize {
        let mut drawn = 0;
        for plugin in &mut self.plugins {
            match plugin.draw() {
                Ok(()) => drawn += 1,
                Err(err) => error!(plugin = plugin.name(), error = %err, "plugin draw failed"),
            }
        }
        debug!(chart = self.chart.id(), drawn, total = self.plugins.len(), "plugins drawn");
        drawn
    }

    /// Routes `event` to every plugin. Errors stay scoped to their plugin.
    ///
    /// Returns how many plugins failed.
    pub fn dispatch(&mut self, event: PluginEvent) -> usize {
        let mut failed = 0;
        for plugin in &mut self.plugins {
            if let Err(err) = plugin.on_event(event) {
                failed += 1;
                error!(plugin = plugin.name(), error = %err, ?event, "plugin event failed");
            }
        }
        failed
    }
}
