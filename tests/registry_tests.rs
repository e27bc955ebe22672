use std::rc::Rc;

use autoplot_charts::core::{AxesLimits, DataPoint, LinearAxes, PixelRect, Series, Viewport};
use autoplot_charts::notify::RecordingNotifier;
use autoplot_charts::plugins::{
    LEGEND_PLUGIN, PluginConfig, RANGE_SELECTOR_PLUGIN, SAVE_IMAGE_PLUGIN, TOOLTIP_PLUGIN,
};
use autoplot_charts::render::Color;
use autoplot_charts::state::{MemorySessionStore, VisibilityScope, VisibilityState};
use autoplot_charts::{
    ChartHandle, ChartPlugin, PlotError, PlotResult, PluginEvent, PluginHost, PluginRegistry,
};
use serde_json::json;

struct BrokenPlugin;

impl ChartPlugin for BrokenPlugin {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn draw(&mut self) -> PlotResult<()> {
        Err(PlotError::InvalidData("nothing to draw".to_owned()))
    }

    fn on_event(&mut self, _event: PluginEvent) -> PlotResult<()> {
        Err(PlotError::InvalidData("no handler".to_owned()))
    }
}

fn build_broken(
    _chart: &ChartHandle,
    _config: serde_json::Value,
) -> PlotResult<Box<dyn ChartPlugin>> {
    Ok(Box::new(BrokenPlugin))
}

fn chart() -> ChartHandle {
    let store = MemorySessionStore::new().shared();
    let visibility = VisibilityState::new(store, VisibilityScope::ActiveChart).shared();
    let axes = LinearAxes::new(
        PixelRect::new(50.0, 40.0, 400.0, 200.0),
        AxesLimits::new((0.0, 10.0 * 86_400.0), (0.0, 10.0)),
    )
    .expect("axes")
    .shared();
    let points: Vec<DataPoint> = (0..=10)
        .map(|day| DataPoint::new(f64::from(day) * 86_400.0, f64::from(day)))
        .collect();
    ChartHandle::new(
        "chart-1",
        Viewport::new(600, 320),
        axes,
        visibility,
        Rc::new(RecordingNotifier::new()),
    )
    .expect("chart")
    .with_series(Series::new("l0", "A", Color::BLACK, points.clone()).expect("l0"))
    .expect("add l0")
    .with_series(Series::new("l1", "B", Color::WHITE, points).expect("l1"))
    .expect("add l1")
}

#[test]
fn builtin_registry_knows_every_plugin() {
    let registry = PluginRegistry::with_builtin_plugins();
    let names: Vec<&str> = registry.names().collect();
    assert_eq!(
        names,
        vec![
            LEGEND_PLUGIN,
            RANGE_SELECTOR_PLUGIN,
            TOOLTIP_PLUGIN,
            SAVE_IMAGE_PLUGIN
        ]
    );
    assert!(!PluginRegistry::new().contains(LEGEND_PLUGIN));
}

#[test]
fn host_builds_plugins_from_json() {
    let registry = PluginRegistry::with_builtin_plugins();
    let mut host = PluginHost::new(chart());

    host.attach_config(
        &registry,
        json!({"type": "interactive_legend", "line_ids": ["l0", "l1"], "labels": ["A", "B"]}),
    )
    .expect("legend");
    host.attach_config(
        &registry,
        json!({"type": "range_selector_buttons", "button_labels": ["reset", "fit", "1m"], "line_ids": ["l0"]}),
    )
    .expect("range selector");
    host.attach_config(
        &registry,
        json!({"type": "time_series_tooltip", "line_ids": ["l0", "l1"]}),
    )
    .expect("tooltip");
    host.attach_config(
        &registry,
        json!({"type": "save_image_buttons", "button_labels": ["SVG"]}),
    )
    .expect("save buttons");

    assert_eq!(host.plugin_count(), 4);
    assert!(host.has_plugin(TOOLTIP_PLUGIN));
    assert_eq!(host.draw_all(), 4);
    assert!(!host.chart().scene().borrow().is_empty());
}

#[test]
fn one_plugin_per_name_per_chart() {
    let registry = PluginRegistry::with_builtin_plugins();
    let mut host = PluginHost::new(chart());
    let config = json!({"type": "time_series_tooltip", "line_ids": ["l0"]});

    host.attach_config(&registry, config.clone()).expect("first");
    let second = host.attach_config(&registry, config);
    assert!(matches!(second, Err(PlotError::InvalidConfig(_))));
    assert_eq!(host.plugin_count(), 1);
}

#[test]
fn malformed_configs_are_rejected() {
    let registry = PluginRegistry::with_builtin_plugins();
    let chart = chart();

    let unknown = registry.build(&chart, json!({"type": "pie_chart"}));
    assert!(matches!(unknown, Err(PlotError::InvalidConfig(_))));

    let untyped = registry.build(&chart, json!({"line_ids": ["l0"]}));
    assert!(matches!(untyped, Err(PlotError::InvalidConfig(_))));

    let missing_field = registry.build(&chart, json!({"type": "interactive_legend"}));
    assert!(matches!(missing_field, Err(PlotError::Json(_))));

    let unknown_line = registry.build(
        &chart,
        json!({"type": "time_series_tooltip", "line_ids": ["l9"]}),
    );
    assert!(matches!(unknown_line, Err(PlotError::InvalidConfig(_))));
}

#[test]
fn failing_plugins_do_not_stop_the_others() {
    let mut registry = PluginRegistry::with_builtin_plugins();
    registry.register("broken", build_broken).expect("register");
    assert!(matches!(
        registry.register("broken", build_broken),
        Err(PlotError::InvalidConfig(_))
    ));
    assert!(matches!(
        registry.register("", build_broken),
        Err(PlotError::InvalidConfig(_))
    ));

    let mut host = PluginHost::new(chart());
    host.attach_config(&registry, json!({"type": "broken"}))
        .expect("broken");
    host.attach_config(
        &registry,
        json!({"type": "interactive_legend", "line_ids": ["l0"], "labels": ["A"]}),
    )
    .expect("legend");

    assert_eq!(host.draw_all(), 1);
    assert_eq!(host.dispatch(PluginEvent::Click { x: 0.0, y: 0.0 }), 1);
}

#[test]
fn typed_configs_deserialize_with_defaults() {
    let config: PluginConfig = serde_json::from_value(json!({
        "type": "range_selector_buttons",
        "button_labels": ["1y", "ytd"]
    }))
    .expect("config");
    assert_eq!(config.plugin_name(), RANGE_SELECTOR_PLUGIN);
    config.validate().expect("valid");

    let PluginConfig::RangeSelector(range) = config else {
        panic!("expected range selector config");
    };
    assert!((range.fontsize - 13.0).abs() <= 1e-12);
    assert!(range.margin_right.abs() <= 1e-12);
    assert!(range.line_ids.is_none());

    let fit_without_lines: PluginConfig = serde_json::from_value(json!({
        "type": "range_selector_buttons",
        "button_labels": ["fit"]
    }))
    .expect("config");
    assert!(fit_without_lines.validate().is_err());
}
