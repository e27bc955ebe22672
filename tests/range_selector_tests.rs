use std::cell::RefCell;
use std::rc::Rc;

use autoplot_charts::core::{
    AxesLimits, AxesView, DataPoint, LIMIT_TRANSITION_MS, LimitTransition, LinearAxes, PixelRect,
    SECONDS_PER_DAY, Series, Viewport, datetime_to_unix_seconds,
};
use autoplot_charts::notify::RecordingNotifier;
use autoplot_charts::plugins::{
    ChartHandle, ChartPlugin, RangeButton, RangeSelectorConfig, RangeSelectorController,
};
use autoplot_charts::render::Color;
use autoplot_charts::state::{MemorySessionStore, VisibilityScope, VisibilityState};
use autoplot_charts::{PlotError, PluginEvent};
use chrono::{TimeZone, Utc};

fn ts(year: i32, month: u32, day: u32) -> f64 {
    let time = Utc
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid date");
    datetime_to_unix_seconds(time)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn daily(start: f64, days: u32, value: impl Fn(u32) -> f64) -> Vec<DataPoint> {
    (0..=days)
        .map(|day| DataPoint::new(start + f64::from(day) * SECONDS_PER_DAY, value(day)))
        .collect()
}

fn axes(limits: AxesLimits) -> Rc<RefCell<LinearAxes>> {
    LinearAxes::new(PixelRect::new(50.0, 40.0, 500.0, 200.0), limits)
        .expect("axes")
        .shared()
}

fn chart(axes: &Rc<RefCell<LinearAxes>>, width: u32, series: Vec<Series>) -> ChartHandle {
    let store = MemorySessionStore::new().shared();
    let visibility = VisibilityState::new(store, VisibilityScope::ActiveChart).shared();
    let mut chart = ChartHandle::new(
        "chart-1",
        Viewport::new(width, 300),
        axes.clone(),
        visibility,
        Rc::new(RecordingNotifier::new()),
    )
    .expect("chart");
    for line in series {
        chart = chart.with_series(line).expect("add series");
    }
    chart
}

fn labels(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| (*label).to_owned()).collect()
}

fn mid_2021_axes() -> Rc<RefCell<LinearAxes>> {
    axes(AxesLimits::new((ts(2020, 1, 1), ts(2021, 6, 1)), (0.0, 100.0)))
}

#[test]
fn relative_buttons_use_calendar_arithmetic() {
    let axes = mid_2021_axes();
    let chart = chart(&axes, 600, Vec::new());
    let selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["1m", "1y", "ytd", "2w", "12h"])),
    )
    .expect("selector");

    assert!(selector.apply_label("1m").expect("1m"));
    let limits = axes.borrow().limits();
    assert_close(limits.x.0, ts(2021, 5, 1));
    assert_close(limits.x.1, ts(2021, 6, 1));
    assert_eq!(limits.y, (0.0, 100.0));

    selector.apply_label("1y").expect("1y");
    assert_close(axes.borrow().limits().x.0, ts(2020, 6, 1));

    selector.apply_label("ytd").expect("ytd");
    assert_close(axes.borrow().limits().x.0, ts(2021, 1, 1));

    selector.apply_label("2w").expect("2w");
    assert_close(axes.borrow().limits().x.0, ts(2021, 5, 18));

    selector.apply_label("12h").expect("12h");
    assert_close(
        axes.borrow().limits().x.0,
        ts(2021, 6, 1) - 0.5 * SECONDS_PER_DAY,
    );
}

#[test]
fn month_steps_clamp_to_the_end_of_shorter_months() {
    let axes = axes(AxesLimits::new((ts(2020, 1, 1), ts(2021, 3, 31)), (0.0, 1.0)));
    let chart = chart(&axes, 600, Vec::new());
    let selector =
        RangeSelectorController::new(&chart, RangeSelectorConfig::new(labels(&["1m"])))
            .expect("selector");

    let button: RangeButton = "1m".parse().expect("label");
    selector.apply(button).expect("1m");
    assert_close(axes.borrow().limits().x.0, ts(2021, 2, 28));
}

#[test]
fn limit_changes_are_animated_and_reach_linked_axes() {
    let axes = mid_2021_axes();
    let linked = LinearAxes::new(
        PixelRect::new(50.0, 260.0, 500.0, 30.0),
        AxesLimits::new((ts(2020, 1, 1), ts(2021, 6, 1)), (-5.0, 5.0)),
    )
    .expect("linked axes")
    .shared();
    axes.borrow_mut().link_x(&linked);

    let chart = chart(&axes, 600, Vec::new());
    let selector =
        RangeSelectorController::new(&chart, RangeSelectorConfig::new(labels(&["1m"])))
            .expect("selector");
    selector.apply_label("1m").expect("1m");

    let transition = axes.borrow().last_transition().expect("transition");
    assert_eq!(
        transition,
        LimitTransition {
            duration_ms: LIMIT_TRANSITION_MS,
            propagate: true,
        }
    );
    assert_eq!(transition.duration_ms, 750);

    let linked_limits = linked.borrow().limits();
    assert_close(linked_limits.x.0, ts(2021, 5, 1));
    assert_close(linked_limits.x.1, ts(2021, 6, 1));
    assert_eq!(linked_limits.y, (-5.0, 5.0));
}

#[test]
fn fit_covers_only_visible_series() {
    let start = ts(2021, 1, 1);
    let axes = axes(AxesLimits::new(
        (start, start + 200.0 * SECONDS_PER_DAY),
        (0.0, 2_000.0),
    ));
    let first = Series::new(
        "a",
        "A",
        Color::BLACK,
        daily(start, 10, |day| 10.0 + f64::from(day)),
    )
    .expect("a");
    let hidden = Series::new(
        "b",
        "B",
        Color::BLACK,
        daily(start + 100.0 * SECONDS_PER_DAY, 10, |_| 1_000.0),
    )
    .expect("b")
    .with_hidden(true);
    let last = Series::new(
        "c",
        "C",
        Color::BLACK,
        daily(start + 40.0 * SECONDS_PER_DAY, 10, |_| 30.0),
    )
    .expect("c");
    let chart = chart(&axes, 600, vec![first, hidden, last]);

    let selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["fit"])).with_line_ids(labels(&["a", "b", "c"])),
    )
    .expect("selector");
    assert!(selector.apply(RangeButton::Fit).expect("fit"));

    let limits = axes.borrow().limits();
    assert_close(limits.x.0, start);
    assert_close(limits.x.1, start + 50.0 * SECONDS_PER_DAY);
    assert_close(limits.y.0, 10.0 - 0.2);
    assert_close(limits.y.1, 30.0 + 0.2);
}

#[test]
fn fit_with_every_series_hidden_leaves_limits_alone() {
    let start = ts(2021, 1, 1);
    let initial = AxesLimits::new((start, start + 20.0 * SECONDS_PER_DAY), (0.0, 50.0));
    let axes = axes(initial);
    let only = Series::new("a", "A", Color::BLACK, daily(start, 5, f64::from))
        .expect("a")
        .with_hidden(true);
    let chart = chart(&axes, 600, vec![only]);

    let selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["fit"])).with_line_ids(labels(&["a"])),
    )
    .expect("selector");

    assert!(!selector.apply(RangeButton::Fit).expect("fit"));
    assert_eq!(axes.borrow().limits(), initial);
    assert!(axes.borrow().last_transition().is_none());
}

#[test]
fn reset_restores_the_initial_limits() {
    let axes = mid_2021_axes();
    let initial = axes.borrow().initial_limits();
    let chart = chart(&axes, 600, Vec::new());
    let selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["reset", "3m"])),
    )
    .expect("selector");

    selector.apply_label("3m").expect("3m");
    assert_ne!(axes.borrow().limits(), initial);

    assert!(selector.apply(RangeButton::Reset).expect("reset"));
    assert_eq!(axes.borrow().limits(), initial);
}

#[test]
fn buttons_past_the_right_margin_are_skipped() {
    let axes = mid_2021_axes();
    let chart = chart(&axes, 200, Vec::new());
    let mut selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["reset", "1y", "1m", "3m"])).with_margin_right(40.0),
    )
    .expect("selector");
    selector.draw().expect("draw");

    // 7.8px glyphs plus 5px padding each side: reset 49, 1y 25.6 ending at 129.6.
    let placed: Vec<bool> = selector.buttons().iter().map(|view| view.placed).collect();
    assert_eq!(placed, vec![true, true, false, false]);

    let first = selector.buttons()[0].bounds;
    assert_close(first.left, 50.0);
    assert_close(first.top, 16.0);
    assert_close(first.width, 49.0);
    assert_close(first.height, 19.0);
    assert_close(selector.buttons()[1].bounds.left, 104.0);

    let scene = chart.scene().borrow();
    let (background, text) = selector.buttons()[2].elements();
    assert!(!scene.is_visible(background));
    assert!(!scene.is_visible(text));
    let (background, text) = selector.buttons()[1].elements();
    assert!(scene.is_visible(background));
    assert!(scene.is_visible(text));
}

#[test]
fn without_a_margin_every_button_fits() {
    let axes = mid_2021_axes();
    let chart = chart(&axes, 200, Vec::new());
    let mut selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["reset", "1y", "1m", "3m"])),
    )
    .expect("selector");
    selector.draw().expect("draw");
    assert!(selector.buttons().iter().all(|view| view.placed));
}

#[test]
fn clicking_a_button_applies_it() {
    let axes = mid_2021_axes();
    let chart = chart(&axes, 600, Vec::new());
    let mut selector = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["reset", "1y"])),
    )
    .expect("selector");
    selector.draw().expect("draw");

    let bounds = selector.buttons()[1].bounds;
    assert_eq!(selector.buttons()[1].button.to_string(), "1y");
    selector
        .on_event(PluginEvent::Click {
            x: bounds.left + bounds.width / 2.0,
            y: bounds.top + bounds.height / 2.0,
        })
        .expect("click 1y");
    assert_close(axes.borrow().limits().x.0, ts(2020, 6, 1));

    selector
        .on_event(PluginEvent::Click { x: 590.0, y: 290.0 })
        .expect("click elsewhere");
    assert_close(axes.borrow().limits().x.0, ts(2020, 6, 1));

    selector
        .on_event(PluginEvent::PointerDown {
            x: bounds.left + 1.0,
            y: bounds.top + 1.0,
        })
        .expect("pointer down");
    assert_close(axes.borrow().limits().x.0, ts(2020, 6, 1));
}

#[test]
fn invalid_configurations_are_rejected() {
    let axes = mid_2021_axes();
    let chart = chart(&axes, 600, Vec::new());

    let bad_label = RangeSelectorController::new(&chart, RangeSelectorConfig::new(labels(&["7q"])));
    assert!(matches!(bad_label, Err(PlotError::InvalidConfig(_))));

    let empty_range = RangeSelectorController::new(&chart, RangeSelectorConfig::new(labels(&["0d"])));
    assert!(matches!(empty_range, Err(PlotError::InvalidConfig(_))));

    let fit_without_lines =
        RangeSelectorController::new(&chart, RangeSelectorConfig::new(labels(&["fit"])));
    assert!(matches!(fit_without_lines, Err(PlotError::InvalidConfig(_))));

    let unknown_line = RangeSelectorController::new(
        &chart,
        RangeSelectorConfig::new(labels(&["fit"])).with_line_ids(labels(&["nope"])),
    );
    assert!(matches!(unknown_line, Err(PlotError::InvalidConfig(_))));

    let selector =
        RangeSelectorController::new(&chart, RangeSelectorConfig::new(labels(&["1m"])))
            .expect("selector");
    assert!(matches!(
        selector.apply_label("soon"),
        Err(PlotError::InvalidConfig(_))
    ));
}
