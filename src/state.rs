//! Visibility state shared by the legend, range selector and tooltip.
//!
//! The per-series hidden flag lives on `Series`; this module owns the
//! session-scoped persistence of that flag, keyed by legend label, so a
//! re-rendered chart starts with the visibility the user last chose.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::Series;
use crate::render::{ElementId, OverlayScene};

pub const LEGEND_KEY_PREFIX: &str = "autoplot-legend-";
pub const HIDDEN_VALUE: &str = "hidden";

/// Session-scoped key/value storage provided by the host.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> Option<String>;
}

pub type SharedSessionStore = Rc<RefCell<dyn SessionStore>>;

/// In-process store for hosts without browser session storage, and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySessionStore {
    entries: IndexMap<String, String>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }
}

#[must_use]
pub fn legend_key(label: &str) -> String {
    format!("{LEGEND_KEY_PREFIX}{label}")
}

/// Which series a legend toggle reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Only the series attached to the legend that was clicked.
    #[default]
    ActiveChart,
    /// Every registered series in the session carrying the same label.
    AllCharts,
}

/// Legend box drawn for a series in some chart's overlay scene.
struct Swatch {
    series: Weak<Series>,
    scene: Weak<RefCell<OverlayScene>>,
    rect: ElementId,
}

impl Swatch {
    fn is_live(&self) -> bool {
        self.series.strong_count() > 0 && self.scene.strong_count() > 0
    }

    /// Filled while the series is visible, outline only while hidden.
    fn restyle(&self) {
        let (Some(series), Some(scene)) = (self.series.upgrade(), self.scene.upgrade()) else {
            return;
        };
        if let Some(rect) = scene.borrow_mut().rect_mut(self.rect) {
            rect.fill = (!series.is_hidden()).then(|| series.color());
        }
    }
}

pub struct VisibilityState {
    store: SharedSessionStore,
    scope: VisibilityScope,
    registered: RefCell<Vec<(String, Weak<Series>)>>,
    swatches: RefCell<Vec<Swatch>>,
}

impl std::fmt::Debug for VisibilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityState")
            .field("scope", &self.scope)
            .field("registered", &self.registered.borrow().len())
            .field("swatches", &self.swatches.borrow().len())
            .finish()
    }
}

impl VisibilityState {
    #[must_use]
    pub fn new(store: SharedSessionStore, scope: VisibilityScope) -> Self {
        Self {
            store,
            scope,
            registered: RefCell::new(Vec::new()),
            swatches: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    #[must_use]
    pub fn scope(&self) -> VisibilityScope {
        self.scope
    }

    #[must_use]
    pub fn store(&self) -> SharedSessionStore {
        Rc::clone(&self.store)
    }

    /// Makes `series` reachable from toggles issued by other charts under
    /// `VisibilityScope::AllCharts`. Dropped series are pruned lazily.
    pub fn register(&self, chart_id: &str, series: &Rc<Series>) {
        let mut registered = self.registered.borrow_mut();
        registered.retain(|(_, entry)| entry.strong_count() > 0);
        let already = registered
            .iter()
            .any(|(_, entry)| entry.upgrade().is_some_and(|existing| Rc::ptr_eq(&existing, series)));
        if !already {
            registered.push((chart_id.to_owned(), Rc::downgrade(series)));
        }
    }

    /// Tracks the legend box drawn for `series` in `scene` so every later
    /// visibility change restyles it, whichever chart issued the change.
    /// A redraw of the same legend replaces its earlier box.
    pub fn register_swatch(
        &self,
        series: &Rc<Series>,
        scene: &Rc<RefCell<OverlayScene>>,
        rect: ElementId,
    ) {
        let series_ptr = Rc::as_ptr(series);
        let scene_ptr = Rc::as_ptr(scene);
        let mut swatches = self.swatches.borrow_mut();
        swatches.retain(|swatch| {
            swatch.is_live()
                && !(std::ptr::eq(swatch.series.as_ptr(), series_ptr)
                    && std::ptr::eq(swatch.scene.as_ptr(), scene_ptr))
        });
        swatches.push(Swatch {
            series: Rc::downgrade(series),
            scene: Rc::downgrade(scene),
            rect,
        });
    }

    /// Whether `label` was hidden earlier in this session.
    #[must_use]
    pub fn persisted_hidden(&self, label: &str) -> bool {
        self.store
            .borrow()
            .get(&legend_key(label))
            .is_some_and(|value| value == HIDDEN_VALUE)
    }

    /// Sets the hidden flag and opacity, then persists the choice.
    pub(crate) fn apply(&self, series: &Series, label: &str, hidden: bool, alpha: f64) {
        series.set_hidden(hidden);
        series.set_opacity(alpha);

        {
            let mut store = self.store.borrow_mut();
            let key = legend_key(label);
            if hidden {
                store.set(&key, HIDDEN_VALUE.to_owned());
            } else {
                store.remove(&key);
            }
        }

        if self.scope == VisibilityScope::AllCharts {
            let mut reached = 0usize;
            for (_, entry) in self.registered.borrow().iter() {
                let Some(other) = entry.upgrade() else {
                    continue;
                };
                if std::ptr::eq(Rc::as_ptr(&other), series) || other.label() != label {
                    continue;
                }
                other.set_hidden(hidden);
                other.set_opacity(alpha);
                reached += 1;
            }
            debug!(label, hidden, reached, "visibility propagated to other charts");
        }

        for swatch in self.swatches.borrow().iter() {
            swatch.restyle();
        }
    }

    /// Ids of charts with at least one live registered series.
    #[must_use]
    pub fn registered_charts(&self) -> Vec<String> {
        let mut charts: Vec<String> = Vec::new();
        for (chart, entry) in self.registered.borrow().iter() {
            if entry.strong_count() > 0 && !charts.contains(chart) {
                charts.push(chart.clone());
            }
        }
        charts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    fn series(label: &str) -> Rc<Series> {
        Rc::new(Series::new(label, label, Color::BLACK, Vec::new()).expect("series"))
    }

    #[test]
    fn hidden_labels_are_persisted_and_cleared() {
        let store = MemorySessionStore::new().shared();
        let state = VisibilityState::new(store.clone(), VisibilityScope::ActiveChart);
        let a = series("A");

        state.apply(&a, "A", true, 0.15);
        assert!(a.is_hidden());
        assert!(state.persisted_hidden("A"));
        assert_eq!(
            store.borrow().get("autoplot-legend-A").as_deref(),
            Some("hidden")
        );

        state.apply(&a, "A", false, 1.0);
        assert!(!state.persisted_hidden("A"));
        assert!(store.borrow().is_empty());
    }

    #[test]
    fn all_charts_scope_reaches_series_with_same_label() {
        let store = MemorySessionStore::new().shared();
        let state = VisibilityState::new(store, VisibilityScope::AllCharts);
        let first = series("A");
        let second = series("A");
        let other = series("B");
        state.register("chart-1", &first);
        state.register("chart-2", &second);
        state.register("chart-2", &other);

        state.apply(&first, "A", true, 0.2);
        assert!(second.is_hidden());
        assert!((second.opacity() - 0.2).abs() <= 1e-12);
        assert!(!other.is_hidden());
        assert_eq!(state.registered_charts(), vec!["chart-1", "chart-2"]);
    }

    #[test]
    fn active_chart_scope_leaves_other_charts_alone() {
        let store = MemorySessionStore::new().shared();
        let state = VisibilityState::new(store, VisibilityScope::ActiveChart);
        let first = series("A");
        let second = series("A");
        state.register("chart-1", &first);
        state.register("chart-2", &second);

        state.apply(&first, "A", true, 0.2);
        assert!(first.is_hidden());
        assert!(!second.is_hidden());
    }
}
