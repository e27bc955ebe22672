use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};
use crate::export::{ExportFormat, ExportStyles};
use crate::plugins::range_selector::RangeButton;

pub const LEGEND_PLUGIN: &str = "interactive_legend";
pub const RANGE_SELECTOR_PLUGIN: &str = "range_selector_buttons";
pub const TOOLTIP_PLUGIN: &str = "time_series_tooltip";
pub const SAVE_IMAGE_PLUGIN: &str = "save_image_buttons";

/// Any plugin configuration, tagged by plugin name under `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PluginConfig {
    #[serde(rename = "interactive_legend")]
    Legend(LegendConfig),
    #[serde(rename = "range_selector_buttons")]
    RangeSelector(RangeSelectorConfig),
    #[serde(rename = "time_series_tooltip")]
    Tooltip(TooltipConfig),
    #[serde(rename = "save_image_buttons")]
    SaveImage(SaveImageConfig),
}

impl PluginConfig {
    #[must_use]
    pub fn plugin_name(&self) -> &'static str {
        match self {
            Self::Legend(_) => LEGEND_PLUGIN,
            Self::RangeSelector(_) => RANGE_SELECTOR_PLUGIN,
            Self::Tooltip(_) => TOOLTIP_PLUGIN,
            Self::SaveImage(_) => SAVE_IMAGE_PLUGIN,
        }
    }

    pub fn validate(&self) -> PlotResult<()> {
        match self {
            Self::Legend(config) => config.validate(),
            Self::RangeSelector(config) => config.validate(),
            Self::Tooltip(config) => config.validate(),
            Self::SaveImage(config) => config.validate(),
        }
    }
}

fn validate_fontsize(plugin: &str, fontsize: f64) -> PlotResult<()> {
    if !fontsize.is_finite() || fontsize <= 0.0 {
        return Err(PlotError::InvalidConfig(format!(
            "{plugin}: fontsize must be finite and > 0"
        )));
    }
    Ok(())
}

fn validate_non_negative(plugin: &str, name: &str, value: f64) -> PlotResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlotError::InvalidConfig(format!(
            "{plugin}: {name} must be finite and >= 0"
        )));
    }
    Ok(())
}

fn default_alpha_visible() -> f64 {
    1.0
}

fn default_alpha_hidden() -> f64 {
    0.15
}

fn default_fontsize() -> f64 {
    13.0
}

fn default_tooltip_fontsize() -> f64 {
    12.0
}

/// Legend row geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendLayout {
    /// Gap between the axes' bottom edge and the first row.
    pub top_offset: f64,
    pub row_padding: f64,
    pub item_spacing: f64,
    pub box_label_gap: f64,
}

impl Default for LegendLayout {
    fn default() -> Self {
        Self {
            top_offset: 30.0,
            row_padding: 6.0,
            item_spacing: 15.0,
            box_label_gap: 5.0,
        }
    }
}

impl LegendLayout {
    pub fn validate(self) -> PlotResult<()> {
        for (name, value) in [
            ("top_offset", self.top_offset),
            ("row_padding", self.row_padding),
            ("item_spacing", self.item_spacing),
            ("box_label_gap", self.box_label_gap),
        ] {
            validate_non_negative(LEGEND_PLUGIN, name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendConfig {
    pub line_ids: Vec<String>,
    pub labels: Vec<String>,
    #[serde(default = "default_alpha_visible")]
    pub alpha_visible: f64,
    #[serde(default = "default_alpha_hidden")]
    pub alpha_hidden: f64,
    #[serde(default = "default_fontsize")]
    pub fontsize: f64,
    #[serde(default)]
    pub layout: LegendLayout,
}

impl LegendConfig {
    #[must_use]
    pub fn new(line_ids: Vec<String>, labels: Vec<String>) -> Self {
        Self {
            line_ids,
            labels,
            alpha_visible: default_alpha_visible(),
            alpha_hidden: default_alpha_hidden(),
            fontsize: default_fontsize(),
            layout: LegendLayout::default(),
        }
    }

    #[must_use]
    pub fn with_alphas(mut self, alpha_visible: f64, alpha_hidden: f64) -> Self {
        self.alpha_visible = alpha_visible;
        self.alpha_hidden = alpha_hidden;
        self
    }

    #[must_use]
    pub fn with_fontsize(mut self, fontsize: f64) -> Self {
        self.fontsize = fontsize;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LegendLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn validate(&self) -> PlotResult<()> {
        if self.line_ids.len() != self.labels.len() {
            return Err(PlotError::InvalidConfig(format!(
                "{LEGEND_PLUGIN}: {} line ids but {} labels",
                self.line_ids.len(),
                self.labels.len()
            )));
        }
        for (name, alpha) in [
            ("alpha_visible", self.alpha_visible),
            ("alpha_hidden", self.alpha_hidden),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(PlotError::InvalidConfig(format!(
                    "{LEGEND_PLUGIN}: {name} must be in [0, 1], got {alpha}"
                )));
            }
        }
        validate_fontsize(LEGEND_PLUGIN, self.fontsize)?;
        self.layout.validate()
    }
}

/// Geometry shared by the range and save button rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonLayout {
    pub padding_x: f64,
    pub padding_y: f64,
    pub spacing: f64,
    /// Gap between the button row and the element it is anchored to.
    pub offset: f64,
}

impl Default for ButtonLayout {
    fn default() -> Self {
        Self {
            padding_x: 5.0,
            padding_y: 3.0,
            spacing: 5.0,
            offset: 5.0,
        }
    }
}

impl ButtonLayout {
    pub fn validate(self, plugin: &str) -> PlotResult<()> {
        for (name, value) in [
            ("padding_x", self.padding_x),
            ("padding_y", self.padding_y),
            ("spacing", self.spacing),
            ("offset", self.offset),
        ] {
            validate_non_negative(plugin, name, value)?;
        }
        Ok(())
    }

    /// Button height for a font size.
    #[must_use]
    pub fn height(self, fontsize: f64) -> f64 {
        fontsize + 2.0 * self.padding_y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSelectorConfig {
    pub button_labels: Vec<String>,
    /// Series considered by `fit`; required when a `fit` button is configured.
    #[serde(default)]
    pub line_ids: Option<Vec<String>>,
    #[serde(default)]
    pub margin_right: f64,
    #[serde(default = "default_fontsize")]
    pub fontsize: f64,
    #[serde(default)]
    pub layout: ButtonLayout,
}

impl RangeSelectorConfig {
    #[must_use]
    pub fn new(button_labels: Vec<String>) -> Self {
        Self {
            button_labels,
            line_ids: None,
            margin_right: 0.0,
            fontsize: default_fontsize(),
            layout: ButtonLayout::default(),
        }
    }

    #[must_use]
    pub fn with_line_ids(mut self, line_ids: Vec<String>) -> Self {
        self.line_ids = Some(line_ids);
        self
    }

    #[must_use]
    pub fn with_margin_right(mut self, margin_right: f64) -> Self {
        self.margin_right = margin_right;
        self
    }

    #[must_use]
    pub fn with_fontsize(mut self, fontsize: f64) -> Self {
        self.fontsize = fontsize;
        self
    }

    /// Parses every label, failing on the first unrecognised one.
    pub fn buttons(&self) -> PlotResult<Vec<RangeButton>> {
        self.button_labels
            .iter()
            .map(|label| label.parse::<RangeButton>())
            .collect()
    }

    pub fn validate(&self) -> PlotResult<()> {
        let buttons = self.buttons()?;
        if buttons.contains(&RangeButton::Fit) && self.line_ids.is_none() {
            return Err(PlotError::InvalidConfig(format!(
                "{RANGE_SELECTOR_PLUGIN}: `fit` requires line_ids"
            )));
        }
        validate_non_negative(RANGE_SELECTOR_PLUGIN, "margin_right", self.margin_right)?;
        validate_fontsize(RANGE_SELECTOR_PLUGIN, self.fontsize)?;
        self.layout.validate(RANGE_SELECTOR_PLUGIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipLayout {
    pub marker_radius: f64,
    pub label_padding: f64,
    /// Distance from the axes' right edge to the value labels.
    pub value_label_gap: f64,
    /// Distance from the axes' bottom edge to the time label.
    pub time_label_gap: f64,
    pub line_width: f64,
}

impl Default for TooltipLayout {
    fn default() -> Self {
        Self {
            marker_radius: 4.0,
            label_padding: 3.0,
            value_label_gap: 6.0,
            time_label_gap: 4.0,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipConfig {
    pub line_ids: Vec<String>,
    #[serde(default = "default_tooltip_fontsize")]
    pub fontsize: f64,
    #[serde(default)]
    pub layout: TooltipLayout,
}

impl TooltipConfig {
    #[must_use]
    pub fn new(line_ids: Vec<String>) -> Self {
        Self {
            line_ids,
            fontsize: default_tooltip_fontsize(),
            layout: TooltipLayout::default(),
        }
    }

    #[must_use]
    pub fn with_fontsize(mut self, fontsize: f64) -> Self {
        self.fontsize = fontsize;
        self
    }

    pub fn validate(&self) -> PlotResult<()> {
        validate_fontsize(TOOLTIP_PLUGIN, self.fontsize)?;
        if !self.layout.marker_radius.is_finite() || self.layout.marker_radius <= 0.0 {
            return Err(PlotError::InvalidConfig(format!(
                "{TOOLTIP_PLUGIN}: marker_radius must be finite and > 0"
            )));
        }
        if !self.layout.line_width.is_finite() || self.layout.line_width <= 0.0 {
            return Err(PlotError::InvalidConfig(format!(
                "{TOOLTIP_PLUGIN}: line_width must be finite and > 0"
            )));
        }
        for (name, value) in [
            ("label_padding", self.layout.label_padding),
            ("value_label_gap", self.layout.value_label_gap),
            ("time_label_gap", self.layout.time_label_gap),
        ] {
            validate_non_negative(TOOLTIP_PLUGIN, name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveImageConfig {
    pub button_labels: Vec<String>,
    #[serde(default = "default_fontsize")]
    pub fontsize: f64,
    #[serde(default)]
    pub layout: ButtonLayout,
    #[serde(default)]
    pub styles: ExportStyles,
}

impl SaveImageConfig {
    #[must_use]
    pub fn new(button_labels: Vec<String>) -> Self {
        Self {
            button_labels,
            fontsize: default_fontsize(),
            layout: ButtonLayout::default(),
            styles: ExportStyles::default(),
        }
    }

    #[must_use]
    pub fn with_styles(mut self, styles: ExportStyles) -> Self {
        self.styles = styles;
        self
    }

    pub fn formats(&self) -> PlotResult<Vec<ExportFormat>> {
        self.button_labels
            .iter()
            .map(|label| ExportFormat::from_label(label))
            .collect()
    }

    pub fn validate(&self) -> PlotResult<()> {
        self.formats()?;
        validate_fontsize(SAVE_IMAGE_PLUGIN, self.fontsize)?;
        self.layout.validate(SAVE_IMAGE_PLUGIN)
    }
}
