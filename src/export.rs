//! Static image export of a rendered chart.
//!
//! The pipeline clones the host SVG tree, appends the overlay, bakes
//! stylesheet rules into attributes, hides interactive chrome, repairs
//! namespace quirks and serializes the result as a data URI. PNG output goes
//! through a `Rasterizer` and is flattened onto white.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, RgbImage};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlotError, PlotResult};
use crate::notify::{Notifier, ToastKind, toast};
use crate::render::OverlayScene;
use crate::state::SessionStore;
use crate::svg::{SVG_NAMESPACE, SvgNode, XLINK_NAMESPACE};

/// Magnification applied before rasterizing; 3x keeps axis text legible when
/// the PNG is embedded at notebook width.
pub const PNG_EXPORT_SCALE: f64 = 3.0;

pub const IMAGE_KEY_PREFIX: &str = "autoplot-image-";

/// Class prefixes of elements that must never appear in an export.
pub const CHROME_CLASS_PREFIXES: [&str; 6] = [
    "autoplot-tooltip",
    "autoplot-range-button",
    "autoplot-save-button",
    "mpld3-toolbar",
    "mpld3-resetbutton",
    "mpld3-zoombutton",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
}

impl ExportFormat {
    /// Parses a save-button label; case-insensitive.
    pub fn from_label(label: &str) -> PlotResult<Self> {
        match label.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(PlotError::InvalidConfig(format!(
                "unrecognised save button label `{label}`; expected svg or png"
            ))),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Svg => "SVG",
            Self::Png => "PNG",
        }
    }
}

/// One stylesheet rule, applied to elements named `element` (any element
/// when `None`) that carry `class` themselves or sit below an element that
/// does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub class: String,
    #[serde(default)]
    pub element: Option<String>,
    pub attributes: IndexMap<String, String>,
}

impl StyleRule {
    #[must_use]
    pub fn new(class: impl Into<String>, element: Option<&str>) -> Self {
        Self {
            class: class.into(),
            element: element.map(str::to_owned),
            attributes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_owned(), value.to_owned());
        self
    }

    fn matches(&self, node: &SvgNode, ancestors: &[String]) -> bool {
        if self.element.as_deref().is_some_and(|element| element != node.name) {
            return false;
        }
        node.has_class(&self.class) || ancestors.iter().any(|class| *class == self.class)
    }
}

/// Stylesheet rules re-applied as attributes, since serialization drops
/// external stylesheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStyles {
    pub rules: Vec<StyleRule>,
}

impl Default for ExportStyles {
    fn default() -> Self {
        let mut rules = Vec::new();
        for axis in ["mpld3-xaxis", "mpld3-yaxis"] {
            for element in ["line", "path"] {
                rules.push(
                    StyleRule::new(axis, Some(element))
                        .with("shape-rendering", "crispEdges")
                        .with("stroke", "#000000")
                        .with("fill", "none"),
                );
            }
            rules.push(
                StyleRule::new(axis, Some("text"))
                    .with("font-family", "sans-serif")
                    .with("font-size", "11px")
                    .with("fill", "#000000")
                    .with("stroke", "none"),
            );
        }
        for grid in ["mpld3-xgrid", "mpld3-ygrid"] {
            rules.push(
                StyleRule::new(grid, None)
                    .with("stroke", "#d3d3d3")
                    .with("stroke-dasharray", "2,2")
                    .with("stroke-opacity", "0.7")
                    .with("fill", "none"),
            );
        }
        Self { rules }
    }
}

impl ExportStyles {
    /// Writes every matching rule onto the tree, replacing existing values.
    pub fn apply(&self, root: &mut SvgNode) {
        root.visit_mut(&mut |node, ancestors| {
            let matching: Vec<&StyleRule> = self
                .rules
                .iter()
                .filter(|rule| rule.matches(node, ancestors))
                .collect();
            for rule in matching {
                for (name, value) in &rule.attributes {
                    node.set_attr(name.clone(), value.clone());
                }
            }
        });
    }
}

/// Forces plugin chrome invisible so only data and axes are exported.
pub fn hide_interactive_chrome(root: &mut SvgNode) {
    root.visit_mut(&mut |node, _| {
        let is_chrome = node.classes().any(|class| {
            CHROME_CLASS_PREFIXES
                .iter()
                .any(|prefix| class.starts_with(prefix))
        });
        if is_chrome {
            node.set_attr("visibility", "hidden");
            node.set_attr("display", "none");
        }
    });
}

fn is_generated_prefix(prefix: &str) -> bool {
    prefix
        .strip_prefix("NS")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Declares the SVG and xlink namespaces on the root and rewrites
/// browser-generated `NS<n>:href` attributes to `xlink:href`.
pub fn normalize_namespaces(root: &mut SvgNode) {
    root.visit_mut(&mut |node, _| {
        let generated_xmlns =
            |name: &str| name.strip_prefix("xmlns:").is_some_and(is_generated_prefix);
        let generated_href =
            |name: &str| name.strip_suffix(":href").is_some_and(is_generated_prefix);
        if !node
            .attributes
            .keys()
            .any(|name| generated_xmlns(name.as_str()) || generated_href(name.as_str()))
        {
            return;
        }
        let mut rewritten = IndexMap::with_capacity(node.attributes.len());
        for (name, value) in std::mem::take(&mut node.attributes) {
            if generated_xmlns(name.as_str()) {
                continue;
            }
            if generated_href(name.as_str()) {
                rewritten.insert("xlink:href".to_owned(), value);
            } else {
                rewritten.insert(name, value);
            }
        }
        node.attributes = rewritten;
    });

    root.set_attr("xmlns", SVG_NAMESPACE);
    root.set_attr("xmlns:xlink", XLINK_NAMESPACE);
}

/// Builds the export-ready markup from the host tree plus the plugin overlay.
#[must_use]
pub fn export_svg_markup(root: &SvgNode, overlay: &OverlayScene, styles: &ExportStyles) -> String {
    let mut svg = root.clone();
    svg.children.push(overlay.to_svg_group());
    styles.apply(&mut svg);
    hide_interactive_chrome(&mut svg);
    normalize_namespaces(&mut svg);
    svg.to_markup()
}

#[must_use]
pub fn svg_data_uri(markup: &str) -> String {
    format!("data:image/svg+xml;base64,{}", BASE64.encode(markup.as_bytes()))
}

/// Straight (non-premultiplied) RGBA8 bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> PlotResult<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(PlotError::Export(format!(
                "raster buffer of {} bytes does not match {width}x{height} RGBA",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Flattens onto an opaque white background.
    #[must_use]
    pub fn composite_over_white(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.rgba.len() / 4 * 3);
        for pixel in self.rgba.chunks_exact(4) {
            let alpha = u32::from(pixel[3]);
            for &channel in &pixel[..3] {
                let blended = (u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255;
                rgb.push(blended as u8);
            }
        }
        rgb
    }

    /// PNG data URI of the white-composited image.
    pub fn to_png_data_uri(&self) -> PlotResult<String> {
        let rgb = RgbImage::from_raw(self.width, self.height, self.composite_over_white())
            .ok_or_else(|| PlotError::Export("raster buffer size mismatch".to_owned()))?;
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| PlotError::Export(format!("png encoding failed: {err}")))?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(&bytes)))
    }
}

pub type RasterCallback = Box<dyn FnOnce(PlotResult<RasterImage>)>;

/// Decodes SVG markup into a bitmap. Completion is reported once through
/// `on_loaded`, possibly after `decode` has returned.
pub trait Rasterizer {
    fn decode(&self, svg_markup: &str, scale: f64, on_loaded: RasterCallback);
}

/// Removes and returns the image stored for an embed request.
///
/// A missing entry means the save click never completed; the user is told to
/// export again.
pub fn take_exported_image(
    store: &mut dyn SessionStore,
    key: &str,
    notifier: &dyn Notifier,
) -> PlotResult<String> {
    match store.remove(key) {
        Some(data_uri) => {
            debug!(key, "exported image taken from session store");
            Ok(data_uri)
        }
        None => {
            warn!(key, "no exported image in session store");
            toast(
                notifier,
                ToastKind::Error,
                "No exported image found. Re-click save before embedding.",
            );
            Err(PlotError::MissingSessionData {
                key: key.to_owned(),
            })
        }
    }
}

#[cfg(feature = "resvg-backend")]
pub use resvg_backend::ResvgRasterizer;

#[cfg(feature = "resvg-backend")]
mod resvg_backend {
    use resvg::{tiny_skia, usvg};

    use super::{RasterCallback, RasterImage, Rasterizer};
    use crate::error::{PlotError, PlotResult};

    /// In-process rasterizer; completes before `decode` returns.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ResvgRasterizer {
        /// Resolve `<text>` against installed fonts; without them text is dropped.
        pub load_system_fonts: bool,
    }

    impl ResvgRasterizer {
        #[must_use]
        pub fn with_system_fonts() -> Self {
            Self {
                load_system_fonts: true,
            }
        }

        fn rasterize(&self, svg_markup: &str, scale: f64) -> PlotResult<RasterImage> {
            let mut options = usvg::Options::default();
            if self.load_system_fonts {
                options.fontdb_mut().load_system_fonts();
            }
            let tree = usvg::Tree::from_str(svg_markup, &options)
                .map_err(|err| PlotError::Export(format!("svg parse failed: {err}")))?;
            let scale = scale as f32;
            let size = tree
                .size()
                .to_int_size()
                .scale_by(scale)
                .ok_or_else(|| PlotError::Export("scaled image size is empty".to_owned()))?;
            let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
                .ok_or_else(|| PlotError::Export("cannot allocate pixmap".to_owned()))?;
            resvg::render(
                &tree,
                tiny_skia::Transform::from_scale(scale, scale),
                &mut pixmap.as_mut(),
            );

            let mut rgba = Vec::with_capacity(pixmap.data().len());
            for pixel in pixmap.pixels() {
                let color = pixel.demultiply();
                rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
            }
            RasterImage::new(size.width(), size.height(), rgba)
        }
    }

    impl Rasterizer for ResvgRasterizer {
        fn decode(&self, svg_markup: &str, scale: f64, on_loaded: RasterCallback) {
            on_loaded(self.rasterize(svg_markup, scale));
        }
    }
}
