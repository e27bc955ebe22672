/// Measures text as the host actually renders it.
///
/// Layout code calls this only for elements already inserted into the scene,
/// mirroring a browser's `getBBox` on a mounted node.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size_px: f64) -> f64;
}

/// Fixed advance per character, proportional to font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width_ratio: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.6,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str, font_size_px: f64) -> f64 {
        text.chars().count() as f64 * font_size_px * self.char_width_ratio
    }
}
