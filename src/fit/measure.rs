//! Text measurement backends for the fitter.
//!
//! The fitter only needs "how wide is this string at this font". Two
//! backends ship with the crate:
//!
//! - [`MonospaceMeasure`]: Spleen bitmap metrics (every glyph is half as
//!   wide as the font size). Matches what [`crate::render::raster`] draws
//!   when no TTF font is configured.
//! - [`TtfMeasure`]: advance widths from a TrueType font via ab_glyph.
//!
//! Any `Fn(&str, &FontSpec) -> f64` closure is also a [`TextMeasure`].

use std::path::Path;

use ab_glyph::{Font, FontArc, ScaleFont};

use crate::error::EtiquetaError;
use crate::template::FontWeight;

/// Spleen 12x24 cell width in pixels.
pub const SPLEEN_CELL_WIDTH: usize = 12;

/// Spleen 12x24 cell height in pixels.
pub const SPLEEN_CELL_HEIGHT: usize = 24;

/// Font selection for one measurement or draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Font size in the caller's pixel space
    pub size_px: f64,
    pub family: String,
    pub weight: FontWeight,
}

impl FontSpec {
    pub fn new(size_px: f64, family: impl Into<String>, weight: FontWeight) -> Self {
        Self {
            size_px,
            family: family.into(),
            weight,
        }
    }

    /// Same face at another size.
    pub fn with_size(&self, size_px: f64) -> Self {
        Self {
            size_px,
            ..self.clone()
        }
    }
}

/// Measures the advance width of a single line of text, in pixels.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, &FontSpec) -> f64,
{
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        self(text, font)
    }
}

/// Fixed-pitch metrics of the Spleen bitmap font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    /// Glyph advance as a fraction of the font size
    pub width_ratio: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            width_ratio: SPLEEN_CELL_WIDTH as f64 / SPLEEN_CELL_HEIGHT as f64,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px * self.width_ratio
    }
}

/// TrueType metrics, with an optional separate bold face.
///
/// Cloning is cheap: faces are reference counted.
#[derive(Clone)]
pub struct TtfMeasure {
    regular: FontArc,
    bold: Option<FontArc>,
}

impl std::fmt::Debug for TtfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfMeasure")
            .field("glyphs", &self.regular.glyph_count())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl TtfMeasure {
    pub fn new(regular: FontArc) -> Self {
        Self { regular, bold: None }
    }

    /// Load the regular face from a `.ttf`/`.otf` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EtiquetaError> {
        Ok(Self::new(load_font(path.as_ref())?))
    }

    /// Use a separate face for bold text.
    pub fn with_bold_file(mut self, path: impl AsRef<Path>) -> Result<Self, EtiquetaError> {
        self.bold = Some(load_font(path.as_ref())?);
        Ok(self)
    }

    /// The face used for `weight`. Falls back to regular without a bold face.
    pub fn face(&self, weight: FontWeight) -> &FontArc {
        match (weight, &self.bold) {
            (FontWeight::Bold, Some(bold)) => bold,
            _ => &self.regular,
        }
    }
}

impl TextMeasure for TtfMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f64 {
        let face = self.face(font.weight);
        let scaled = face.as_scaled(font.size_px as f32);
        let width: f32 = text.chars().map(|ch| scaled.h_advance(face.glyph_id(ch))).sum();
        f64::from(width)
    }
}

fn load_font(path: &Path) -> Result<FontArc, EtiquetaError> {
    let bytes = std::fs::read(path)
        .map_err(|e| EtiquetaError::Font(format!("{}: {}", path.display(), e)))?;
    FontArc::try_from_vec(bytes).map_err(|e| EtiquetaError::Font(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_counts_chars_not_bytes() {
        let m = MonospaceMeasure::default();
        let font = FontSpec::new(12.0, "Arial", FontWeight::Normal);
        // Cyrillic is 2 bytes per char in UTF-8
        assert_eq!(m.text_width("товар", &font), 30.0);
        assert_eq!(m.text_width("", &font), 0.0);
    }

    #[test]
    fn test_closure_is_a_measure() {
        let measure = |text: &str, font: &FontSpec| text.len() as f64 * font.size_px;
        let font = FontSpec::new(10.0, "mono", FontWeight::Bold);
        assert_eq!(measure.text_width("abc", &font), 30.0);
    }

    #[test]
    fn test_font_spec_with_size() {
        let font = FontSpec::new(12.0, "Arial", FontWeight::Bold);
        let smaller = font.with_size(9.0);
        assert_eq!(smaller.size_px, 9.0);
        assert_eq!(smaller.weight, FontWeight::Bold);
        assert_eq!(smaller.family, "Arial");
    }

    #[test]
    fn test_ttf_missing_file_is_font_error() {
        let err = TtfMeasure::from_file("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, EtiquetaError::Font(_)));
    }
}
