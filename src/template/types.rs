//! Element and settings types for the template model.
//!
//! All types derive `Serialize + Deserialize` with camelCase field names, so
//! the JSON stored on a template record maps onto them directly.
//!
//! Each element payload implements [`ElementMeta`] to declare its display
//! label, editor default, and default size on the canvas.

use serde::{Deserialize, Serialize};

use crate::geom::{Rect, Size};

/// Opaque element identifier, stable for the element's lifetime.
pub type ElementId = String;

/// Generate a fresh element id.
pub fn new_element_id() -> ElementId {
    uuid::Uuid::new_v4().to_string()
}

/// Metadata that every element payload must provide.
///
/// Adding a new element type: implement this trait next to the payload
/// struct and add one line to `define_elements!`.
pub trait ElementMeta: Sized {
    /// Human-readable display label (e.g. "QR Code").
    fn label() -> &'static str;

    /// Starter payload for a freshly added element.
    ///
    /// Distinct from `Default`: editor defaults carry example content so a
    /// new element is visible on the canvas immediately.
    fn editor_default() -> Self;

    /// Default width/height in mm for a freshly added element.
    fn default_size() -> Size;
}

fn default_font_size() -> f64 {
    12.0
}

fn default_font_family() -> String {
    "Arial".into()
}

fn default_stroke_width() -> f64 {
    0.3
}

// ============================================================================
// TEXT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    #[serde(alias = "700", alias = "bolder")]
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Text element payload.
///
/// `content` may contain `{{field}}` placeholders resolved against product
/// data at render time. `font_size` is in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: default_font_size(),
            font_weight: FontWeight::Normal,
            font_family: default_font_family(),
            text_align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
        }
    }
}

impl ElementMeta for TextProps {
    fn label() -> &'static str { "Text" }
    fn editor_default() -> Self {
        Self { content: "Text".into(), ..Default::default() }
    }
    fn default_size() -> Size { Size::new(40.0, 8.0) }
}

// ============================================================================
// CODES
// ============================================================================

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QrErrorLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

/// QR code element payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrProps {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub error_level: QrErrorLevel,
}

impl ElementMeta for QrProps {
    fn label() -> &'static str { "QR Code" }
    fn editor_default() -> Self {
        Self { content: "{{sku}}".into(), ..Default::default() }
    }
    fn default_size() -> Size { Size::new(20.0, 20.0) }
}

/// 1D barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeFormat {
    #[default]
    Code128,
    Ean13,
    Code39,
}

/// Barcode element payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeProps {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub format: BarcodeFormat,
}

impl ElementMeta for BarcodeProps {
    fn label() -> &'static str { "Barcode" }
    fn editor_default() -> Self {
        Self { content: "{{barcode}}".into(), ..Default::default() }
    }
    fn default_size() -> Size { Size::new(40.0, 15.0) }
}

// ============================================================================
// IMAGE / SHAPES
// ============================================================================

/// Image element payload. `image_url` is set once an image is uploaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ElementMeta for ImageProps {
    fn label() -> &'static str { "Image" }
    fn editor_default() -> Self { Self::default() }
    fn default_size() -> Size { Size::new(20.0, 20.0) }
}

/// Rectangle element payload. Colors are `#rrggbb`; `stroke_width` is in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl Default for RectangleProps {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: Some("#000000".into()),
            stroke_width: default_stroke_width(),
        }
    }
}

impl ElementMeta for RectangleProps {
    fn label() -> &'static str { "Rectangle" }
    fn editor_default() -> Self { Self::default() }
    fn default_size() -> Size { Size::new(20.0, 10.0) }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Lifecycle state of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

/// Physical description of the label canvas.
///
/// Consumed as fixed bounds by the editor and renderer; never mutated by
/// the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSettings {
    /// Label width in mm
    pub width: f64,
    /// Label height in mm
    pub height: f64,
    /// Print resolution in dots per inch
    pub dpi: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub status: TemplateStatus,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            width: 58.0,
            height: 40.0,
            dpi: 203.0,
            margin_top: 2.0,
            margin_right: 2.0,
            margin_bottom: 2.0,
            margin_left: 2.0,
            status: TemplateStatus::Draft,
        }
    }
}

impl TemplateSettings {
    /// Canvas size in mm.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Area inside the four margins, in mm.
    pub fn printable_area(&self) -> Rect {
        Rect::new(
            self.margin_left,
            self.margin_top,
            (self.width - self.margin_left - self.margin_right).max(0.0),
            (self.height - self.margin_top - self.margin_bottom).max(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_props_defaults_from_empty_json() {
        let props: TextProps = serde_json::from_str("{}").unwrap();
        assert_eq!(props.font_size, 12.0);
        assert_eq!(props.font_family, "Arial");
        assert_eq!(props.text_align, TextAlign::Left);
        assert_eq!(props.vertical_align, VerticalAlign::Top);
    }

    #[test]
    fn test_font_weight_numeric_alias() {
        let w: FontWeight = serde_json::from_str(r#""700""#).unwrap();
        assert_eq!(w, FontWeight::Bold);
    }

    #[test]
    fn test_settings_partial_json() {
        let s: TemplateSettings = serde_json::from_str(r#"{"width": 100, "status": "active"}"#).unwrap();
        assert_eq!(s.width, 100.0);
        assert_eq!(s.height, 40.0);
        assert_eq!(s.status, TemplateStatus::Active);
    }

    #[test]
    fn test_printable_area() {
        let s = TemplateSettings::default();
        assert_eq!(s.printable_area(), Rect::new(2.0, 2.0, 54.0, 36.0));
    }

    #[test]
    fn test_qr_error_level_uppercase() {
        let q: QrProps = serde_json::from_str(r#"{"content": "x", "errorLevel": "H"}"#).unwrap();
        assert_eq!(q.error_level, QrErrorLevel::H);
    }
}
