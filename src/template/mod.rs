//! # Template Model
//!
//! Label templates are an ordered list of positioned elements on a
//! millimeter canvas, plus the canvas settings. Array order is z-order:
//! later elements draw on top.
//!
//! ```ignore
//! use etiqueta::template::*;
//!
//! let template = Template::from_json(r#"{
//!     "name": "Shelf label",
//!     "settings": {"width": 58, "height": 40},
//!     "elements": [
//!         {"type": "text", "x": 2, "y": 2, "width": 54, "height": 8, "content": "{{name}}"},
//!         {"type": "barcode", "x": 2, "y": 20, "width": 54, "height": 15, "dataField": "barcode"}
//!     ]
//! }"#)?;
//! ```
//!
//! Stored template records keep elements and settings as JSON text. Loading
//! is lenient: unparsable or non-array element data becomes an empty list,
//! unparsable settings become defaults, and individual malformed elements
//! are skipped. The layout engine never sees a parse error.

pub mod resolve;
pub mod types;

pub use resolve::{ProductData, product_data_from_json, resolve_content, substitute_placeholders};
pub use types::*;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EtiquetaError;
use crate::geom::{Point, Rect};

/// Where freshly added elements are placed, in mm.
pub const DEFAULT_ELEMENT_ORIGIN: Point = Point { x: 5.0, y: 5.0 };

/// Define the ElementKind enum and all dispatch methods from a single list.
///
/// Adding a new element type: add one line here, then define the payload in
/// `types.rs` with `impl ElementMeta`.
macro_rules! define_elements {
    ($($variant:ident($tag:literal, $inner:ty)),+ $(,)?) => {
        /// The closed set of element types.
        ///
        /// The `#[serde(tag = "type")]` attribute enables JSON like
        /// `{"type": "text", "content": "Hello"}`; the payload fields sit
        /// next to the shared geometry fields of [`TemplateElement`].
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", rename_all = "lowercase")]
        pub enum ElementKind {
            $($variant($inner),)+
        }

        impl ElementKind {
            /// The serde type tag (e.g. `"qrcode"`).
            pub fn type_name(&self) -> &'static str {
                match self { $(ElementKind::$variant(_) => $tag,)+ }
            }

            /// Human-readable display label (from [`ElementMeta::label`]).
            pub fn label(&self) -> &'static str {
                match self { $(ElementKind::$variant(_) => <$inner>::label(),)+ }
            }

            /// Default canvas size for this type (from [`ElementMeta::default_size`]).
            pub fn default_size(&self) -> crate::geom::Size {
                match self { $(ElementKind::$variant(_) => <$inner>::default_size(),)+ }
            }

            /// Editor defaults for every element type.
            pub fn all_editor_defaults() -> Vec<Self> {
                vec![$(ElementKind::$variant(<$inner>::editor_default()),)+]
            }
        }
    };
}

define_elements! {
    Text("text", TextProps),
    Qrcode("qrcode", QrProps),
    Image("image", ImageProps),
    Rectangle("rectangle", RectangleProps),
    Barcode("barcode", BarcodeProps),
}

/// A positioned object on the label canvas.
///
/// Geometry is in mm relative to the canvas top-left. `data_field`, when
/// set, binds the element's displayed value to a key of the product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateElement {
    #[serde(default = "new_element_id")]
    pub id: ElementId,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_field: Option<String>,
}

impl TemplateElement {
    /// Create an element with a fresh id and the type's default geometry.
    pub fn new(kind: ElementKind) -> Self {
        let size = kind.default_size();
        Self {
            id: new_element_id(),
            kind,
            x: DEFAULT_ELEMENT_ORIGIN.x,
            y: DEFAULT_ELEMENT_ORIGIN.y,
            width: size.width,
            height: size.height,
            data_field: None,
        }
    }

    /// Create an element with editor defaults by type name.
    ///
    /// Returns `None` for unknown type names.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        ElementKind::all_editor_defaults()
            .into_iter()
            .find(|k| k.type_name() == type_name)
            .map(Self::new)
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }

    /// Replace non-positive dimensions with the type's defaults.
    fn normalized(mut self) -> Self {
        let size = self.kind.default_size();
        if !(self.width > 0.0) {
            self.width = size.width;
        }
        if !(self.height > 0.0) {
            self.height = size.height;
        }
        self
    }
}

/// A label template: name, canvas settings and element list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_settings_lenient")]
    pub settings: TemplateSettings,
    #[serde(default, deserialize_with = "deserialize_elements_lenient")]
    pub elements: Vec<TemplateElement>,
}

impl Template {
    /// Parse a template document.
    ///
    /// The top level must be a JSON object; its `settings` and `elements`
    /// are parsed leniently.
    pub fn from_json(json: &str) -> Result<Self, EtiquetaError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(EtiquetaError::Template(format!(
                "expected a template object, got {}",
                value_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn deserialize_settings_lenient<'de, D>(deserializer: D) -> Result<TemplateSettings, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(settings_from_value(value))
}

fn deserialize_elements_lenient<'de, D>(deserializer: D) -> Result<Vec<TemplateElement>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(elements_from_value(value))
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Parse element JSON text as stored on a template record.
pub fn parse_elements(json: &str) -> Vec<TemplateElement> {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) => elements_from_value(value),
        Err(e) => {
            warn!(error = %e, "unparsable element data, using empty element list");
            Vec::new()
        }
    }
}

/// Convert a JSON value to an element list.
///
/// Non-arrays become an empty list; malformed entries are skipped.
pub fn elements_from_value(value: serde_json::Value) -> Vec<TemplateElement> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Vec::new(),
        other => {
            warn!(kind = value_kind(&other), "element data is not an array, using empty element list");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<TemplateElement>(item) {
            Ok(element) => Some(element.normalized()),
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed template element");
                None
            }
        })
        .collect()
}

/// Parse settings JSON text as stored on a template record.
pub fn parse_settings(json: &str) -> TemplateSettings {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) => settings_from_value(value),
        Err(e) => {
            warn!(error = %e, "unparsable template settings, using defaults");
            TemplateSettings::default()
        }
    }
}

fn settings_from_value(value: serde_json::Value) -> TemplateSettings {
    if value.is_null() {
        return TemplateSettings::default();
    }
    let mut settings: TemplateSettings = match serde_json::from_value(value) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "malformed template settings, using defaults");
            return TemplateSettings::default();
        }
    };
    let defaults = TemplateSettings::default();
    if !(settings.width > 0.0) {
        settings.width = defaults.width;
    }
    if !(settings.height > 0.0) {
        settings.height = defaults.height;
    }
    if !(settings.dpi > 0.0) {
        settings.dpi = defaults.dpi;
    }
    settings
}

/// Element type metadata for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTypeMeta {
    #[serde(rename = "type")]
    pub type_name: String,
    pub label: String,
    pub default_width: f64,
    pub default_height: f64,
}

/// Element type metadata, derived from [`ElementKind::all_editor_defaults`].
pub fn element_types() -> Vec<ElementTypeMeta> {
    ElementKind::all_editor_defaults()
        .iter()
        .map(|k| {
            let size = k.default_size();
            ElementTypeMeta {
                type_name: k.type_name().to_string(),
                label: k.label().to_string(),
                default_width: size.width,
                default_height: size.height,
            }
        })
        .collect()
}
