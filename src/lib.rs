//! # Etiqueta - Product Label Layout and Rendering
//!
//! Etiqueta lays out product labels (shelf tags, price stickers) on a
//! millimeter canvas and renders them for thermal label printers. It
//! provides:
//!
//! - **Template model**: positioned text, QR, barcode, image and rectangle
//!   elements with `{{field}}` bindings to product data
//! - **Editor core**: drag/resize gestures, snapping with alignment guides,
//!   keyboard nudges, bounded undo/redo
//! - **Text fitting**: shrink-to-fit word-wrapped text in a fixed box
//! - **Rendering**: grayscale PNG at print dpi or a vector display list in
//!   PDF points, single or batched in parallel
//!
//! ## Quick Start
//!
//! ```no_run
//! use etiqueta::{
//!     render::{render_png, ImageStore, RenderOptions},
//!     template::{ProductData, Template},
//! };
//!
//! let template = Template::from_json(r#"{
//!     "settings": {"width": 58, "height": 40},
//!     "elements": [
//!         {"type": "text", "x": 2, "y": 2, "width": 54, "height": 8, "content": "{{name}}"},
//!         {"type": "barcode", "x": 2, "y": 20, "width": 54, "height": 15, "dataField": "barcode"}
//!     ]
//! }"#)?;
//!
//! let mut product = ProductData::new();
//! product.insert("name".into(), "Milk 3.2%".into());
//! product.insert("barcode".into(), "4600000000001".into());
//!
//! let png = render_png(&template, &product, &ImageStore::new(), &RenderOptions::default(), None)?;
//! std::fs::write("milk.png", png)?;
//!
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`units`] | mm / px / pt conversion |
//! | [`geom`] | Points, sizes and rectangles in mm |
//! | [`template`] | Elements, settings, content resolution |
//! | [`editor`] | Gestures, snapping, history |
//! | [`fit`] | Text fitting and measurement |
//! | [`render`] | Draw surfaces, code encoders, batch rendering |
//! | [`server`] | HTTP JSON API |
//! | [`error`] | Error types |

pub mod editor;
pub mod error;
pub mod fit;
pub mod geom;
pub mod render;
pub mod server;
pub mod template;
pub mod units;

// Re-exports for convenience
pub use error::EtiquetaError;
pub use template::{Template, TemplateElement, TemplateSettings};
