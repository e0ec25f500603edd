//! # Template Rendering
//!
//! Walks a template's elements in array order (z-order) and issues draw
//! calls on a [`DrawSurface`]:
//!
//! | Element | Draw calls |
//! |---------|------------|
//! | rectangle | `draw_rect` |
//! | text | resolve content → [`fit`](crate::fit::fit) → `draw_text` per line |
//! | qrcode | resolve value → QR bitmap → `draw_image` (square, centered) |
//! | barcode | resolve value → bar bitmap → `draw_image` (full box) |
//! | image | `draw_image` with the loaded bitmap, or a placeholder outline |
//!
//! Template geometry is in mm and font sizes in CSS pixels; each surface
//! declares its device units via [`DrawSurface::units_per_mm`].
//!
//! ## Surfaces
//!
//! - [`raster::RasterSurface`]: grayscale bitmap at the template dpi, PNG out
//! - [`commands::CommandSurface`]: display list in PDF points

pub mod commands;
pub mod dither;
pub mod encode;
pub mod images;
pub mod raster;

pub use commands::{CommandSurface, DrawCommand};
pub use dither::DitherMode;
pub use encode::FALLBACK_CODE_VALUE;
pub use images::ImageStore;
pub use raster::{RasterSurface, encode_png};

use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EtiquetaError;
use crate::fit::{FitOptions, FontSpec, TextMeasure, TtfMeasure, fit};
use crate::geom::Rect;
use crate::template::resolve::with_builtins;
use crate::template::{ElementKind, ProductData, RectangleProps, Template, TemplateElement, TemplateSettings, resolve_content};
use crate::units::{CSS_DPI, MM_PER_INCH};

/// An RGB color parsed from template JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };
    /// Used for margin guides and image placeholders.
    pub const GUIDE: Color = Color {
        r: 160,
        g: 160,
        b: 160,
    };

    /// Parse `#rgb`, `#rrggbb`, `black` or `white`. `none`, `transparent`
    /// and unparsable values give `None`.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "black" => return Some(Color::BLACK),
            "white" => return Some(Color::WHITE),
            _ => {}
        }
        let hex = value.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Color {
                r: channel(hex.get(0..2)?)?,
                g: channel(hex.get(2..4)?)?,
                b: channel(hex.get(4..6)?)?,
            }),
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Color {
                    r: it.next()??,
                    g: it.next()??,
                    b: it.next()??,
                })
            }
            _ => None,
        }
    }

    /// Perceived brightness (ITU-R BT.601).
    pub fn luma(&self) -> u8 {
        (0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64).round() as u8
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Fill and outline of a rectangle, stroke width in device units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

impl ShapeStyle {
    /// Outline only.
    pub fn outline(color: Color, stroke_width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width,
        }
    }

    fn from_props(props: &RectangleProps, units_per_mm: f64) -> Self {
        Self {
            fill: props.fill.as_deref().and_then(Color::parse),
            stroke: props.stroke.as_deref().and_then(Color::parse),
            stroke_width: props.stroke_width.max(0.0) * units_per_mm,
        }
    }
}

/// A drawing backend. Rects and positions are in device units.
pub trait DrawSurface {
    /// Device units per millimeter.
    fn units_per_mm(&self) -> f64;

    /// Device units per CSS pixel.
    fn px_scale(&self) -> f64 {
        self.units_per_mm() * MM_PER_INCH / CSS_DPI
    }

    /// Measures text in CSS pixels for the fitter.
    fn measurer(&self) -> &dyn TextMeasure;

    fn draw_rect(&mut self, rect: Rect, style: &ShapeStyle);

    /// Draw one line of text with its top-left at (x, y).
    fn draw_text(&mut self, text: &str, x: f64, y: f64, font: &FontSpec);

    /// Draw `image` stretched to `rect`.
    fn draw_image(&mut self, image: &GrayImage, rect: Rect);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Outline the printable area inside the margins
    pub show_margins: bool,
    /// 1-bit conversion applied to raster output
    pub dither: DitherMode,
}

/// Draw `elements` onto `surface`.
///
/// Product data is merged with the built-in date/time variables before
/// content resolution.
pub fn render_template(
    elements: &[TemplateElement],
    settings: &TemplateSettings,
    data: &ProductData,
    images: &ImageStore,
    surface: &mut dyn DrawSurface,
    options: &RenderOptions,
) {
    let vars = with_builtins(data);
    let upm = surface.units_per_mm();

    if options.show_margins {
        let area = settings.printable_area().scaled(upm);
        surface.draw_rect(area, &ShapeStyle::outline(Color::GUIDE, 1.0));
    }

    for el in elements {
        let rect = el.rect().scaled(upm);
        match &el.kind {
            ElementKind::Rectangle(props) => {
                surface.draw_rect(rect, &ShapeStyle::from_props(props, upm));
            }
            ElementKind::Text(props) => {
                let content = resolve_content(el, &vars);
                draw_text_block(surface, &content, el, rect, &FitOptions::for_text(props));
            }
            ElementKind::Qrcode(props) => {
                let value = resolve_content(el, &vars);
                let bitmap = encode::encode_qr_or_fallback(&value, props.error_level);
                surface.draw_image(&bitmap, centered_square(rect));
            }
            ElementKind::Barcode(props) => {
                let value = resolve_content(el, &vars);
                let bitmap = encode::encode_barcode_or_fallback(&value, props.format);
                surface.draw_image(&bitmap, rect);
            }
            ElementKind::Image(_) => {
                let url = resolve_content(el, &vars);
                match images.get(url.trim()) {
                    Some(bitmap) => surface.draw_image(bitmap, rect),
                    None => draw_placeholder(surface, rect, upm),
                }
            }
        }
    }
}

fn draw_text_block(surface: &mut dyn DrawSurface, content: &str, el: &TemplateElement, rect: Rect, options: &FitOptions) {
    let fitted = fit(content, el.width, el.height, options, surface.measurer());
    let scale = surface.px_scale();
    let font = FontSpec::new(fitted.font_size_px * scale, options.font_family.clone(), options.font_weight);
    // Center the glyph cell inside its line box
    let leading = (fitted.line_height_px - fitted.font_size_px) / 2.0;

    for line in &fitted.lines {
        surface.draw_text(
            &line.text,
            rect.x + line.x * scale,
            rect.y + (line.y + leading) * scale,
            &font,
        );
    }
}

fn centered_square(rect: Rect) -> Rect {
    let side = rect.width.min(rect.height);
    Rect::new(
        rect.x + (rect.width - side) / 2.0,
        rect.y + (rect.height - side) / 2.0,
        side,
        side,
    )
}

/// Outline with a diagonal cross, drawn where an image could not be loaded.
fn draw_placeholder(surface: &mut dyn DrawSurface, rect: Rect, upm: f64) {
    let stroke = (0.3 * upm).max(1.0);
    surface.draw_rect(rect, &ShapeStyle::outline(Color::GUIDE, stroke));

    let steps = (rect.width.min(rect.height) / stroke).floor() as usize;
    let style = ShapeStyle {
        fill: Some(Color::GUIDE),
        stroke: None,
        stroke_width: 0.0,
    };
    for i in 0..steps {
        let t = i as f64 / steps as f64;
        let (dx, dy) = (t * (rect.width - stroke), t * (rect.height - stroke));
        surface.draw_rect(Rect::new(rect.x + dx, rect.y + dy, stroke, stroke), &style);
        surface.draw_rect(Rect::new(rect.right() - stroke - dx, rect.y + dy, stroke, stroke), &style);
    }
}

/// Render a template for one product to a grayscale bitmap.
pub fn render_image(
    template: &Template,
    data: &ProductData,
    images: &ImageStore,
    options: &RenderOptions,
    ttf: Option<&TtfMeasure>,
) -> Result<GrayImage, EtiquetaError> {
    let mut surface = RasterSurface::new(&template.settings)?;
    if let Some(ttf) = ttf {
        surface = surface.with_ttf(ttf.clone());
    }
    render_template(&template.elements, &template.settings, data, images, &mut surface, options);
    Ok(dither::apply(surface.image(), options.dither))
}

/// Render a template for one product to PNG bytes.
pub fn render_png(
    template: &Template,
    data: &ProductData,
    images: &ImageStore,
    options: &RenderOptions,
    ttf: Option<&TtfMeasure>,
) -> Result<Vec<u8>, EtiquetaError> {
    encode_png(&render_image(template, data, images, options, ttf)?)
}

/// Render a template for one product to a PDF-point display list.
pub fn render_commands(template: &Template, data: &ProductData, images: &ImageStore, options: &RenderOptions) -> Vec<DrawCommand> {
    let mut surface = CommandSurface::new(&template.settings);
    render_template(&template.elements, &template.settings, data, images, &mut surface, options);
    surface.into_commands()
}

/// Render one PNG per product record, in parallel. Results keep the order
/// of `records`.
pub fn render_batch(
    template: &Template,
    records: &[ProductData],
    images: &ImageStore,
    options: &RenderOptions,
    ttf: Option<&TtfMeasure>,
) -> Vec<Result<Vec<u8>, EtiquetaError>> {
    debug!(labels = records.len(), elements = template.elements.len(), "batch render");
    records
        .par_iter()
        .map(|data| render_png(template, data, images, options, ttf))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{BarcodeProps, ImageProps, QrProps, TextProps};

    fn element(kind: ElementKind, rect: Rect) -> TemplateElement {
        let mut el = TemplateElement::new(kind);
        el.set_rect(rect);
        el
    }

    fn template(elements: Vec<TemplateElement>) -> Template {
        Template {
            name: "test".into(),
            settings: TemplateSettings::default(),
            elements,
        }
    }

    fn record(pairs: &[(&str, &str)]) -> ProductData {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn texts(commands: &[DrawCommand]) -> Vec<String> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#ff0000"), Some(Color { r: 255, g: 0, b: 0 }));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("Black"), Some(Color::BLACK));
        assert_eq!(Color::parse("none"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#gg0000"), None);
        assert_eq!(Color::BLACK.to_hex(), "#000000");
        assert_eq!(Color::WHITE.luma(), 255);
    }

    #[test]
    fn test_text_resolved_from_product_data() {
        let t = template(vec![element(
            ElementKind::Text(TextProps {
                content: "{{name}} {{missing}}".into(),
                ..Default::default()
            }),
            Rect::new(2.0, 2.0, 54.0, 10.0),
        )]);
        let commands = render_commands(&t, &record(&[("name", "Milk")]), &ImageStore::new(), &RenderOptions::default());
        assert_eq!(texts(&commands), vec!["Milk {{missing}}"]);
    }

    #[test]
    fn test_text_position_in_points() {
        let t = template(vec![element(
            ElementKind::Text(TextProps {
                content: "A".into(),
                ..Default::default()
            }),
            Rect::new(10.0, 5.0, 30.0, 10.0),
        )]);
        let commands = render_commands(&t, &ProductData::new(), &ImageStore::new(), &RenderOptions::default());
        let Some(DrawCommand::Text { x, y, font_size, .. }) = commands.iter().find(|c| matches!(c, DrawCommand::Text { .. })) else {
            panic!("no text command");
        };
        // 2px padding → 1.5pt; 12px → 9pt; leading 1.2px → 0.9pt
        assert!((x - (mm_pt(10.0) + 1.5)).abs() < 1e-9);
        assert!((y - (mm_pt(5.0) + 1.5 + 0.9)).abs() < 1e-9);
        assert!((font_size - 9.0).abs() < 1e-9);
    }

    fn mm_pt(mm: f64) -> f64 {
        crate::units::mm_to_pt(mm)
    }

    #[test]
    fn test_elements_drawn_in_array_order() {
        let t = template(vec![
            element(ElementKind::Rectangle(RectangleProps::default()), Rect::new(0.0, 0.0, 10.0, 10.0)),
            element(
                ElementKind::Barcode(BarcodeProps {
                    content: "123".into(),
                    ..Default::default()
                }),
                Rect::new(0.0, 10.0, 40.0, 15.0),
            ),
            element(
                ElementKind::Text(TextProps {
                    content: "x".into(),
                    ..Default::default()
                }),
                Rect::new(0.0, 0.0, 20.0, 8.0),
            ),
        ]);
        let commands = render_commands(&t, &ProductData::new(), &ImageStore::new(), &RenderOptions::default());
        let ops: Vec<_> = commands
            .iter()
            .map(|c| match c {
                DrawCommand::Page { .. } => "page",
                DrawCommand::Rect { .. } => "rect",
                DrawCommand::Text { .. } => "text",
                DrawCommand::Image { .. } => "image",
            })
            .collect();
        assert_eq!(ops, vec!["page", "rect", "image", "text"]);
    }

    #[test]
    fn test_qr_drawn_square_and_centered() {
        let t = template(vec![element(
            ElementKind::Qrcode(QrProps {
                content: "{{sku}}".into(),
                ..Default::default()
            }),
            Rect::new(0.0, 0.0, 30.0, 20.0),
        )]);
        let commands = render_commands(&t, &record(&[("sku", "A-1")]), &ImageStore::new(), &RenderOptions::default());
        let Some(DrawCommand::Image { x, width, height, pixel_width, pixel_height, .. }) = commands.last() else {
            panic!("no image command");
        };
        assert!((width - height).abs() < 1e-9);
        assert!((x - mm_pt(5.0)).abs() < 1e-9);
        assert_eq!(pixel_width, pixel_height);
    }

    #[test]
    fn test_empty_barcode_value_renders_fallback() {
        let mut el = element(ElementKind::Barcode(BarcodeProps::default()), Rect::new(0.0, 0.0, 40.0, 15.0));
        el.data_field = Some("barcode".into());
        let t = template(vec![el]);
        let commands = render_commands(&t, &ProductData::new(), &ImageStore::new(), &RenderOptions::default());
        let Some(DrawCommand::Image { data, pixel_width, .. }) = commands.last() else {
            panic!("no image command");
        };
        let expected = encode::encode_barcode(FALLBACK_CODE_VALUE, Default::default()).unwrap();
        assert_eq!(*pixel_width, expected.width());
        assert_eq!(data, expected.as_raw());
    }

    #[test]
    fn test_missing_image_draws_placeholder() {
        let t = template(vec![element(
            ElementKind::Image(ImageProps {
                image_url: Some("missing.png".into()),
            }),
            Rect::new(5.0, 5.0, 20.0, 20.0),
        )]);
        let commands = render_commands(&t, &ProductData::new(), &ImageStore::new(), &RenderOptions::default());
        assert!(commands.iter().all(|c| !matches!(c, DrawCommand::Image { .. })));
        assert!(matches!(&commands[1], DrawCommand::Rect { stroke: Some(_), .. }));
    }

    #[test]
    fn test_loaded_image_is_drawn() {
        let mut images = ImageStore::new();
        images.insert("logo.png", GrayImage::from_pixel(4, 4, image::Luma([0])));
        let t = template(vec![element(
            ElementKind::Image(ImageProps {
                image_url: Some("logo.png".into()),
            }),
            Rect::new(5.0, 5.0, 20.0, 20.0),
        )]);
        let commands = render_commands(&t, &ProductData::new(), &images, &RenderOptions::default());
        assert!(matches!(&commands[1], DrawCommand::Image { pixel_width: 4, .. }));
    }

    #[test]
    fn test_show_margins_outlines_printable_area() {
        let options = RenderOptions {
            show_margins: true,
            ..Default::default()
        };
        let commands = render_commands(&template(vec![]), &ProductData::new(), &ImageStore::new(), &options);
        let DrawCommand::Rect { x, width, .. } = &commands[1] else {
            panic!("expected margin rect");
        };
        assert!((x - mm_pt(2.0)).abs() < 1e-9);
        assert!((width - mm_pt(54.0)).abs() < 1e-9);
    }

    #[test]
    fn test_raster_render_has_ink() {
        let t = template(vec![element(
            ElementKind::Qrcode(QrProps {
                content: "hello".into(),
                ..Default::default()
            }),
            Rect::new(2.0, 2.0, 20.0, 20.0),
        )]);
        let img = render_image(&t, &ProductData::new(), &ImageStore::new(), &RenderOptions::default(), None)
            .unwrap();
        assert_eq!(img.dimensions(), (464, 320));
        assert!(img.pixels().any(|p| p.0[0] == 0));
    }

    #[test]
    fn test_batch_keeps_record_order() {
        let t = template(vec![element(
            ElementKind::Text(TextProps {
                content: "{{name}}".into(),
                ..Default::default()
            }),
            Rect::new(2.0, 2.0, 54.0, 10.0),
        )]);
        let records = vec![record(&[("name", "a")]), record(&[("name", "bbbbbbbb")]), record(&[("name", "a")])];
        let pngs = render_batch(&t, &records, &ImageStore::new(), &RenderOptions::default(), None);
        assert_eq!(pngs.len(), 3);
        let pngs: Vec<Vec<u8>> = pngs.into_iter().map(Result::unwrap).collect();
        assert_eq!(pngs[0], pngs[2]);
        assert_ne!(pngs[0], pngs[1]);
    }
}
