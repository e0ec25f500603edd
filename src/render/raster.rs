//! Grayscale raster surface at the template's print resolution.
//!
//! Text is drawn with the Spleen 12x24 bitmap font, scaled nearest-neighbor
//! to the requested size, or with an anti-aliased TrueType face when one is
//! configured. Images and code bitmaps are scaled nearest-neighbor into
//! their box, which keeps QR modules and barcode bars crisp.

use ab_glyph::{Font, ScaleFont};
use image::{GrayImage, ImageEncoder, Luma};
use spleen_font::{FONT_12X24, PSF2Font};
use tracing::warn;

use super::{DrawSurface, ShapeStyle};
use crate::error::EtiquetaError;
use crate::fit::measure::{SPLEEN_CELL_HEIGHT, SPLEEN_CELL_WIDTH};
use crate::fit::{FontSpec, MonospaceMeasure, TextMeasure, TtfMeasure};
use crate::geom::Rect;
use crate::template::TemplateSettings;
use crate::units::mm_to_px;

/// Largest bitmap a label may rasterize to (an A4 page at 600 dpi is
/// about 35 Mpx).
pub const MAX_RASTER_PIXELS: u64 = 64 * 1024 * 1024;

const PAPER: u8 = 255;
const INK: u8 = 0;

/// One Spleen glyph as a row-major on/off bitmap.
type GlyphBitmap = [bool; SPLEEN_CELL_WIDTH * SPLEEN_CELL_HEIGHT];

pub struct RasterSurface {
    image: GrayImage,
    units_per_mm: f64,
    mono: MonospaceMeasure,
    ttf: Option<TtfMeasure>,
}

impl RasterSurface {
    /// A blank (white) label at the settings' size and dpi.
    ///
    /// Fails when the bitmap would exceed [`MAX_RASTER_PIXELS`].
    pub fn new(settings: &TemplateSettings) -> Result<Self, EtiquetaError> {
        let width = mm_to_px(settings.width, settings.dpi).round().max(1.0);
        let height = mm_to_px(settings.height, settings.dpi).round().max(1.0);
        let pixels = width * height;
        if !pixels.is_finite() || pixels > MAX_RASTER_PIXELS as f64 {
            return Err(EtiquetaError::Template(format!(
                "label of {}x{} mm at {} dpi is too large to rasterize ({}x{} px, limit {} px)",
                settings.width, settings.height, settings.dpi, width, height, MAX_RASTER_PIXELS
            )));
        }
        Ok(Self {
            image: GrayImage::from_pixel(width as u32, height as u32, Luma([PAPER])),
            units_per_mm: mm_to_px(1.0, settings.dpi),
            mono: MonospaceMeasure::default(),
            ttf: None,
        })
    }

    /// Draw and measure text with a TrueType face instead of Spleen.
    pub fn with_ttf(mut self, ttf: TtfMeasure) -> Self {
        self.ttf = Some(ttf);
        self
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    pub fn to_png(&self) -> Result<Vec<u8>, EtiquetaError> {
        encode_png(&self.image)
    }

    fn darken(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        pixel.0[0] = pixel.0[0].min(value);
    }

    fn fill(&mut self, rect: PixelRect, value: u8) {
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                let pixel = self.image.get_pixel_mut(x, y);
                pixel.0[0] = value;
            }
        }
    }

    fn draw_spleen(&mut self, text: &str, x: f64, y: f64, font: &FontSpec) {
        let mut spleen = match PSF2Font::new(FONT_12X24) {
            Ok(f) => f,
            Err(_) => {
                warn!("spleen font unavailable, text skipped");
                return;
            }
        };

        let cell_w = (font.size_px * self.mono.width_ratio).max(1.0);
        let cell_h = font.size_px.max(1.0);
        let bold = font.weight == crate::template::FontWeight::Bold;

        for (i, ch) in text.chars().enumerate() {
            let mut glyph: GlyphBitmap = [false; SPLEEN_CELL_WIDTH * SPLEEN_CELL_HEIGHT];
            let utf8 = ch.to_string();
            match spleen.glyph_for_utf8(utf8.as_bytes()) {
                Some(rows) => {
                    for (row_y, row) in rows.enumerate() {
                        for (col_x, on) in row.enumerate() {
                            if row_y < SPLEEN_CELL_HEIGHT && col_x < SPLEEN_CELL_WIDTH {
                                glyph[row_y * SPLEEN_CELL_WIDTH + col_x] = on;
                            }
                        }
                    }
                }
                None if ch.is_whitespace() => continue,
                None => box_glyph(&mut glyph),
            }

            let x0 = x + i as f64 * cell_w;
            let (w, h) = (cell_w.ceil() as i64, cell_h.ceil() as i64);
            for dy in 0..h {
                for dx in 0..w {
                    let sx = (dx as f64 * SPLEEN_CELL_WIDTH as f64 / cell_w) as usize;
                    let sy = (dy as f64 * SPLEEN_CELL_HEIGHT as f64 / cell_h) as usize;
                    if sx < SPLEEN_CELL_WIDTH && sy < SPLEEN_CELL_HEIGHT && glyph[sy * SPLEEN_CELL_WIDTH + sx] {
                        let px = x0.round() as i64 + dx;
                        let py = y.round() as i64 + dy;
                        self.darken(px, py, INK);
                        if bold {
                            self.darken(px + 1, py, INK);
                        }
                    }
                }
            }
        }
    }

    fn draw_ttf(&mut self, ttf: &TtfMeasure, text: &str, x: f64, y: f64, font: &FontSpec) {
        let face = ttf.face(font.weight);
        let pixel_height = font.size_px as f32;
        let scaled = face.as_scaled(pixel_height);
        let baseline = y as f32 + scaled.ascent();

        let mut caret = x as f32;
        let mut coverage_px = Vec::new();
        for ch in text.chars() {
            let glyph_id = face.glyph_id(ch);
            let glyph = glyph_id.with_scale_and_position(pixel_height, ab_glyph::point(caret, baseline));
            caret += scaled.h_advance(glyph_id);

            if let Some(outlined) = face.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = gx as i64 + bounds.min.x as i64;
                    let py = gy as i64 + bounds.min.y as i64;
                    coverage_px.push((px, py, coverage));
                });
            }
        }

        for (px, py, coverage) in coverage_px {
            let value = PAPER as f32 * (1.0 - coverage.clamp(0.0, 1.0));
            self.darken(px, py, value.round() as u8);
        }
    }
}

impl DrawSurface for RasterSurface {
    fn units_per_mm(&self) -> f64 {
        self.units_per_mm
    }

    fn measurer(&self) -> &dyn TextMeasure {
        match &self.ttf {
            Some(ttf) => ttf as &dyn TextMeasure,
            None => &self.mono,
        }
    }

    fn draw_rect(&mut self, rect: Rect, style: &ShapeStyle) {
        let Some(outer) = PixelRect::clip(rect, &self.image) else {
            return;
        };

        if let Some(fill) = style.fill {
            self.fill(outer, fill.luma());
        }

        if let Some(stroke) = style.stroke {
            let t = (style.stroke_width.round() as u32).max(1);
            let value = stroke.luma();
            let top = PixelRect { y1: (outer.y0 + t).min(outer.y1), ..outer };
            let bottom = PixelRect { y0: outer.y1.saturating_sub(t).max(outer.y0), ..outer };
            let left = PixelRect { x1: (outer.x0 + t).min(outer.x1), ..outer };
            let right = PixelRect { x0: outer.x1.saturating_sub(t).max(outer.x0), ..outer };
            for edge in [top, bottom, left, right] {
                self.fill(edge, value);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, font: &FontSpec) {
        match self.ttf.take() {
            Some(ttf) => {
                self.draw_ttf(&ttf, text, x, y, font);
                self.ttf = Some(ttf);
            }
            None => self.draw_spleen(text, x, y, font),
        }
    }

    fn draw_image(&mut self, image: &GrayImage, rect: Rect) {
        if image.width() == 0 || image.height() == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let Some(target) = PixelRect::clip(rect, &self.image) else {
            return;
        };

        let (src_w, src_h) = (image.width() as f64, image.height() as f64);
        for y in target.y0..target.y1 {
            let sy = (((y as f64 + 0.5 - rect.y) / rect.height * src_h) as u32).min(image.height() - 1);
            for x in target.x0..target.x1 {
                let sx = (((x as f64 + 0.5 - rect.x) / rect.width * src_w) as u32).min(image.width() - 1);
                let value = image.get_pixel(sx, sy).0[0];
                self.image.get_pixel_mut(x, y).0[0] = value;
            }
        }
    }
}

/// Pixel-aligned half-open rectangle, already clipped to the image.
#[derive(Debug, Clone, Copy)]
struct PixelRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRect {
    fn clip(rect: Rect, image: &GrayImage) -> Option<Self> {
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;
        let r = Self {
            x0: clamp(rect.x, image.width()),
            y0: clamp(rect.y, image.height()),
            x1: clamp(rect.right(), image.width()),
            y1: clamp(rect.bottom(), image.height()),
        };
        (r.x1 > r.x0 && r.y1 > r.y0).then_some(r)
    }
}

fn box_glyph(glyph: &mut GlyphBitmap) {
    for x in 0..SPLEEN_CELL_WIDTH {
        glyph[x] = true;
        glyph[(SPLEEN_CELL_HEIGHT - 1) * SPLEEN_CELL_WIDTH + x] = true;
    }
    for y in 0..SPLEEN_CELL_HEIGHT {
        glyph[y * SPLEEN_CELL_WIDTH] = true;
        glyph[y * SPLEEN_CELL_WIDTH + SPLEEN_CELL_WIDTH - 1] = true;
    }
}

/// Encode a grayscale image as PNG.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, EtiquetaError> {
    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(image.as_raw(), image.width(), image.height(), image::ExtendedColorType::L8)
        .map_err(|e: image::ImageError| EtiquetaError::Image(e.to_string()))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;
    use crate::template::FontWeight;

    fn settings(width: f64, height: f64, dpi: f64) -> TemplateSettings {
        TemplateSettings {
            width,
            height,
            dpi,
            ..Default::default()
        }
    }

    #[test]
    fn test_oversized_label_is_rejected() {
        let err = RasterSurface::new(&settings(100_000.0, 100_000.0, 203.0)).err().unwrap();
        assert!(matches!(err, EtiquetaError::Template(_)));
        assert!(RasterSurface::new(&settings(58.0, 40.0, 1e9)).is_err());
        // A4 at 600 dpi still fits
        assert!(RasterSurface::new(&settings(210.0, 297.0, 600.0)).is_ok());
    }

    fn ink(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn test_surface_size_from_settings() {
        let surface = RasterSurface::new(&settings(58.0, 40.0, 203.0)).unwrap();
        assert_eq!(surface.image().dimensions(), (464, 320));
        assert_eq!(ink(surface.image()), 0);
        assert!((surface.px_scale() - 203.0 / 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_filled_rect() {
        let mut surface = RasterSurface::new(&settings(25.4, 25.4, 100.0)).unwrap();
        let style = ShapeStyle {
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 0.0,
        };
        surface.draw_rect(Rect::new(10.0, 10.0, 20.0, 5.0), &style);
        assert_eq!(ink(surface.image()), 100);
        assert_eq!(surface.image().get_pixel(10, 10).0[0], 0);
        assert_eq!(surface.image().get_pixel(30, 10).0[0], 255);
    }

    #[test]
    fn test_stroked_rect_leaves_inside_blank() {
        let mut surface = RasterSurface::new(&settings(25.4, 25.4, 100.0)).unwrap();
        let style = ShapeStyle {
            fill: None,
            stroke: Some(Color::BLACK),
            stroke_width: 1.0,
        };
        surface.draw_rect(Rect::new(10.0, 10.0, 10.0, 10.0), &style);
        // 10x10 outline, 1px thick: 100 - 8x8
        assert_eq!(ink(surface.image()), 36);
        assert_eq!(surface.image().get_pixel(15, 15).0[0], 255);
    }

    #[test]
    fn test_rect_clipped_to_canvas() {
        let mut surface = RasterSurface::new(&settings(25.4, 25.4, 10.0)).unwrap();
        let style = ShapeStyle {
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 0.0,
        };
        surface.draw_rect(Rect::new(-5.0, -5.0, 100.0, 100.0), &style);
        assert_eq!(ink(surface.image()), 100);
    }

    #[test]
    fn test_spleen_text_draws_ink_in_its_cell() {
        let mut surface = RasterSurface::new(&settings(25.4, 25.4, 200.0)).unwrap();
        let font = FontSpec::new(24.0, "Arial", FontWeight::Normal);
        surface.draw_text("Hi", 10.0, 20.0, &font);
        let img = surface.image();
        assert!(ink(img) > 0);
        for (x, y, p) in img.enumerate_pixels() {
            if p.0[0] < 128 {
                assert!((10..34).contains(&x) && (20..44).contains(&y), "ink at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_image_scaled_into_rect() {
        let mut surface = RasterSurface::new(&settings(25.4, 25.4, 100.0)).unwrap();
        // 2x1 source: black, white
        let src = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        surface.draw_image(&src, Rect::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(ink(surface.image()), 100);
        assert_eq!(surface.image().get_pixel(9, 9).0[0], 0);
        assert_eq!(surface.image().get_pixel(10, 0).0[0], 255);
    }

    #[test]
    fn test_png_signature() {
        let surface = RasterSurface::new(&settings(10.0, 10.0, 96.0)).unwrap();
        let png = surface.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
