//! Vector display list in PDF points.
//!
//! `CommandSurface` records draw calls instead of painting pixels, so an
//! external PDF writer can replay them. Coordinates are points (1/72 in)
//! from the label's top-left corner, y pointing down; a PDF writer flips y
//! against the page height.

use image::GrayImage;
use serde::Serialize;

use super::{DrawSurface, ShapeStyle};
use crate::fit::{FontSpec, MonospaceMeasure, TextMeasure};
use crate::geom::Rect;
use crate::template::{FontWeight, TemplateSettings};
use crate::units::mm_to_pt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DrawCommand {
    /// Page size; always the first command.
    Page { width: f64, height: f64 },
    #[serde(rename_all = "camelCase")]
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        stroke_width: f64,
    },
    /// `y` is the top of the text line.
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        x: f64,
        y: f64,
        font_size: f64,
        font_family: String,
        bold: bool,
    },
    /// Grayscale bitmap, row-major, one byte per pixel.
    #[serde(rename_all = "camelCase")]
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        pixel_width: u32,
        pixel_height: u32,
        data: Vec<u8>,
    },
}

pub struct CommandSurface {
    commands: Vec<DrawCommand>,
    measure: Box<dyn TextMeasure + Send + Sync>,
}

impl CommandSurface {
    pub fn new(settings: &TemplateSettings) -> Self {
        Self::with_measure(settings, Box::new(MonospaceMeasure::default()))
    }

    /// Use another text measurement backend, typically the metrics of the
    /// font the PDF writer will embed.
    pub fn with_measure(settings: &TemplateSettings, measure: Box<dyn TextMeasure + Send + Sync>) -> Self {
        Self {
            commands: vec![DrawCommand::Page {
                width: mm_to_pt(settings.width),
                height: mm_to_pt(settings.height),
            }],
            measure,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl DrawSurface for CommandSurface {
    fn units_per_mm(&self) -> f64 {
        mm_to_pt(1.0)
    }

    fn measurer(&self) -> &dyn TextMeasure {
        self.measure.as_ref()
    }

    fn draw_rect(&mut self, rect: Rect, style: &ShapeStyle) {
        self.commands.push(DrawCommand::Rect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            fill: style.fill.map(|c| c.to_hex()),
            stroke: style.stroke.map(|c| c.to_hex()),
            stroke_width: style.stroke_width,
        });
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, font: &FontSpec) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            font_size: font.size_px,
            font_family: font.family.clone(),
            bold: font.weight == FontWeight::Bold,
        });
    }

    fn draw_image(&mut self, image: &GrayImage, rect: Rect) {
        self.commands.push(DrawCommand::Image {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            pixel_width: image.width(),
            pixel_height: image.height(),
            data: image.as_raw().clone(),
        });
    }
}
