//! # Text Fitting
//!
//! Finds the largest font size (down to a floor) at which word-wrapped text
//! fits a fixed box, and lays the lines out inside it.
//!
//! ## Algorithm
//!
//! ```text
//! size = start
//! loop:
//!     lines = wrap(text, box_width - 2 * padding, size)
//!     if lines * size * line_height <= box_height: done
//!     if size <= min or 32 shrinks done: give up shrinking
//!     size = max(size * 0.92, min)
//! drop lines past floor(box_height / (size * line_height))
//! ```
//!
//! All outputs are in pixels at `FitOptions::dpi` (96 = CSS pixels), relative
//! to the box's top-left corner. Measurement is injected through
//! [`TextMeasure`], so the same fitter drives raster and vector output.

pub mod measure;

pub use measure::{FontSpec, MonospaceMeasure, TextMeasure, TtfMeasure};

use serde::{Deserialize, Serialize};

use crate::template::{FontWeight, TextAlign, TextProps, VerticalAlign};
use crate::units::{CSS_DPI, mm_to_px};

/// Per-step shrink factor.
pub const SHRINK_RATIO: f64 = 0.92;

/// Upper bound on shrink steps.
pub const MAX_FIT_ITERATIONS: u32 = 32;

/// Slack for comparing a block height against the box height.
const FIT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitOptions {
    pub start_font_size_px: f64,
    pub min_font_size_px: f64,
    pub font_family: String,
    pub font_weight: FontWeight,
    /// Line height as a multiple of the font size
    pub line_height: f64,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
    /// Inset from the box edges for left/right and top/bottom alignment
    pub padding_px: f64,
    /// Resolution used to convert the box from mm
    pub dpi: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            start_font_size_px: 12.0,
            min_font_size_px: 6.0,
            font_family: "Arial".into(),
            font_weight: FontWeight::Normal,
            line_height: 1.2,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            padding_px: 2.0,
            dpi: CSS_DPI,
        }
    }
}

impl FitOptions {
    /// Options for a template text element.
    pub fn for_text(props: &TextProps) -> Self {
        Self {
            start_font_size_px: props.font_size,
            font_family: props.font_family.clone(),
            font_weight: props.font_weight,
            align: props.text_align,
            vertical_align: props.vertical_align,
            ..Default::default()
        }
    }

    fn font(&self, size_px: f64) -> FontSpec {
        FontSpec::new(size_px, self.font_family.clone(), self.font_weight)
    }
}

/// One laid-out line. `x`/`y` are the line's top-left inside the box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedText {
    pub lines: Vec<FittedLine>,
    pub font_size_px: f64,
    /// Left edge of the first line
    pub origin_x: f64,
    /// Top of the text block
    pub origin_y: f64,
    pub line_height_px: f64,
    /// Shrink steps taken
    pub iterations: u32,
}

impl FittedText {
    pub fn line_texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn block_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height_px
    }
}

/// Fit `text` into a `box_w_mm` × `box_h_mm` box.
pub fn fit(text: &str, box_w_mm: f64, box_h_mm: f64, options: &FitOptions, measure: &dyn TextMeasure) -> FittedText {
    let box_w = mm_to_px(box_w_mm, options.dpi);
    let box_h = mm_to_px(box_h_mm, options.dpi);
    fit_px(text, box_w, box_h, options, measure)
}

/// [`fit`] with the box already in pixels.
pub fn fit_px(text: &str, box_w: f64, box_h: f64, options: &FitOptions, measure: &dyn TextMeasure) -> FittedText {
    let min_size = options.min_font_size_px.max(0.0);
    let wrap_width = (box_w - 2.0 * options.padding_px).max(0.0);

    let mut size = options.start_font_size_px;
    let mut iterations = 0;
    let mut lines = wrap_text(text, wrap_width, &options.font(size), measure);

    while lines.len() as f64 * size * options.line_height > box_h + FIT_EPSILON
        && size > min_size
        && iterations < MAX_FIT_ITERATIONS
    {
        size = (size * SHRINK_RATIO).max(min_size);
        iterations += 1;
        lines = wrap_text(text, wrap_width, &options.font(size), measure);
    }

    let line_h = size * options.line_height;
    if line_h > 0.0 {
        let max_lines = (((box_h + FIT_EPSILON) / line_h).floor() as usize).max(1);
        lines.truncate(max_lines);
    }

    let font = options.font(size);
    let block_h = lines.len() as f64 * line_h;
    let pad = options.padding_px;
    let origin_y = match options.vertical_align {
        VerticalAlign::Top => pad,
        VerticalAlign::Middle => (box_h - block_h) / 2.0,
        VerticalAlign::Bottom => box_h - pad - block_h,
    };

    let lines: Vec<FittedLine> = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = measure.text_width(&text, &font);
            let x = match options.align {
                TextAlign::Left => pad,
                TextAlign::Center => (box_w - width) / 2.0,
                TextAlign::Right => box_w - pad - width,
            };
            FittedLine {
                text,
                x,
                y: origin_y + i as f64 * line_h,
                width,
            }
        })
        .collect();

    FittedText {
        origin_x: lines.first().map_or(pad, |l| l.x),
        origin_y,
        lines,
        font_size_px: size,
        line_height_px: line_h,
        iterations,
    }
}

/// Greedy word wrap. Words are never split; a word wider than `max_width`
/// gets a line of its own. Newlines are hard breaks.
pub fn wrap_text(text: &str, max_width: f64, font: &FontSpec, measure: &dyn TextMeasure) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure.text_width(&candidate, font) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}
