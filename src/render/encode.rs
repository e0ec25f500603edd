//! QR and 1D barcode encoding to module bitmaps.
//!
//! Each dark module is one black pixel; the renderer scales the bitmap to
//! the element box. A 1D barcode comes back one pixel tall.
//!
//! Encoding never fails a render: an empty value or a value the symbology
//! rejects is replaced by [`FALLBACK_CODE_VALUE`], so a placeholder label
//! still prints.

use barcoders::sym::code39::Code39;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::EAN13;
use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::warn;

use crate::error::EtiquetaError;
use crate::template::{BarcodeFormat, QrErrorLevel};

/// Value encoded when the resolved content is empty or unencodable.
pub const FALLBACK_CODE_VALUE: &str = "0000000000000";

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Encode `data` as a QR code, one pixel per module.
pub fn encode_qr(data: &str, level: QrErrorLevel) -> Result<GrayImage, EtiquetaError> {
    let ec_level = match level {
        QrErrorLevel::L => EcLevel::L,
        QrErrorLevel::M => EcLevel::M,
        QrErrorLevel::Q => EcLevel::Q,
        QrErrorLevel::H => EcLevel::H,
    };

    let code = QrCode::with_error_correction_level(data, ec_level)
        .map_err(|e| EtiquetaError::Encode(format!("QR code generation failed: {}", e)))?;

    let size = code.width();
    Ok(GrayImage::from_fn(size as u32, size as u32, |x, y| {
        if code[(x as usize, y as usize)] == qrcode::Color::Dark {
            BLACK
        } else {
            WHITE
        }
    }))
}

/// Encode `data` as a 1D barcode, one pixel per module, one pixel tall.
pub fn encode_barcode(data: &str, format: BarcodeFormat) -> Result<GrayImage, EtiquetaError> {
    let modules = match format {
        BarcodeFormat::Code128 => {
            // Character set B covers printable ASCII
            let prefixed = format!("\u{0181}{}", data);
            Code128::new(&prefixed)
                .map_err(|e| EtiquetaError::Encode(format!("Code128: {}", e)))?
                .encode()
        }
        BarcodeFormat::Code39 => Code39::new(data)
            .map_err(|e| EtiquetaError::Encode(format!("Code39: {}", e)))?
            .encode(),
        BarcodeFormat::Ean13 => EAN13::new(ean13_payload(data)?)
            .map_err(|e| EtiquetaError::Encode(format!("EAN-13: {}", e)))?
            .encode(),
    };

    if modules.is_empty() {
        return Err(EtiquetaError::Encode("barcode produced no modules".into()));
    }

    Ok(GrayImage::from_fn(modules.len() as u32, 1, |x, _| {
        if modules[x as usize] == 1 { BLACK } else { WHITE }
    }))
}

/// EAN-13 takes 12 data digits; a 13th (check) digit is dropped and
/// recomputed by the encoder.
fn ean13_payload(data: &str) -> Result<&str, EtiquetaError> {
    let data = data.trim();
    if !data.chars().all(|c| c.is_ascii_digit()) {
        return Err(EtiquetaError::Encode(format!("EAN-13 needs digits, got {:?}", data)));
    }
    match data.len() {
        12 => Ok(data),
        13 => Ok(&data[..12]),
        n => Err(EtiquetaError::Encode(format!("EAN-13 needs 12 or 13 digits, got {}", n))),
    }
}

/// Encode an element's resolved value, falling back to the placeholder.
pub fn encode_qr_or_fallback(value: &str, level: QrErrorLevel) -> GrayImage {
    encode_or_fallback(value, |v| encode_qr(v, level))
}

/// Encode an element's resolved value, falling back to the placeholder.
pub fn encode_barcode_or_fallback(value: &str, format: BarcodeFormat) -> GrayImage {
    encode_or_fallback(value, |v| encode_barcode(v, format))
}

fn encode_or_fallback(value: &str, encode: impl Fn(&str) -> Result<GrayImage, EtiquetaError>) -> GrayImage {
    let value = value.trim();
    if !value.is_empty() {
        match encode(value) {
            Ok(img) => return img,
            Err(e) => warn!(value, error = %e, "encoder rejected value, using fallback"),
        }
    }
    encode(FALLBACK_CODE_VALUE).unwrap_or_else(|e| {
        warn!(error = %e, "fallback value failed to encode");
        GrayImage::from_pixel(1, 1, WHITE)
    })
}
