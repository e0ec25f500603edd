//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Template could not be loaded or is structurally invalid
    #[error("Template error: {0}")]
    Template(String),

    /// QR code or barcode encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Image loading, decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Font file could not be loaded
    #[error("Font error: {0}")]
    Font(String),

    /// HTTP server errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
