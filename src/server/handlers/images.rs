//! Image upload handlers.
//!
//! Uploaded images are decoded once and kept in the shared image store
//! under an `upload:<uuid>` key, which image elements use as `imageUrl`.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::render::{encode_png, images};

use super::super::state::AppState;

/// `imageUrl` prefix of uploaded images.
pub const UPLOAD_PREFIX: &str = "upload:";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Value to put in an image element's `imageUrl`
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// POST /api/images - Upload an image file (multipart field `image`).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read image: {}", e)))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let image_bytes = image_data.ok_or((StatusCode::BAD_REQUEST, "No image field found".to_string()))?;
    let url = format!("{}{}", UPLOAD_PREFIX, uuid::Uuid::new_v4());

    let image = images::decode(&image_bytes).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let (width, height) = image.dimensions();
    state.images.write().await.insert(url.clone(), image);
    info!(url = %url, width, height, "image uploaded");

    Ok(Json(UploadResponse { url, width, height }))
}

/// GET /api/images/:id - An uploaded image as grayscale PNG.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let url = format!("{}{}", UPLOAD_PREFIX, id);
    let store = state.images.read().await;
    let image = store
        .get(&url)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Image not found: {}", id)))?;
    let png = encode_png(image).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
