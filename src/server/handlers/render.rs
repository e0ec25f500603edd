//! Rendering handlers: PNG preview, vector display list, text fitting.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::EtiquetaError;
use crate::fit::{FitOptions, FittedText, MonospaceMeasure, TextMeasure, fit};
use crate::render::{self, DrawCommand, ImageStore, RenderOptions, images};
use crate::template::{ElementTypeMeta, ProductData, Template, element_types};

use super::super::state::AppState;

/// Request body for preview and command rendering.
///
/// `data` is merged over the fields of `productId` when both are given.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderRequest {
    pub product_id: Option<String>,
    pub data: ProductData,
    pub options: RenderOptions,
}

/// Resolve the template, product data and images a render needs.
async fn prepare(
    state: &AppState,
    id: &str,
    req: &RenderRequest,
) -> Result<(Template, ProductData, ImageStore), (StatusCode, String)> {
    let template = state
        .templates
        .read()
        .await
        .get(id)
        .map(|record| record.to_template())
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Template not found: {}", id)))?;

    let mut data = ProductData::new();
    if let Some(product_id) = &req.product_id {
        let products = state.products.read().await;
        let product = products
            .get(product_id)
            .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Product not found: {}", product_id)))?;
        data.extend(product.data.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    data.extend(req.data.iter().map(|(k, v)| (k.clone(), v.clone())));

    // Downloads run without holding the store lock
    let missing = state.images.read().await.missing_remote(&template.elements);
    if !missing.is_empty() {
        let fetched = images::fetch_all(&missing, &state.http).await;
        let mut store = state.images.write().await;
        for (url, image) in fetched {
            store.insert(url, image);
        }
    }
    let images = state.images.read().await.subset_for(&template.elements);

    Ok((template, data, images))
}

/// POST /api/templates/:id/preview - Render a label as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RenderRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (template, data, images) = prepare(&state, &id, &req).await?;
    let ttf = state.ttf.clone();
    let options = req.options;
    debug!(id = %id, elements = template.elements.len(), "rendering preview");

    let png = tokio::task::spawn_blocking(move || {
        render::render_png(&template, &data, &images, &options, ttf.as_ref())
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e)))?
    .map_err(|e| match e {
        EtiquetaError::Template(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, format!("Preview render failed: {}", e)),
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// POST /api/templates/:id/commands - Render a label as a PDF-point display list.
pub async fn commands(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<Vec<DrawCommand>>, (StatusCode, String)> {
    let (template, data, images) = prepare(&state, &id, &req).await?;
    Ok(Json(render::render_commands(&template, &data, &images, &req.options)))
}

/// GET /api/element-types - Element type labels and default sizes.
pub async fn types() -> Json<Vec<ElementTypeMeta>> {
    Json(element_types())
}

/// Request body for POST /api/fit. Box size is in mm.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitRequest {
    pub text: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub options: FitOptions,
}

/// POST /api/fit - Fit text into a box with the server's measurement font.
pub async fn fit_text(State(state): State<Arc<AppState>>, Json(req): Json<FitRequest>) -> Json<FittedText> {
    let mono = MonospaceMeasure::default();
    let measure: &dyn TextMeasure = match &state.ttf {
        Some(ttf) => ttf as &dyn TextMeasure,
        None => &mono,
    };
    Json(fit(&req.text, req.width, req.height, &req.options, measure))
}
