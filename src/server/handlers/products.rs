//! Product CRUD handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::template::{ProductData, product_data_from_json};

use super::super::state::{AppState, ProductRecord};

/// Request body for creating or replacing a product.
///
/// Field values may be any JSON scalar; numbers and booleans are stored in
/// their JSON text form and nulls are dropped.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ProductInput {
    fn into_data(self) -> ProductData {
        product_data_from_json(self.data)
    }
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Product not found: {}", id))
}

/// GET /api/products
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<ProductRecord>> {
    let products = state.products.read().await;
    let mut records: Vec<ProductRecord> = products.values().cloned().collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    Json(records)
}

/// POST /api/products
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProductInput>,
) -> (StatusCode, Json<ProductRecord>) {
    let record = ProductRecord {
        id: uuid::Uuid::new_v4().to_string(),
        data: input.into_data(),
        updated_at: Utc::now(),
    };
    state.products.write().await.insert(record.id.clone(), record.clone());
    (StatusCode::CREATED, Json(record))
}

/// GET /api/products/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductRecord>, (StatusCode, String)> {
    let products = state.products.read().await;
    products.get(&id).cloned().map(Json).ok_or_else(|| not_found(&id))
}

/// PUT /api/products/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductRecord>, (StatusCode, String)> {
    let mut products = state.products.write().await;
    let record = products.get_mut(&id).ok_or_else(|| not_found(&id))?;
    record.data = input.into_data();
    record.updated_at = Utc::now();
    Ok(Json(record.clone()))
}

/// DELETE /api/products/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .products
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| not_found(&id))?;
    Ok(StatusCode::NO_CONTENT)
}
