//! Template CRUD handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::template::{TemplateElement, TemplateSettings};

use super::super::state::{AppState, TemplateRecord};

/// Request body for creating or replacing a template.
///
/// `elements` and `settings` may be JSON values or JSON text; either way
/// they are stored as text and parsed leniently on use.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TemplateInput {
    pub name: String,
    pub elements: serde_json::Value,
    pub settings: serde_json::Value,
}

/// A template as returned to clients, with elements and settings parsed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    pub id: String,
    pub name: String,
    pub elements: Vec<TemplateElement>,
    pub settings: TemplateSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TemplateRecord> for TemplateView {
    fn from(record: &TemplateRecord) -> Self {
        let template = record.to_template();
        Self {
            id: record.id.clone(),
            name: template.name,
            elements: template.elements,
            settings: template.settings,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn json_text(value: serde_json::Value, empty: &str) -> String {
    match value {
        serde_json::Value::Null => empty.to_string(),
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Template not found: {}", id))
}

/// GET /api/templates - List templates, oldest first.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<TemplateView>> {
    let templates = state.templates.read().await;
    let mut records: Vec<&TemplateRecord> = templates.values().collect();
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Json(records.into_iter().map(TemplateView::from).collect())
}

/// POST /api/templates - Create a template.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TemplateInput>,
) -> (StatusCode, Json<TemplateView>) {
    let now = Utc::now();
    let record = TemplateRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name,
        elements: json_text(input.elements, "[]"),
        settings: json_text(input.settings, "{}"),
        created_at: now,
        updated_at: now,
    };
    info!(id = %record.id, name = %record.name, "template created");

    let view = TemplateView::from(&record);
    state.templates.write().await.insert(record.id.clone(), record);
    (StatusCode::CREATED, Json(view))
}

/// GET /api/templates/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TemplateView>, (StatusCode, String)> {
    let templates = state.templates.read().await;
    let record = templates.get(&id).ok_or_else(|| not_found(&id))?;
    Ok(Json(TemplateView::from(record)))
}

/// PUT /api/templates/:id - Replace name, elements and settings.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<TemplateInput>,
) -> Result<Json<TemplateView>, (StatusCode, String)> {
    let mut templates = state.templates.write().await;
    let record = templates.get_mut(&id).ok_or_else(|| not_found(&id))?;
    record.name = input.name;
    record.elements = json_text(input.elements, "[]");
    record.settings = json_text(input.settings, "{}");
    record.updated_at = Utc::now();
    info!(id = %id, "template updated");
    Ok(Json(TemplateView::from(&*record)))
}

/// DELETE /api/templates/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .templates
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| not_found(&id))?;
    info!(id = %id, "template deleted");
    Ok(StatusCode::NO_CONTENT)
}
