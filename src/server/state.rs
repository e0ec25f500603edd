//! Server state and configuration.
//!
//! Everything lives in process memory behind tokio `RwLock`s. Template
//! records keep their elements and settings as JSON text, the way a
//! database row would, and are parsed leniently whenever they are used.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::EtiquetaError;
use crate::fit::TtfMeasure;
use crate::render::ImageStore;
use crate::render::images::http_client;
use crate::template::{ProductData, Template, parse_elements, parse_settings};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// TrueType font for measuring and drawing text; Spleen when unset
    pub font_path: Option<PathBuf>,
    /// Bold face paired with `font_path`
    pub bold_font_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".into(),
            font_path: None,
            bold_font_path: None,
        }
    }
}

/// A stored label template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    /// Element array as JSON text
    pub elements: String,
    /// Template settings as JSON text
    pub settings: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateRecord {
    pub fn to_template(&self) -> Template {
        Template {
            name: self.name.clone(),
            settings: parse_settings(&self.settings),
            elements: parse_elements(&self.elements),
        }
    }
}

/// A stored product: display fields referenced by `{{field}}` and `dataField`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub data: ProductData,
    pub updated_at: DateTime<Utc>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub templates: RwLock<HashMap<String, TemplateRecord>>,
    pub products: RwLock<HashMap<String, ProductRecord>>,
    /// Uploaded and downloaded images keyed by URL
    pub images: RwLock<ImageStore>,
    pub http: reqwest::Client,
    pub ttf: Option<TtfMeasure>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, EtiquetaError> {
        let ttf = match &config.font_path {
            Some(path) => {
                let mut ttf = TtfMeasure::from_file(path)?;
                if let Some(bold) = &config.bold_font_path {
                    ttf = ttf.with_bold_file(bold)?;
                }
                info!(font = %path.display(), "using TrueType font");
                Some(ttf)
            }
            None => None,
        };

        Ok(Self {
            config,
            templates: RwLock::new(HashMap::new()),
            products: RwLock::new(HashMap::new()),
            images: RwLock::new(ImageStore::new()),
            http: http_client()?,
            ttf,
        })
    }
}
