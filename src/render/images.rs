//! Image loading for `image` elements.
//!
//! Images are resolved before rendering (rendering itself is synchronous)
//! and kept as decoded grayscale bitmaps keyed by their `imageUrl`.
//! `http://` and `https://` URLs are downloaded with reqwest. Local file
//! paths are only read by [`ImageStore::load_local_for`], which the CLI
//! calls with the template's directory; the server never touches its disk
//! for template images.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use image::GrayImage;
use tracing::{debug, warn};

use crate::error::EtiquetaError;
use crate::template::{ElementKind, TemplateElement};

/// Whole-request timeout for one image download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Decoded images keyed by URL or path.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: HashMap<String, GrayImage>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&GrayImage> {
        self.images.get(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, image: GrayImage) {
        self.images.insert(url.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Copy of the images `elements` reference.
    pub fn subset_for(&self, elements: &[TemplateElement]) -> ImageStore {
        let images = image_urls(elements)
            .into_iter()
            .filter_map(|url| self.images.get(&url).map(|img| (url, img.clone())))
            .collect();
        ImageStore { images }
    }

    /// Remote image URLs referenced by `elements` that are not stored yet.
    pub fn missing_remote(&self, elements: &[TemplateElement]) -> Vec<String> {
        image_urls(elements)
            .into_iter()
            .filter(|url| is_remote(url) && !self.images.contains_key(url))
            .collect()
    }

    /// Download every remote image referenced by `elements` that is not
    /// stored yet. Local paths are left to [`ImageStore::load_local_for`].
    pub async fn load_for(&mut self, elements: &[TemplateElement], client: &reqwest::Client) {
        let missing = self.missing_remote(elements);
        for (url, image) in fetch_all(&missing, client).await {
            self.images.insert(url, image);
        }
    }

    /// Read local image files, resolving relative paths against `base_dir`.
    /// Remote URLs are skipped.
    pub fn load_local_for(&mut self, elements: &[TemplateElement], base_dir: Option<&Path>) {
        for url in image_urls(elements) {
            if self.images.contains_key(&url) || is_remote(&url) {
                continue;
            }
            let path = match base_dir {
                Some(dir) => dir.join(&url),
                None => Path::new(&url).to_path_buf(),
            };
            match load_file(&path) {
                Ok(image) => {
                    self.images.insert(url, image);
                }
                Err(e) => warn!(url = %url, error = %e, "image unavailable, drawing placeholder"),
            }
        }
    }
}

/// Distinct non-empty image URLs, in element order.
pub fn image_urls(elements: &[TemplateElement]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for el in elements {
        if let ElementKind::Image(props) = &el.kind
            && let Some(url) = props.image_url.as_deref().map(str::trim)
            && !url.is_empty()
            && !urls.iter().any(|u| u == url)
        {
            urls.push(url.to_string());
        }
    }
    urls
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Download `urls` one after another. A failed download or decode is
/// logged and skipped; the renderer draws a placeholder for it.
pub async fn fetch_all(urls: &[String], client: &reqwest::Client) -> Vec<(String, GrayImage)> {
    let mut fetched = Vec::with_capacity(urls.len());
    for url in urls {
        match fetch(url, client).await {
            Ok(image) => {
                debug!(url = %url, width = image.width(), height = image.height(), "image loaded");
                fetched.push((url.clone(), image));
            }
            Err(e) => warn!(url = %url, error = %e, "image unavailable, drawing placeholder"),
        }
    }
    fetched
}

/// Download and decode an image.
pub async fn fetch(url: &str, client: &reqwest::Client) -> Result<GrayImage, EtiquetaError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| EtiquetaError::Image(format!("Failed to download {}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(EtiquetaError::Image(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| EtiquetaError::Image(format!("Failed to read image data: {}", e)))?;
    decode(&bytes)
}

pub fn load_file(path: &Path) -> Result<GrayImage, EtiquetaError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Decode an encoded image (PNG, JPEG, ...) to grayscale.
pub fn decode(bytes: &[u8]) -> Result<GrayImage, EtiquetaError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_luma8())
        .map_err(|e| EtiquetaError::Image(format!("Failed to decode image: {}", e)))
}

/// HTTP client used for image downloads.
pub fn http_client() -> Result<reqwest::Client, EtiquetaError> {
    reqwest::Client::builder()
        .user_agent(concat!("etiqueta/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| EtiquetaError::Image(format!("HTTP client error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ImageProps, TextProps};
    use image::Luma;

    fn image_element(url: Option<&str>) -> TemplateElement {
        TemplateElement::new(ElementKind::Image(ImageProps {
            image_url: url.map(String::from),
        }))
    }

    fn png_bytes() -> Vec<u8> {
        let img = GrayImage::from_pixel(3, 2, Luma([40]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_image_urls_dedup_and_skip_empty() {
        let elements = vec![
            image_element(Some("a.png")),
            image_element(None),
            TemplateElement::new(ElementKind::Text(TextProps::default())),
            image_element(Some(" a.png ")),
            image_element(Some("")),
            image_element(Some("https://cdn.example/b.png")),
        ];
        assert_eq!(image_urls(&elements), vec!["a.png", "https://cdn.example/b.png"]);
    }

    #[test]
    fn test_decode_to_gray() {
        let img = decode(&png_bytes()).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0[0], 40);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, EtiquetaError::Image(_)));
    }

    #[test]
    fn test_load_local_skips_missing_and_remote() {
        let mut store = ImageStore::new();
        let elements = vec![
            image_element(Some("/nonexistent/logo.png")),
            image_element(Some("https://cdn.example/b.png")),
        ];
        store.load_local_for(&elements, None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_remote_ignores_local_paths_and_stored() {
        let mut store = ImageStore::new();
        store.insert("https://cdn.example/a.png", GrayImage::new(1, 1));
        let elements = vec![
            image_element(Some("/etc/logo.png")),
            image_element(Some("upload:1234")),
            image_element(Some("https://cdn.example/a.png")),
            image_element(Some("http://cdn.example/b.png")),
        ];
        assert_eq!(store.missing_remote(&elements), vec!["http://cdn.example/b.png"]);
    }

    #[tokio::test]
    async fn test_load_for_never_reads_local_files() {
        let dir = std::env::temp_dir().join(format!("etiqueta-img-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secret.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let mut store = ImageStore::new();
        let url = path.to_string_lossy().into_owned();
        store.load_for(&[image_element(Some(&url))], &http_client().unwrap()).await;
        assert!(store.is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_local_reads_files() {
        let dir = std::env::temp_dir().join(format!("etiqueta-img-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("logo.png"), png_bytes()).unwrap();

        let mut store = ImageStore::new();
        store.load_local_for(&[image_element(Some("logo.png"))], Some(&dir));
        assert!(store.get("logo.png").is_some());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
