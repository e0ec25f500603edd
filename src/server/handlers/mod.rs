//! HTTP handlers for the server.

pub mod images;
pub mod products;
pub mod render;
pub mod templates;
