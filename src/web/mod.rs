// Web server module for the background-removal service
// Handles the HTTP endpoints and response shaping

mod app;
mod error;
mod extract_request_data;
mod handlers;
mod image_codec;
mod listeners;
pub mod models;

pub use app::{create_app, create_router};
pub use listeners::create_listener;

// Maximum allowed size for image upload requests
pub const MAX_IMAGE_SIZE_BYTES: usize = 100 * 1024 * 1024; // 100MB
