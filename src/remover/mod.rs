// Model session layer.
// The background-removal model is an external collaborator reached through a
// single call; everything above this module only sees the trait.

mod onnx;

pub use onnx::OnnxRemover;

use image::{DynamicImage, RgbaImage};
use thiserror::Error;

/// Errors produced while loading or invoking the segmentation model.
#[derive(Debug, Error)]
pub enum RemovalError {
    #[error("failed to initialize model session: {0}")]
    SessionInit(#[source] ort::Error),

    #[error("model inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("unexpected mask tensor shape: {0}")]
    MaskShape(#[from] ndarray::ShapeError),

    #[error("background removal failed: {0}")]
    Failed(String),
}

/// Abstraction over the pretrained segmentation model.
///
/// Implementations must be safe to call from multiple request handlers
/// concurrently; the handle is created once at startup and shared for the
/// lifetime of the process.
pub trait BackgroundRemover: Send + Sync {
    /// Runs segmentation on `image` and returns an RGBA cutout of the same
    /// dimensions with background pixels' alpha set to (near) zero.
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, RemovalError>;
}

pub type SharedRemover = std::sync::Arc<dyn BackgroundRemover>;
