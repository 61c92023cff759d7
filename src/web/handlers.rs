// API handlers for the web server

use axum::{
    Json,
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    error::ApiError,
    extract_request_data::extract_request_image,
    image_codec::{decode_input_image, encode_png},
    models::{GreetingResponse, HealthResponse},
};
use crate::remover::SharedRemover;

// --- GET / ---
// Static liveness greeting
pub async fn root() -> Json<GreetingResponse> {
    Json(GreetingResponse {
        message: "Background Removal API is running!".to_string(),
    })
}

// --- GET /health ---
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

// --- POST /remove-bg/ ---
// Runs the uploaded image through the shared model session and streams back
// a PNG cutout. Every failure maps to a 200 response with a JSON error body
// (see error.rs).
pub async fn remove_background(
    State(session): State<SharedRemover>,
    request: Request,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();

    let (file_data, input_content_type) = extract_request_image(request).await?;
    info!(
        "Remove-bg request: {} byte(s), content_type={:?}, request_id={}",
        file_data.len(),
        input_content_type,
        request_id
    );

    // Decode and inference are CPU-bound; keep them off the async executor.
    let png_bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let image = decode_input_image(&file_data, input_content_type.as_deref())?;
        debug!(
            "Input image decoded: {}x{}, request_id={}",
            image.width(),
            image.height(),
            request_id
        );

        let cutout = session.remove_background(&image)?;
        encode_png(&cutout)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Image processing task failed: {}", e)))??;

    debug!(
        "Remove-bg completed: {} PNG byte(s), request_id={}",
        png_bytes.len(),
        request_id
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_DISPOSITION, "inline; filename=output.png"),
        ],
        png_bytes,
    )
        .into_response())
}
