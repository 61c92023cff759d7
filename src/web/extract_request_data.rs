use axum::{
    body,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use tracing::{debug, warn};

use super::error::ApiError;

/// Pulls the uploaded image bytes out of the request, along with the
/// declared content type of the upload (if any). The canonical client sends
/// `multipart/form-data` with a single `file` field; a raw image body is
/// accepted as well.
pub async fn extract_request_image(
    request: Request,
) -> Result<(Vec<u8>, Option<String>), ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        extract_multipart_image(request).await
    } else {
        extract_direct_image(request, &content_type).await
    }
}

// Helper function to extract image data from a multipart request
async fn extract_multipart_image(request: Request) -> Result<(Vec<u8>, Option<String>), ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadUpload(format!("Failed to process multipart request: {}", e)))?;

    let mut file_data_opt: Option<Vec<u8>> = None;
    let mut content_type_opt: Option<String> = None;

    // Loop through all fields to find "file" and ignore others
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(format!("Failed to process multipart field: {}", e)))?
    {
        if field.name() == Some("file") {
            if file_data_opt.is_some() {
                warn!("Multiple 'file' fields found in multipart request, using the last one");
            }

            let content_type_str = field.content_type().map(str::to_string);
            debug!("Received file with content type: {:?}", content_type_str);

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadUpload(format!("Failed to read file data: {}", e)))?
                .to_vec();

            if data.is_empty() {
                return Err(ApiError::BadUpload(
                    "Uploaded 'file' field is empty.".to_string(),
                ));
            }

            file_data_opt = Some(data);
            content_type_opt = content_type_str;
        } else {
            debug!(
                "Ignoring multipart field: {}",
                field.name().unwrap_or("unnamed")
            );
        }
    }

    match file_data_opt {
        Some(data) => Ok((data, content_type_opt)),
        None => Err(ApiError::BadUpload(
            "Missing 'file' field in multipart request.".to_string(),
        )),
    }
}

// Helper function to extract image data from a direct (non-multipart) request
async fn extract_direct_image(
    request: Request,
    content_type: &str,
) -> Result<(Vec<u8>, Option<String>), ApiError> {
    let bytes = body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| ApiError::BadUpload(format!("Failed to read request body: {}", e)))?;

    if bytes.is_empty() {
        return Err(ApiError::BadUpload("Request body is empty.".to_string()));
    }

    let declared = if content_type.is_empty() {
        None
    } else {
        Some(content_type.to_string())
    };

    // No MIME allow-list here; the decode step is the validator.
    Ok((bytes.to_vec(), declared))
}
