// Response payloads for the API server

use serde::{Deserialize, Serialize};

/// Body of `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GreetingResponse {
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
