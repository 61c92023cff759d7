// End-to-end tests for the HTTP surface. The router is driven in-process
// with `tower::ServiceExt::oneshot` against stub model sessions, so no ONNX
// runtime or model file is needed.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use serde_json::{Value, json};
use tower::ServiceExt;

use rembg_server::{
    remover::{BackgroundRemover, RemovalError},
    web::create_router,
};

/// Deterministic stand-in for the segmentation model: clears the alpha of
/// the outermost pixel ring and leaves the interior untouched.
struct StubRemover;

impl BackgroundRemover for StubRemover {
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, RemovalError> {
        let mut rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        for (x, y, pixel) in rgba.enumerate_pixels_mut() {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                pixel.0[3] = 0;
            }
        }
        Ok(rgba)
    }
}

struct FailingRemover;

impl BackgroundRemover for FailingRemover {
    fn remove_background(&self, _image: &DynamicImage) -> Result<RgbaImage, RemovalError> {
        Err(RemovalError::Failed("session exploded".to_string()))
    }
}

fn app() -> Router {
    create_router(Arc::new(StubRemover))
}

fn red_square_png(size: u32) -> Vec<u8> {
    let mut img = RgbaImage::new(size, size);
    for pixel in img.pixels_mut() {
        *pixel = Rgba([255, 0, 0, 255]);
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn blue_square_jpeg(size: u32) -> Vec<u8> {
    let mut img = RgbImage::new(size, size);
    for pixel in img.pixels_mut() {
        *pixel = Rgb([0, 0, 255]);
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

const BOUNDARY: &str = "rembg-test-boundary";

fn multipart_request(field_name: &str, bytes: &[u8], content_type: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"input\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/remove-bg/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn header_str(response: &axum::response::Response, name: header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn root_returns_exact_greeting() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"message": "Background Removal API is running!"}));
}

#[tokio::test]
async fn health_returns_exact_status() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn valid_png_upload_returns_png_cutout() {
    let response = app()
        .oneshot(multipart_request("file", &red_square_png(100), "image/png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "inline; filename=output.png"
    );

    let output = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((output.width(), output.height()), (100, 100));
    assert!(output.color().has_alpha());

    let rgba = output.to_rgba8();
    // Border cleared by the stub, subject pixels kept fully opaque and red.
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    assert_eq!(rgba.get_pixel(50, 50), &Rgba([255, 0, 0, 255]));
}

#[tokio::test]
async fn valid_jpeg_upload_returns_png_cutout() {
    let response = app()
        .oneshot(multipart_request(
            "file",
            &blue_square_jpeg(32),
            "image/jpeg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");

    let output = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((output.width(), output.height()), (32, 32));
}

#[tokio::test]
async fn mislabeled_png_upload_still_succeeds() {
    // The part's declared content type lies; the bytes are a valid PNG.
    // Format sniffing must win over the declared type.
    let response = app()
        .oneshot(multipart_request(
            "file",
            &red_square_png(16),
            "image/jpeg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");

    let output = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((output.width(), output.height()), (16, 16));
}

#[tokio::test]
async fn non_image_upload_reports_json_error_with_status_200() {
    let response = app()
        .oneshot(multipart_request(
            "file",
            b"this is a text file, not an image",
            "text/plain",
        ))
        .await
        .unwrap();

    // Failures deliberately keep status 200; clients inspect the body.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/json"
    );

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body.get("error").and_then(Value::as_str).is_some());
}

#[tokio::test]
async fn missing_file_field_reports_json_error() {
    let response = app()
        .oneshot(multipart_request("avatar", &red_square_png(8), "image/png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Missing 'file' field")
    );
}

#[tokio::test]
async fn empty_file_field_reports_json_error() {
    let response = app()
        .oneshot(multipart_request("file", b"", "image/png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/json"
    );

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn raw_image_body_is_accepted() {
    let request = Request::post("/remove-bg/")
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(red_square_png(16)))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");
}

#[tokio::test]
async fn model_failure_reports_json_error_with_status_200() {
    let router = create_router(Arc::new(FailingRemover));
    let response = router
        .oneshot(multipart_request("file", &red_square_png(8), "image/png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/json"
    );

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("session exploded"));
}

#[tokio::test]
async fn concurrent_requests_do_not_cross_contaminate() {
    let router = app();

    let red = multipart_request("file", &red_square_png(24), "image/png");
    let blue = multipart_request("file", &blue_square_jpeg(24), "image/jpeg");

    let (red_response, blue_response) = tokio::join!(
        router.clone().oneshot(red),
        router.clone().oneshot(blue),
    );

    let red_out = image::load_from_memory(&body_bytes(red_response.unwrap()).await)
        .unwrap()
        .to_rgba8();
    let blue_out = image::load_from_memory(&body_bytes(blue_response.unwrap()).await)
        .unwrap()
        .to_rgba8();

    let red_center = red_out.get_pixel(12, 12);
    let blue_center = blue_out.get_pixel(12, 12);
    assert!(red_center.0[0] > 200 && red_center.0[2] < 50);
    assert!(blue_center.0[2] > 200 && blue_center.0[0] < 50);
}

#[tokio::test]
async fn identical_uploads_produce_identical_outputs() {
    let router = app();
    let input = red_square_png(20);

    let first = router
        .clone()
        .oneshot(multipart_request("file", &input, "image/png"))
        .await
        .unwrap();
    let second = router
        .clone()
        .oneshot(multipart_request("file", &input, "image/png"))
        .await
        .unwrap();

    assert_eq!(body_bytes(first).await, body_bytes(second).await);
}
