use crate::types::{Point, Quad, ReceiptData};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::blocking::Client;
use serde::Deserialize;

const DEFAULT_API_BASE_URL: &str = "http://kid-dev.australiaeast.cloudapp.azure.com";

fn load_env() {
    let _ = dotenvy::dotenv();
}

fn api_base_url() -> String {
    load_env();
    std::env::var("RECEIPT_API_URL")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

fn client() -> Result<Client, String> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .map_err(|e| e.to_string())
}

fn network_error(e: reqwest::Error) -> String {
    if e.is_connect() || e.is_timeout() {
        "Check your internet connection and try again."
    } else {
        "Network error."
    }
    .to_string()
}

/// Human-readable message from an error response body: the service reports
/// failures as `{"detail": "..."}`.
fn error_detail(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Deserialize)]
struct DetectionResponse {
    points: Vec<Point>,
}

fn quad_from_points(points: Vec<Point>) -> Result<Quad, String> {
    if points.len() != 4 {
        return Err(format!("Expected 4 corner points, got {}.", points.len()));
    }
    Ok([points[0], points[1], points[2], points[3]])
}

fn parse_detected_points(body: &str) -> Result<Quad, String> {
    let parsed: DetectionResponse =
        serde_json::from_str(body).map_err(|e| format!("Invalid JSON: {}", e))?;
    quad_from_points(parsed.points)
}

fn process_payload(image: &[u8], points: &Quad) -> serde_json::Value {
    serde_json::json!({
        "image_b64": BASE64.encode(image),
        "points": points,
    })
}

/// Ask the service for the document's four corners in image-pixel space.
pub fn detect_edges(image: &[u8]) -> Result<Quad, String> {
    let url = format!("{}/detect-edges", api_base_url());
    let response = client()?
        .post(&url)
        .header("Content-Type", "application/octet-stream")
        .body(image.to_vec())
        .send()
        .map_err(network_error)?;

    let status = response.status();
    let body = response.text().map_err(|e| e.to_string())?;
    if !status.is_success() {
        return Err(error_detail(&body, "Failed to detect edges."));
    }
    parse_detected_points(&body)
}

/// Submit the image and the corrected quadrilateral; returns the structured
/// receipt.
pub fn process_receipt(image: &[u8], points: &Quad) -> Result<ReceiptData, String> {
    let url = format!("{}/process-receipt", api_base_url());
    let response = client()?
        .post(&url)
        .json(&process_payload(image, points))
        .send()
        .map_err(network_error)?;

    let status = response.status();
    let body = response.text().map_err(|e| e.to_string())?;
    if !status.is_success() {
        return Err(error_detail(&body, "Failed to process receipt."));
    }
    serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))
}

/// Encode a small preview image as a data URL for history thumbnails.
pub fn image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
