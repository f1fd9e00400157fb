use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub mod interactions;
pub mod library;
pub mod movies;
pub mod search;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
