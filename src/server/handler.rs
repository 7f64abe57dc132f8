//! Route handlers

use super::AppState;
use crate::health::{self, HealthReport};
use crate::metrics::CONTENT_TYPE;
use crate::process::{self, Summary};
use crate::{Result, ServiceError, StoreError};
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::{Value, json};
use tracing::info;

const WELCOME: &str = "Welcome to Python Microservice API!";

/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({ "message": WELCOME }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(health::probe(state.store.as_ref(), state.cache.as_ref()).await)
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let body = state.metrics.gather()?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response())
}

/// GET /api/data
///
/// Cached snapshots are returned byte for byte; a miss materializes the whole
/// collection and caches exactly what is returned.
pub async fn get_data(State(state): State<AppState>) -> Result<Response> {
    if let Some(cached) = state.cache.get(state.cache_key()).await?
        && !cached.is_empty()
    {
        info!("Data retrieved from cache");
        return Ok(json_text(cached));
    }

    let records = state.store.find_all().await?;
    let body = serde_json::to_string(&records)
        .map_err(|e| ServiceError::Internal(format!("Failed to serialize records: {e}")))?;

    state
        .cache
        .set_ex(state.cache_key(), &body, state.cache_ttl())
        .await?;
    info!("Data retrieved from MongoDB and stored in cache");

    Ok(json_text(body))
}

/// POST /api/data
pub async fn add_data(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let Some(payload) = parse_body(&body)?.filter(is_truthy) else {
        return Err(ServiceError::BadRequest("No data provided".to_string()));
    };

    let record = match payload {
        Value::Object(record) => record,
        other => {
            return Err(StoreError::Encoding(format!(
                "document must be a JSON object, got {}",
                kind(&other)
            ))
            .into());
        }
    };

    let id = state.store.insert_one(record).await?;

    // Drop the whole snapshot; the next read rebuilds it
    state.cache.delete(state.cache_key()).await?;

    let body = json!({ "message": "Data added successfully", "id": id });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// POST /api/process
pub async fn process_data(body: Bytes) -> Result<Json<Summary>> {
    let payload = parse_body(&body)?;
    let values = payload
        .as_ref()
        .filter(|v| is_truthy(v))
        .and_then(Value::as_object)
        .and_then(|map| map.get("values"))
        .ok_or_else(|| ServiceError::BadRequest("No data provided or invalid format".to_string()))?;

    Ok(Json(process::summarize(values)?))
}

/// Fallback for unmatched paths
pub async fn not_found() -> ServiceError {
    ServiceError::NotFound
}

/// Parse an optional JSON body; blank bodies are `None`
fn parse_body(body: &[u8]) -> Result<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|_| ServiceError::BadRequest("Invalid JSON body".to_string()))
}

/// Empty containers, zero, `false`, `""` and `null` count as no data
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn json_text(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b"").unwrap(), None);
        assert_eq!(parse_body(b"  \n").unwrap(), None);
        assert_eq!(parse_body(br#"{"a":1}"#).unwrap(), Some(json!({ "a": 1 })));
        assert!(matches!(
            parse_body(b"{oops"),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("x"), json!([0]), json!({ "a": null })] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }
}
