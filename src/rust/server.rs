use actix_web::http::{header, Method, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError};
use log::{info, warn};
use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::resources::ResourceProvider;

/// Failures a request can end in, each with a fixed status code.
///
/// | kind               | status | body               |
/// |--------------------|--------|--------------------|
/// | `MethodNotAllowed` | 405    | `{error}`          |
/// | `Validation`       | 400    | `{error}`          |
/// | `PayloadTooLarge`  | 413    | `{error}`          |
/// | `ResourceLoad`     | 500    | `{error, details}` |
/// | `Inference`        | 500    | `{error, details}` |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Validation(String),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Classifier unavailable")]
    ResourceLoad(String),
    #[error("Prediction failed")]
    Inference(String),
}

impl ServiceError {
    /// Short diagnostic sent along with 500 responses.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::ResourceLoad(details) | Self::Inference(details) => Some(details),
            Self::MethodNotAllowed | Self::Validation(_) | Self::PayloadTooLarge => None,
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ResourceLoad(_) | Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Self::MethodNotAllowed = self {
            response.insert_header((header::ALLOW, "POST"));
        }
        let body = match self.details() {
            Some(details) => json!({ "error": self.to_string(), "details": details }),
            None => json!({ "error": self.to_string() }),
        };
        response.json(body)
    }
}

/// Body size limit for the classify routes, registered as app data.
pub fn payload_config(max_payload_size: usize) -> web::PayloadConfig {
    web::PayloadConfig::default().limit(max_payload_size)
}

/// Maps a failed body read onto the status table instead of actix's plain-text reply.
fn read_error(req: &HttpRequest, err: actix_web::Error) -> ServiceError {
    if err.as_response_error().status_code() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Rejecting {}: {}", req.path(), err);
        return ServiceError::PayloadTooLarge;
    }
    ServiceError::Validation(format!("Failed to read request body: {}", err))
}

/// Pulls the `text` field out of a JSON request body.
fn parse_text(body: &[u8]) -> Result<String, ServiceError> {
    let request: Value = serde_json::from_slice(body)
        .map_err(|_| ServiceError::Validation("Request body must be valid JSON".into()))?;
    match request.get("text") {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(ServiceError::Validation("Text is required".into())),
    }
}

/// `POST {"text": ...}` → `{"label": ..., "scores": {...}}`.
///
/// Method and body are checked before resources are touched.
pub async fn classify(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    provider: web::Data<ResourceProvider>,
) -> Result<HttpResponse, ServiceError> {
    if *req.method() != Method::POST {
        return Err(ServiceError::MethodNotAllowed);
    }
    let body = body.map_err(|e| read_error(&req, e))?;
    let text = parse_text(&body)?;

    let classifier = provider.get().await.map_err(|e| {
        warn!("Rejecting {}: {}", req.path(), e);
        ServiceError::ResourceLoad(e.to_string())
    })?;

    let result = web::block(move || classifier.predict(&text))
        .await
        .map_err(|e| ServiceError::Inference(e.to_string()))?
        .map_err(|e| {
            warn!("Prediction error: {}", e);
            ServiceError::Inference(e.to_string())
        })?;

    info!("Predicted '{}' ({:.3})", result.label(), result.confidence());
    Ok(HttpResponse::Ok().json(result))
}

#[get("/health")]
pub async fn health(provider: web::Data<ResourceProvider>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "ready": provider.is_loaded() }))
}

/// Registers every route. `/api/chat` is kept as an alias of `/api/classify`.
///
/// The body limit comes from a [`payload_config`] registered on the app; without
/// one actix falls back to 256 KiB.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .route("/api/classify", web::route().to(classify))
        .route("/api/chat", web::route().to(classify));
}

pub async fn startup(config: ServerConfig, provider: ResourceProvider) -> std::io::Result<()> {
    let provider = web::Data::new(provider);

    let max_payload_size = config.max_payload_size;

    info!("Starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(provider.clone())
            .app_data(payload_config(max_payload_size))
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text(br#"{"text": "hello"}"#).unwrap(), "hello");
        assert_eq!(parse_text(br#"{"text": ""}"#).unwrap(), "");
        let bodies: [&[u8]; 6] = [b"{}", br#"{"text": 3}"#, br#"{"text": null}"#, b"[]", b"", b"text"];
        for body in bodies {
            assert!(matches!(parse_text(body), Err(ServiceError::Validation(_))));
        }
    }

    #[test]
    fn test_status_table() {
        assert_eq!(ServiceError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ServiceError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ServiceError::PayloadTooLarge.details(), None);
        assert_eq!(
            ServiceError::ResourceLoad("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Inference("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ServiceError::Inference("boom".into()).details(), Some("boom"));
        assert_eq!(ServiceError::Validation("x".into()).details(), None);
    }
}
