pub mod cases;
pub mod error;
pub mod functions;
pub mod health;
pub mod openapi;
pub mod webhooks;

use actix_web::{HttpResponse, web};
use serde_json::json;

/// Reply for routes no handler matched
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Endpoint no encontrado" }))
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(functions::configure)
        .configure(cases::configure)
        .configure(webhooks::configure)
        .configure(openapi::configure);
}
