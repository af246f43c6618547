//! Webhook endpoint for the messaging platform

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::service::WebhookService;
use crate::service::webhook::SIGNATURE_HEADER;

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub status: String,
    pub received: bool,
}

/// Receive a messaging platform event
///
/// The body is verified against the `x-kapso-signature` header before it is
/// parsed, so the raw bytes are taken instead of a JSON extractor.
#[utoipa::path(
    post,
    path = "/webhooks/kapso",
    request_body(content = Object, description = "Envelope {event, data, timestamp}"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Malformed payload", body = crate::api::error::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::api::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::api::error::ErrorResponse)
    ),
    tag = "webhooks"
)]
#[post("/webhooks/kapso")]
pub async fn kapso_webhook(
    service: web::Data<WebhookService>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    service.receive(&body, signature).await?;

    Ok(HttpResponse::Ok().json(WebhookAck {
        status: "ok".to_string(),
        received: true,
    }))
}

/// Configure webhook routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(kapso_webhook);
}
