//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::{cases, functions, health, webhooks};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Complaint Intake API",
        description = "Chat-flow functions, case management and messaging webhooks for customer complaint intake"
    ),
    paths(
        functions::validate_client,
        functions::save_case,
        functions::classify_case,
        functions::save_message,
        functions::save_interaction,
        cases::list_cases,
        cases::get_case,
        cases::reclassify_case,
        cases::change_status,
        cases::statistics,
        webhooks::kapso_webhook,
        health::liveness,
        health::readiness,
    ),
    components(schemas(
        crate::model::SessionState,
        crate::model::SessionAttachment,
        crate::model::Case,
        crate::model::CaseDetail,
        crate::model::CaseStatusUpdate,
        crate::db::models::PaginatedCases,
        crate::db::models::Pagination,
        crate::service::cases::ReclassifyRequest,
        crate::service::cases::CaseStatistics,
        crate::service::intake::MessageInput,
        crate::service::intake::InteractionInput,
        functions::ValidateClientResponse,
        functions::SaveCaseResponse,
        functions::ClassifyCaseResponse,
        functions::SaveRecordResponse,
        cases::CaseUpdateResponse,
        webhooks::WebhookAck,
        crate::api::error::ErrorResponse,
    )),
    tags(
        (name = "functions", description = "Endpoints called by the chat flow"),
        (name = "cases", description = "Case review and statistics"),
        (name = "webhooks", description = "Messaging platform events"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for path in [
            "/functions/validar-cliente",
            "/functions/guardar-caso",
            "/functions/clasificar-caso",
            "/functions/guardar-mensaje",
            "/functions/guardar-interaccion",
            "/api/casos",
            "/api/casos/{numero_caso}",
            "/api/casos/{numero_caso}/clasificar",
            "/api/casos/{numero_caso}/estado",
            "/api/estadisticas",
            "/webhooks/kapso",
            "/health",
            "/health/ready",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == path), "missing {path}");
        }
        assert!(doc.to_yaml().is_ok());
    }
}
