//! REST API endpoints for reviewers working on cases

use actix_web::{HttpResponse, get, put, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::db::models::CaseListQuery;
use crate::model::{Case, CaseStatusUpdate};
use crate::service::CaseService;
use crate::service::cases::{ReclassifyRequest, StatisticsQuery};

/// Reply of the case update endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct CaseUpdateResponse {
    pub status: String,
    pub caso: Case,
}

impl CaseUpdateResponse {
    fn success(caso: Case) -> Self {
        Self {
            status: "success".to_string(),
            caso,
        }
    }
}

/// List cases with filters, newest first
#[utoipa::path(
    get,
    path = "/api/casos",
    params(CaseListQuery),
    responses(
        (status = 200, description = "Cases retrieved successfully", body = crate::db::models::PaginatedCases),
        (status = 400, description = "Invalid filter", body = crate::api::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::api::error::ErrorResponse)
    ),
    tag = "cases"
)]
#[get("/api/casos")]
pub async fn list_cases(
    service: web::Data<CaseService>,
    query: web::Query<CaseListQuery>,
) -> Result<HttpResponse, ApiError> {
    let cases = service.list(&query).await?;
    Ok(HttpResponse::Ok().json(cases))
}

/// Case with client, products, attachments, conversation and classification history
#[utoipa::path(
    get,
    path = "/api/casos/{numero_caso}",
    params(
        ("numero_caso" = String, Path, description = "Case number, e.g. CASO-2026-000042")
    ),
    responses(
        (status = 200, description = "Case retrieved successfully", body = crate::model::CaseDetail),
        (status = 404, description = "Case not found", body = crate::api::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::api::error::ErrorResponse)
    ),
    tag = "cases"
)]
#[get("/api/casos/{numero_caso}")]
pub async fn get_case(
    service: web::Data<CaseService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let detail = service.detail(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "caso": detail })))
}

/// Manually reclassify a case
#[utoipa::path(
    put,
    path = "/api/casos/{numero_caso}/clasificar",
    params(
        ("numero_caso" = String, Path, description = "Case number")
    ),
    request_body = ReclassifyRequest,
    responses(
        (status = 200, description = "Case reclassified", body = CaseUpdateResponse),
        (status = 400, description = "Invalid classification", body = crate::api::error::ErrorResponse),
        (status = 404, description = "Case not found", body = crate::api::error::ErrorResponse)
    ),
    tag = "cases"
)]
#[put("/api/casos/{numero_caso}/clasificar")]
pub async fn reclassify_case(
    service: web::Data<CaseService>,
    path: web::Path<String>,
    body: web::Json<ReclassifyRequest>,
) -> Result<HttpResponse, ApiError> {
    let case = service
        .reclassify(&path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CaseUpdateResponse::success(case)))
}

/// Change the status of a case
#[utoipa::path(
    put,
    path = "/api/casos/{numero_caso}/estado",
    params(
        ("numero_caso" = String, Path, description = "Case number")
    ),
    request_body = CaseStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = CaseUpdateResponse),
        (status = 404, description = "Case not found", body = crate::api::error::ErrorResponse)
    ),
    tag = "cases"
)]
#[put("/api/casos/{numero_caso}/estado")]
pub async fn change_status(
    service: web::Data<CaseService>,
    path: web::Path<String>,
    body: web::Json<CaseStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let case = service
        .change_status(&path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CaseUpdateResponse::success(case)))
}

/// Case counts by type, criticality and status
#[utoipa::path(
    get,
    path = "/api/estadisticas",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Statistics computed", body = crate::service::cases::CaseStatistics),
        (status = 500, description = "Internal server error", body = crate::api::error::ErrorResponse)
    ),
    tag = "cases"
)]
#[get("/api/estadisticas")]
pub async fn statistics(
    service: web::Data<CaseService>,
    query: web::Query<StatisticsQuery>,
) -> Result<HttpResponse, ApiError> {
    let stats = service.statistics(&query).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Configure case routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_cases)
        .service(statistics)
        .service(get_case)
        .service(reclassify_case)
        .service(change_status);
}
