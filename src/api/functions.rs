//! Endpoints called by the chat flow's function nodes
//!
//! The flow platform posts the session state either wrapped in
//! `sessionState` or as the body itself, and reads `success`, `mensaje` and
//! the updated `sessionState` from the reply.

use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, post, web};
use serde::Serialize;
use serde_json::{Map, Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::{CaseType, Criticality, Justification, SessionState};
use crate::service::IntakeService;
use crate::service::intake::{InteractionInput, IntakeError, MessageInput};

const INTERNAL_ERROR: &str = "Error interno del servidor";
const CLASSIFICATION_FALLBACK: &str =
    "No se pudo clasificar automáticamente. El caso será revisado manualmente.";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateClientResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<Uuid>,
    pub cliente_existente: bool,
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errores: Option<Vec<String>>,
    #[schema(value_type = Object)]
    pub session_state: Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caso_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_caso: Option<String>,
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errores: Option<Vec<String>>,
    #[schema(value_type = Object)]
    pub session_state: Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyCaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_caso: Option<CaseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticidad: Option<Criticality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justificacion: Option<Justification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confianza: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razonamiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords_encontrados: Option<Vec<String>>,
    pub mensaje: String,
    #[schema(value_type = Object)]
    pub session_state: Value,
}

/// Reply for stored messages (`mensajeId`) and interactions (`interaccionId`)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecordResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensaje_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaccion_id: Option<Uuid>,
    pub mensaje: String,
    #[schema(value_type = Object)]
    pub session_state: Value,
}

fn missing_data(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "success": false, "mensaje": message }))
}

fn internal_error(err: &IntakeError) -> HttpResponse {
    tracing::error!(error = %err, "Function endpoint failed");
    HttpResponse::InternalServerError().json(json!({
        "success": false,
        "mensaje": INTERNAL_ERROR,
    }))
}

fn invalid_session(err: &serde_json::Error, raw: Value) -> HttpResponse {
    tracing::info!(error = %err, "Session state rejected");
    HttpResponse::BadRequest().json(json!({
        "success": false,
        "mensaje": format!("Datos de sesión inválidos: {}", err),
        "sessionState": raw,
    }))
}

fn status_for(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// Session state carried by the body: a `sessionState` object, or the body itself
fn session_from_body(body: Option<&Value>) -> Option<Value> {
    let Some(Value::Object(map)) = body else {
        return None;
    };
    match map.get("sessionState") {
        Some(state @ Value::Object(_)) => Some(state.clone()),
        _ if !map.is_empty() => Some(Value::Object(map.clone())),
        _ => None,
    }
}

/// Split a message or interaction body into session state and record fields
fn split_record_body(body: Option<&Value>) -> Option<(Value, Value)> {
    let Some(Value::Object(map)) = body else {
        return None;
    };
    if map.is_empty() {
        return None;
    }

    let mut fields = map.clone();
    match fields.remove("sessionState") {
        Some(state @ Value::Object(_)) => Some((state, Value::Object(fields))),
        _ => {
            let mut state = Map::new();
            if let Some(case_id) = fields.remove("casoId") {
                state.insert("casoId".to_string(), case_id);
            }
            Some((Value::Object(state), Value::Object(fields)))
        }
    }
}

fn query_as_state(query: BTreeMap<String, String>) -> Option<Value> {
    if query.is_empty() {
        return None;
    }
    Some(Value::Object(
        query
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    ))
}

/// Validate the customer and find or register the client
#[utoipa::path(
    post,
    path = "/functions/validar-cliente",
    request_body = SessionState,
    responses(
        (status = 200, description = "Client found or created", body = ValidateClientResponse),
        (status = 400, description = "Missing or invalid client data", body = ValidateClientResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "functions"
)]
#[post("/functions/validar-cliente")]
pub async fn validate_client(
    service: web::Data<IntakeService>,
    body: Option<web::Json<Value>>,
    query: web::Query<BTreeMap<String, String>>,
) -> HttpResponse {
    let raw = match session_from_body(body.as_deref())
        .or_else(|| query_as_state(query.into_inner()))
    {
        Some(raw) => raw,
        None => {
            return missing_data(
                "No se encontraron datos. Envía sessionState en el body o como query params",
            );
        }
    };
    let mut state = match SessionState::from_value(raw.clone()) {
        Ok(state) => state,
        Err(e) => return invalid_session(&e, raw),
    };

    let response = match service.validate_client(&mut state).await {
        Ok(outcome) => ValidateClientResponse {
            success: true,
            cliente_id: Some(outcome.client_id),
            cliente_existente: outcome.existing,
            mensaje: outcome.message,
            errores: None,
            session_state: state.to_value(),
        },
        Err(e @ IntakeError::DbError(_)) => return internal_error(&e),
        Err(e) => ValidateClientResponse {
            success: false,
            cliente_id: None,
            cliente_existente: false,
            errores: Some(e.errors().to_vec()),
            mensaje: e.to_string(),
            session_state: state.to_value(),
        },
    };

    HttpResponse::build(status_for(response.success)).json(response)
}

/// Persist the case collected by the flow
#[utoipa::path(
    post,
    path = "/functions/guardar-caso",
    request_body = SessionState,
    responses(
        (status = 200, description = "Case created", body = SaveCaseResponse),
        (status = 400, description = "Missing or invalid case data", body = SaveCaseResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "functions"
)]
#[post("/functions/guardar-caso")]
pub async fn save_case(
    service: web::Data<IntakeService>,
    body: Option<web::Json<Value>>,
) -> HttpResponse {
    let raw = match body.as_deref().and_then(|b| b.get("sessionState")) {
        Some(state @ Value::Object(_)) => state.clone(),
        _ => return missing_data("sessionState requerido"),
    };
    let mut state = match SessionState::from_value(raw.clone()) {
        Ok(state) => state,
        Err(e) => return invalid_session(&e, raw),
    };

    let response = match service.save_case(&mut state).await {
        Ok(outcome) => SaveCaseResponse {
            success: true,
            caso_id: Some(outcome.case_id),
            numero_caso: Some(outcome.case_number),
            mensaje: outcome.message,
            errores: None,
            session_state: state.to_value(),
        },
        Err(e @ IntakeError::DbError(_)) => return internal_error(&e),
        Err(e) => SaveCaseResponse {
            success: false,
            caso_id: None,
            numero_caso: None,
            errores: Some(e.errors().to_vec()).filter(|errors| !errors.is_empty()),
            mensaje: e.to_string(),
            session_state: state.to_value(),
        },
    };

    HttpResponse::build(status_for(response.success)).json(response)
}

/// Classify the case from the incident description and product state
#[utoipa::path(
    post,
    path = "/functions/clasificar-caso",
    request_body = SessionState,
    responses(
        (status = 200, description = "Case classified", body = ClassifyCaseResponse),
        (status = 400, description = "Session state missing or not classifiable", body = ClassifyCaseResponse)
    ),
    tag = "functions"
)]
#[post("/functions/clasificar-caso")]
pub async fn classify_case(
    service: web::Data<IntakeService>,
    body: Option<web::Json<Value>>,
) -> HttpResponse {
    let Some(mut raw) = session_from_body(body.as_deref()) else {
        return missing_data("sessionState requerido");
    };

    let mut state = match SessionState::from_value(raw.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "Session state not classifiable, leaving case for manual review");
            if let Value::Object(map) = &mut raw {
                map.insert("tipoCaso".to_string(), Value::Null);
                map.insert("criticidad".to_string(), Value::Null);
                map.insert(
                    "justificacion".to_string(),
                    json!(Justification::PendingInvestigation),
                );
            }
            return HttpResponse::BadRequest().json(ClassifyCaseResponse {
                success: false,
                tipo_caso: None,
                criticidad: None,
                justificacion: None,
                confianza: None,
                razonamiento: None,
                keywords_encontrados: None,
                mensaje: CLASSIFICATION_FALLBACK.to_string(),
                session_state: raw,
            });
        }
    };

    let outcome = service.classify_case(&mut state);
    let result = outcome.result;

    HttpResponse::Ok().json(ClassifyCaseResponse {
        success: true,
        tipo_caso: Some(result.case_type),
        criticidad: Some(result.criticality),
        justificacion: Some(result.justification),
        confianza: Some(result.confidence),
        razonamiento: Some(result.rationale),
        keywords_encontrados: Some(result.matched_keywords),
        mensaje: outcome.message,
        session_state: state.to_value(),
    })
}

/// Record one chat message of the conversation
#[utoipa::path(
    post,
    path = "/functions/guardar-mensaje",
    request_body = MessageInput,
    responses(
        (status = 200, description = "Message stored", body = SaveRecordResponse),
        (status = 400, description = "Missing or invalid message data", body = SaveRecordResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "functions"
)]
#[post("/functions/guardar-mensaje")]
pub async fn save_message(
    service: web::Data<IntakeService>,
    body: Option<web::Json<Value>>,
) -> HttpResponse {
    let Some((raw, fields)) = split_record_body(body.as_deref()) else {
        return missing_data("Datos requeridos");
    };
    let state = match SessionState::from_value(raw.clone()) {
        Ok(state) => state,
        Err(e) => return invalid_session(&e, raw),
    };
    let input: MessageInput = match serde_json::from_value(fields) {
        Ok(input) => input,
        Err(e) => return invalid_record("mensaje", &e, &state),
    };

    let response = match service.save_message(&state, input).await {
        Ok(outcome) => SaveRecordResponse {
            success: true,
            mensaje_id: Some(outcome.id),
            interaccion_id: None,
            mensaje: outcome.message,
            session_state: state.to_value(),
        },
        Err(e @ IntakeError::DbError(_)) => return internal_error(&e),
        Err(e) => rejected_record(&e, &state),
    };

    HttpResponse::build(status_for(response.success)).json(response)
}

/// Record one pass through a segment of the chat flow
#[utoipa::path(
    post,
    path = "/functions/guardar-interaccion",
    request_body = InteractionInput,
    responses(
        (status = 200, description = "Interaction stored", body = SaveRecordResponse),
        (status = 400, description = "Missing or invalid interaction data", body = SaveRecordResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "functions"
)]
#[post("/functions/guardar-interaccion")]
pub async fn save_interaction(
    service: web::Data<IntakeService>,
    body: Option<web::Json<Value>>,
) -> HttpResponse {
    let Some((raw, fields)) = split_record_body(body.as_deref()) else {
        return missing_data("Datos requeridos");
    };
    let state = match SessionState::from_value(raw.clone()) {
        Ok(state) => state,
        Err(e) => return invalid_session(&e, raw),
    };
    let input: InteractionInput = match serde_json::from_value(fields) {
        Ok(input) => input,
        Err(e) => return invalid_record("interacción", &e, &state),
    };

    let response = match service.save_interaction(&state, input).await {
        Ok(outcome) => SaveRecordResponse {
            success: true,
            mensaje_id: None,
            interaccion_id: Some(outcome.id),
            mensaje: outcome.message,
            session_state: state.to_value(),
        },
        Err(e @ IntakeError::DbError(_)) => return internal_error(&e),
        Err(e) => rejected_record(&e, &state),
    };

    HttpResponse::build(status_for(response.success)).json(response)
}

fn rejected_record(err: &IntakeError, state: &SessionState) -> SaveRecordResponse {
    SaveRecordResponse {
        success: false,
        mensaje_id: None,
        interaccion_id: None,
        mensaje: err.to_string(),
        session_state: state.to_value(),
    }
}

fn invalid_record(kind: &str, err: &serde_json::Error, state: &SessionState) -> HttpResponse {
    tracing::info!(error = %err, kind, "Record fields rejected");
    HttpResponse::BadRequest().json(SaveRecordResponse {
        success: false,
        mensaje_id: None,
        interaccion_id: None,
        mensaje: format!("Datos de {} inválidos: {}", kind, err),
        session_state: state.to_value(),
    })
}

/// Configure function routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(validate_client)
        .service(save_case)
        .service(classify_case)
        .service(save_message)
        .service(save_interaction);
}
