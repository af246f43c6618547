//! Intake operations invoked by the chat flow
//!
//! Each operation reads the session state the flow has accumulated, writes
//! its results back into it and returns an outcome the API layer turns into
//! the reply expected by the flow platform.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{DbError, IntakeStore};
use crate::model::{
    CaseType, Channel, Criticality, Justification, NewAffectedProduct, NewAttachment, NewCase,
    NewClient, NewInteraction, NewMessage, RegistrantType, SessionState,
};
use crate::service::classification::{self, ClassificationInput, ClassificationResult};
use crate::service::validation::{self, ProductFields};

const MIN_DESCRIPTION_LENGTH: usize = 20;
const DEFAULT_UNIT: &str = "unidades";

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    /// Business rejection, reported back to the flow with status 400
    #[error("{message}")]
    Rejected {
        message: String,
        errors: Vec<String>,
    },

    #[error("Criticidad inválida para el tipo de caso")]
    InvalidClassification,
}

impl IntakeError {
    fn rejected(message: impl Into<String>) -> Self {
        IntakeError::Rejected {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    fn from_report(report: &validation::ValidationReport, heading: &str) -> Self {
        IntakeError::Rejected {
            message: report.message(heading),
            errors: report.errors.clone(),
        }
    }

    /// Individual validation errors, empty unless a field check failed
    pub fn errors(&self) -> &[String] {
        match self {
            IntakeError::Rejected { errors, .. } => errors,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOutcome {
    pub client_id: Uuid,
    pub existing: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub case_id: Uuid,
    pub case_number: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub result: ClassificationResult,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub id: Uuid,
    pub message: String,
}

/// Message fields sent next to the session state
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct MessageInput {
    #[serde(rename = "interaccion_id")]
    pub interaction_id: Option<Uuid>,
    #[serde(rename = "mensaje_id_externo")]
    pub external_id: Option<String>,
    #[serde(rename = "es_entrante")]
    pub inbound: Option<bool>,
    #[serde(rename = "remitente_numero")]
    pub sender_number: Option<String>,
    #[serde(rename = "destinatario_numero")]
    pub recipient_number: Option<String>,
    /// text, image, video, audio, document, button_response
    #[serde(rename = "tipo_mensaje")]
    pub message_type: Option<String>,
    #[serde(rename = "contenido")]
    pub content: Option<String>,
    #[serde(rename = "contenido_estructurado")]
    #[schema(value_type = Option<Object>)]
    pub structured_content: Option<Value>,
    #[serde(rename = "entregado")]
    pub delivered: Option<bool>,
    #[serde(rename = "leido")]
    pub read: Option<bool>,
    pub error: Option<bool>,
    #[serde(rename = "error_detalle")]
    pub error_detail: Option<String>,
    #[serde(rename = "timestamp_envio")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(rename = "timestamp_entrega")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(rename = "timestamp_lectura")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Interaction fields sent next to the session state
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct InteractionInput {
    pub session_id: Option<String>,
    pub flow_id: Option<String>,
    #[serde(rename = "tipo_interaccion")]
    pub interaction_type: Option<String>,
    #[serde(rename = "nodo_inicio")]
    pub start_node: Option<String>,
    #[serde(rename = "nodo_fin")]
    pub end_node: Option<String>,
    #[serde(rename = "duracion_segundos")]
    pub duration_seconds: Option<i32>,
    #[serde(rename = "completada")]
    pub completed: Option<bool>,
    #[serde(rename = "error_ocurrido")]
    pub error_occurred: Option<bool>,
    #[serde(rename = "error_detalle")]
    pub error_detail: Option<String>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Service behind the `/functions/*` endpoints
pub struct IntakeService {
    store: Arc<dyn IntakeStore>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn IntakeStore>) -> Self {
        Self { store }
    }

    /// Validate the customer's data, then find or register the client
    pub async fn validate_client(
        &self,
        state: &mut SessionState,
    ) -> Result<ClientOutcome, IntakeError> {
        let report = validation::validate_client_data(state);
        if !report.is_valid {
            tracing::info!(errors = report.errors.len(), "Client data rejected");
            return Err(IntakeError::from_report(&report, "Datos de cliente inválidos:"));
        }

        let raw_tax_id = state.client_tax_id.clone().unwrap_or_default();
        let raw_phone = state.client_phone.clone().unwrap_or_default();
        let tax_id = validation::validate_tax_id(&raw_tax_id)
            .map_err(|e| IntakeError::rejected(e.to_string()))?;
        let phone = validation::validate_phone(&raw_phone)
            .map_err(|e| IntakeError::rejected(e.to_string()))?;

        if let Some(existing) = self.store.find_client_by_tax_id(&tax_id).await? {
            tracing::info!(client_id = %existing.id, "Existing client found");
            state.client_id = Some(existing.id);
            return Ok(ClientOutcome {
                client_id: existing.id,
                existing: true,
                message: "Cliente encontrado en el sistema".to_string(),
            });
        }

        let address = validation::parse_address(state.client_address.as_deref().unwrap_or(""));
        let client = NewClient {
            full_name: validation::normalize_text(state.client_name.as_deref().unwrap_or("")),
            business_name: validation::normalize_text(
                state.client_business_name.as_deref().unwrap_or(""),
            ),
            tax_id,
            street: address.street,
            street_number: Some(address.number),
            locality: address.locality,
            province: address.province,
            phone,
            email: present(state.client_email.as_deref()).map(|e| e.trim().to_string()),
            whatsapp_number: Some(raw_phone),
        };

        let report = validation::validate_new_client(&client);
        if !report.is_valid {
            tracing::info!(errors = report.errors.len(), "Normalized client rejected");
            return Err(IntakeError::from_report(&report, "Error en validación de datos:"));
        }

        let created = self.store.create_client(&client).await?;
        tracing::info!(client_id = %created.id, "Client created");
        state.client_id = Some(created.id);

        Ok(ClientOutcome {
            client_id: created.id,
            existing: false,
            message: "Cliente creado exitosamente".to_string(),
        })
    }

    /// Persist the case with its affected product and attachments
    pub async fn save_case(&self, state: &mut SessionState) -> Result<CaseOutcome, IntakeError> {
        let client_id = state
            .client_id
            .ok_or_else(|| IntakeError::rejected("ID de cliente requerido"))?;
        let description = present(state.incident_description.as_deref())
            .ok_or_else(|| IntakeError::rejected("Descripción del incidente requerida"))?
            .to_string();
        let delivery_note = present(state.delivery_note_number.as_deref())
            .ok_or_else(|| IntakeError::rejected("Número de remito requerido"))?
            .to_string();

        if validation::validate_min_length(&description, MIN_DESCRIPTION_LENGTH).is_err() {
            return Err(IntakeError::rejected(format!(
                "Descripción debe tener al menos {} caracteres",
                MIN_DESCRIPTION_LENGTH
            )));
        }

        let case_type = state.case_type.unwrap_or(CaseType::PendingClassification);
        let criticality = state.criticality.unwrap_or(Criticality::NotApplicable);
        if !classification::validate_consistency(case_type, criticality) {
            return Err(IntakeError::InvalidClassification);
        }

        // Product and attachment rows are checked before anything is written
        let product = self.product_draft(state)?;
        let attachments = state
            .attachments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|a| {
                validation::validate_attachment_url(&a.url)
                    .map(|url| (a.tipo, url))
                    .map_err(|e| IntakeError::rejected(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let new_case = NewCase {
            client_id,
            registered_by_staff_id: state.staff_id,
            registrant_type: state.registrant_type.unwrap_or(RegistrantType::Customer),
            case_type,
            criticality,
            justification: state
                .justification
                .unwrap_or(Justification::PendingInvestigation),
            channel: Channel::WhatsApp,
            incident_description: validation::sanitize(&description),
            incident_location: present(state.incident_location.as_deref()).map(validation::sanitize),
            incident_date: state
                .incident_date
                .as_deref()
                .and_then(validation::parse_flexible_date),
            freeform_notes: present(state.freeform_notes.as_deref()).map(validation::sanitize),
            delivery_note_number: delivery_note,
        };

        let case = self.store.create_case(&new_case).await?;
        tracing::info!(case_number = %case.case_number, case_type = %case_type, "Case created");

        state.case_id = Some(case.id);
        state.case_number = Some(case.case_number.clone());

        if let Some(mut product) = product {
            product.case_id = case.id;
            self.store.create_affected_product(&product).await?;
        }

        let stamp = Utc::now().timestamp_millis();
        for (index, (attachment_type, url)) in attachments.iter().enumerate() {
            self.store
                .create_attachment(&NewAttachment {
                    case_id: case.id,
                    attachment_type: *attachment_type,
                    original_url: Some(url.clone()),
                    file_name: format!("adjunto_{}_{}", stamp, index + 1),
                    processed: false,
                })
                .await?;
        }
        if !attachments.is_empty() {
            tracing::debug!(case_number = %case.case_number, count = attachments.len(), "Attachments stored");
        }

        Ok(CaseOutcome {
            case_id: case.id,
            message: format!("Caso {} creado exitosamente", case.case_number),
            case_number: case.case_number,
        })
    }

    /// Affected product built from the session, when name and lot were collected
    fn product_draft(
        &self,
        state: &SessionState,
    ) -> Result<Option<NewAffectedProduct>, IntakeError> {
        let (Some(name), Some(lot)) = (
            present(state.product_name.as_deref()),
            present(state.product_lot.as_deref()),
        ) else {
            return Ok(None);
        };

        let expiry = state
            .product_expiry
            .as_deref()
            .and_then(validation::parse_flexible_date)
            .unwrap_or_else(Utc::now)
            .date_naive();
        let quantity = state.product_affected_quantity.unwrap_or(1.0);

        let report = validation::validate_product_data(&ProductFields {
            name: Some(name),
            lot: Some(lot.trim()),
            expiry: Some(expiry),
            quantity: Some(quantity),
        });
        if !report.is_valid {
            return Err(IntakeError::from_report(&report, "Datos de producto inválidos:"));
        }

        Ok(Some(NewAffectedProduct {
            case_id: Uuid::nil(),
            product_name: validation::normalize_text(name),
            presentation: state.product_presentation.clone().unwrap_or_default(),
            lot_number: lot.trim().to_string(),
            expiry_date: expiry,
            product_state: state.product_state,
            // validate_quantity bounds this to a whole number up to 1,000,000
            affected_quantity: quantity as i32,
            unit: present(state.product_unit.as_deref())
                .unwrap_or(DEFAULT_UNIT)
                .to_string(),
        }))
    }

    /// Classify the incident and write the result into the session state
    pub fn classify_case(&self, state: &mut SessionState) -> ClassificationOutcome {
        let result = classification::classify(&ClassificationInput::from(&*state));

        state.case_type = Some(result.case_type);
        state.criticality = Some(result.criticality);
        state.justification = Some(result.justification);

        tracing::info!(
            case_type = %result.case_type,
            criticality = %result.criticality,
            sla_hours = classification::sla_hours(result.case_type, result.criticality),
            urgency = classification::urgency_score(&result),
            sentiment = ?classification::sentiment(
                state.incident_description.as_deref().unwrap_or("")
            ),
            "Session classified"
        );

        ClassificationOutcome {
            message: classification::summarize(&result),
            result,
        }
    }

    pub async fn save_message(
        &self,
        state: &SessionState,
        input: MessageInput,
    ) -> Result<RecordOutcome, IntakeError> {
        let case_id = state
            .case_id
            .ok_or_else(|| IntakeError::rejected("ID de caso requerido para registrar mensaje"))?;
        let inbound = input
            .inbound
            .ok_or_else(|| IntakeError::rejected("Campo es_entrante requerido"))?;
        let message_type = input
            .message_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| IntakeError::rejected("Tipo de mensaje requerido"))?;

        let message = NewMessage {
            case_id,
            interaction_id: input.interaction_id,
            external_id: input.external_id,
            inbound,
            sender_number: input.sender_number,
            recipient_number: input.recipient_number,
            message_type,
            content: input.content,
            structured_content: input.structured_content,
            delivered: input.delivered.unwrap_or(false),
            read: input.read.unwrap_or(false),
            error: input.error.unwrap_or(false),
            error_detail: input.error_detail,
            sent_at: input.sent_at,
            delivered_at: input.delivered_at,
            read_at: input.read_at,
        };

        let created = self.store.create_message(&message).await?;
        tracing::info!(
            message_id = %created.id,
            case_id = %case_id,
            message_type = %created.data.message_type,
            inbound,
            "Message stored"
        );

        Ok(RecordOutcome {
            id: created.id,
            message: format!("Mensaje {} registrado exitosamente", created.data.message_type),
        })
    }

    pub async fn save_interaction(
        &self,
        state: &SessionState,
        input: InteractionInput,
    ) -> Result<RecordOutcome, IntakeError> {
        let case_id = state.case_id.ok_or_else(|| {
            IntakeError::rejected("ID de caso requerido para registrar interacción")
        })?;
        let interaction_type = input
            .interaction_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| IntakeError::rejected("Tipo de interacción requerido"))?;

        let interaction = NewInteraction {
            case_id,
            session_id: input.session_id,
            flow_id: input.flow_id,
            interaction_type,
            start_node: input.start_node,
            end_node: input.end_node,
            duration_seconds: input.duration_seconds,
            completed: input.completed.unwrap_or(false),
            error_occurred: input.error_occurred.unwrap_or(false),
            error_detail: input.error_detail,
        };

        let created = self.store.create_interaction(&interaction).await?;
        tracing::info!(
            interaction_id = %created.id,
            case_id = %case_id,
            completed = created.data.completed,
            "Interaction stored"
        );

        Ok(RecordOutcome {
            id: created.id,
            message: format!(
                "Interacción {} registrada exitosamente",
                created.data.interaction_type
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryStore;
    use crate::model::{AttachmentType, CaseStatus, ProductState, SessionAttachment};
    use serde_json::json;

    fn service() -> (Arc<InMemoryStore>, IntakeService) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), IntakeService::new(store))
    }

    fn client_state() -> SessionState {
        SessionState::from_value(json!({
            "clienteNombre": "  Juan   Pérez ",
            "clienteRazonSocial": "Granja La Esperanza SA",
            "clienteCUIT": "20123456786",
            "clienteTelefono": "11 2345-6789",
            "clienteDireccion": "Av. San Martín, 1234, Rosario, Santa Fe",
            "clienteEmail": ""
        }))
        .unwrap()
    }

    fn case_state(client_id: Uuid) -> SessionState {
        let mut state = SessionState::default();
        state.client_id = Some(client_id);
        state.incident_description =
            Some("El frasco llegó con la tapa rota y el líquido derramado".to_string());
        state.delivery_note_number = Some("R-0001-00012345".to_string());
        state
    }

    #[tokio::test]
    async fn test_validate_client_creates_new_client() {
        let (store, service) = service();
        let mut state = client_state();

        let outcome = service.validate_client(&mut state).await.unwrap();

        assert!(!outcome.existing);
        assert_eq!(outcome.message, "Cliente creado exitosamente");
        assert_eq!(state.client_id, Some(outcome.client_id));

        let clients = store.clients();
        assert_eq!(clients.len(), 1);
        let client = &clients[0].data;
        assert_eq!(client.full_name, "Juan Pérez");
        assert_eq!(client.tax_id, "20-12345678-6");
        assert_eq!(client.phone, "11-2345-6789");
        assert_eq!(client.street, "Av. San Martín");
        assert_eq!(client.street_number.as_deref(), Some("1234"));
        assert_eq!(client.locality, "Rosario");
        assert_eq!(client.province, "Santa Fe");
        assert_eq!(client.email, None);
        assert_eq!(client.whatsapp_number.as_deref(), Some("11 2345-6789"));
    }

    #[tokio::test]
    async fn test_validate_client_finds_existing_client() {
        let (store, service) = service();
        let first = service.validate_client(&mut client_state()).await.unwrap();

        let mut state = client_state();
        state.client_tax_id = Some("20-12345678-6".to_string());
        let second = service.validate_client(&mut state).await.unwrap();

        assert!(second.existing);
        assert_eq!(second.client_id, first.client_id);
        assert_eq!(second.message, "Cliente encontrado en el sistema");
        assert_eq!(store.clients().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_client_rejects_invalid_data() {
        let (store, service) = service();
        let mut state = client_state();
        state.client_tax_id = Some("20-12345678-0".to_string());
        state.client_name = Some("J".to_string());

        let err = service.validate_client(&mut state).await.unwrap_err();

        assert_eq!(err.errors().len(), 2);
        assert!(err.to_string().starts_with("Datos de cliente inválidos:\n"));
        assert!(state.client_id.is_none());
        assert!(store.clients().is_empty());
    }

    #[tokio::test]
    async fn test_validate_client_rejects_short_address() {
        let (_, service) = service();
        let mut state = client_state();
        state.client_address = Some("Ru".to_string());

        let err = service.validate_client(&mut state).await.unwrap_err();

        assert!(err.to_string().starts_with("Error en validación de datos:\n"));
        assert!(err.errors().contains(&"Dirección requerida".to_string()));
    }

    #[tokio::test]
    async fn test_validate_client_propagates_store_failure() {
        let (store, service) = service();
        store.set_unavailable(true);

        let err = service.validate_client(&mut client_state()).await.unwrap_err();
        assert!(matches!(err, IntakeError::DbError(_)));
    }

    #[tokio::test]
    async fn test_save_case_with_product_and_attachments() {
        let (store, service) = service();
        let mut state = case_state(Uuid::new_v4());
        state.case_type = Some(CaseType::Complaint);
        state.criticality = Some(Criticality::Minor);
        state.product_name = Some("Vetancilina   Plus".to_string());
        state.product_lot = Some("L2024A".to_string());
        state.product_expiry = Some("31/12/2027".to_string());
        state.product_state = Some(ProductState::ContainerBroken);
        state.attachments = Some(vec![
            SessionAttachment {
                tipo: AttachmentType::Photo,
                url: "https://cdn.example.com/1.jpg".to_string(),
            },
            SessionAttachment {
                tipo: AttachmentType::Video,
                url: "https://cdn.example.com/2.mp4".to_string(),
            },
        ]);

        let outcome = service.save_case(&mut state).await.unwrap();

        assert!(outcome.case_number.starts_with("CASO-"));
        assert!(outcome.case_number.ends_with("-000001"));
        assert_eq!(
            outcome.message,
            format!("Caso {} creado exitosamente", outcome.case_number)
        );
        assert_eq!(state.case_id, Some(outcome.case_id));
        assert_eq!(state.case_number.as_deref(), Some(outcome.case_number.as_str()));

        let case = &store.cases()[0];
        assert_eq!(case.status, CaseStatus::New);
        assert_eq!(case.data.channel, Channel::WhatsApp);
        assert_eq!(case.data.registrant_type, RegistrantType::Customer);
        assert_eq!(case.data.justification, Justification::PendingInvestigation);

        let products = store.products();
        assert_eq!(products.len(), 1);
        let product = &products[0].data;
        assert_eq!(product.case_id, outcome.case_id);
        assert_eq!(product.product_name, "Vetancilina Plus");
        assert_eq!(product.affected_quantity, 1);
        assert_eq!(product.unit, "unidades");
        assert_eq!(product.presentation, "");
        assert_eq!(product.expiry_date.to_string(), "2027-12-31");

        let attachments = store.attachments();
        assert_eq!(attachments.len(), 2);
        assert!(attachments.iter().all(|a| !a.data.processed));
        assert_ne!(attachments[0].data.file_name, attachments[1].data.file_name);
    }

    #[tokio::test]
    async fn test_save_case_defaults_to_pending_classification() {
        let (store, service) = service();
        let mut state = case_state(Uuid::new_v4());

        service.save_case(&mut state).await.unwrap();

        let case = &store.cases()[0];
        assert_eq!(case.data.case_type, CaseType::PendingClassification);
        assert_eq!(case.data.criticality, Criticality::NotApplicable);
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_save_case_required_fields() {
        let (store, service) = service();

        let mut state = case_state(Uuid::new_v4());
        state.client_id = None;
        let err = service.save_case(&mut state).await.unwrap_err();
        assert_eq!(err.to_string(), "ID de cliente requerido");

        let mut state = case_state(Uuid::new_v4());
        state.incident_description = Some("   ".to_string());
        let err = service.save_case(&mut state).await.unwrap_err();
        assert_eq!(err.to_string(), "Descripción del incidente requerida");

        let mut state = case_state(Uuid::new_v4());
        state.incident_description = Some("tapa rota".to_string());
        let err = service.save_case(&mut state).await.unwrap_err();
        assert_eq!(err.to_string(), "Descripción debe tener al menos 20 caracteres");

        let mut state = case_state(Uuid::new_v4());
        state.delivery_note_number = None;
        let err = service.save_case(&mut state).await.unwrap_err();
        assert_eq!(err.to_string(), "Número de remito requerido");

        assert!(store.cases().is_empty());
    }

    #[tokio::test]
    async fn test_save_case_rejects_invalid_attachment_url() {
        let (store, service) = service();
        let mut state = case_state(Uuid::new_v4());
        state.attachments = Some(vec![SessionAttachment {
            tipo: AttachmentType::Photo,
            url: "foto.jpg".to_string(),
        }]);

        let err = service.save_case(&mut state).await.unwrap_err();

        assert_eq!(err.to_string(), "URL de adjunto inválida: foto.jpg");
        assert!(store.cases().is_empty());
    }

    #[tokio::test]
    async fn test_save_case_rejects_inconsistent_classification() {
        let (store, service) = service();
        let mut state = case_state(Uuid::new_v4());
        state.case_type = Some(CaseType::Comment);
        state.criticality = Some(Criticality::Major);

        let err = service.save_case(&mut state).await.unwrap_err();

        assert!(matches!(err, IntakeError::InvalidClassification));
        assert!(store.cases().is_empty());
    }

    #[tokio::test]
    async fn test_save_case_rejects_invalid_product_before_writing() {
        let (store, service) = service();
        let mut state = case_state(Uuid::new_v4());
        state.product_name = Some("Vetancilina".to_string());
        state.product_lot = Some("L-1".to_string());
        state.product_affected_quantity = Some(2.5);

        let err = service.save_case(&mut state).await.unwrap_err();

        assert!(err.to_string().starts_with("Datos de producto inválidos:\n"));
        assert_eq!(err.errors().len(), 2);
        assert!(store.cases().is_empty());
        assert!(state.case_id.is_none());
    }

    #[test]
    fn test_classify_case_writes_session_state() {
        let (_, service) = service();
        let mut state = SessionState::default();
        state.incident_description = Some("Varios animales murieron tras la aplicación".to_string());

        let outcome = service.classify_case(&mut state);

        assert_eq!(outcome.result.case_type, CaseType::Complaint);
        assert_eq!(state.case_type, Some(CaseType::Complaint));
        assert_eq!(state.criticality, Some(Criticality::Critical));
        assert_eq!(state.justification, Some(Justification::PendingInvestigation));
        assert_eq!(outcome.message, classification::summarize(&outcome.result));
    }

    #[tokio::test]
    async fn test_save_message() {
        let (store, service) = service();
        let mut state = SessionState::default();
        state.case_id = Some(Uuid::new_v4());
        let input: MessageInput = serde_json::from_value(json!({
            "es_entrante": true,
            "tipo_mensaje": "text",
            "contenido": "Hola, tengo un problema",
            "mensaje_id_externo": "wamid.123"
        }))
        .unwrap();

        let outcome = service.save_message(&state, input).await.unwrap();

        assert_eq!(outcome.message, "Mensaje text registrado exitosamente");
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, outcome.id);
        assert!(messages[0].data.inbound);
        assert!(!messages[0].data.delivered);
        assert!(!messages[0].data.read);
        assert!(!messages[0].data.error);
    }

    #[tokio::test]
    async fn test_save_message_required_fields() {
        let (_, service) = service();
        let input = MessageInput {
            inbound: Some(false),
            message_type: Some("text".to_string()),
            ..Default::default()
        };

        let err = service
            .save_message(&SessionState::default(), input.clone())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ID de caso requerido para registrar mensaje");

        let mut state = SessionState::default();
        state.case_id = Some(Uuid::new_v4());

        let missing_direction = MessageInput {
            inbound: None,
            ..input.clone()
        };
        let err = service.save_message(&state, missing_direction).await.unwrap_err();
        assert_eq!(err.to_string(), "Campo es_entrante requerido");

        let missing_type = MessageInput {
            message_type: None,
            ..input
        };
        let err = service.save_message(&state, missing_type).await.unwrap_err();
        assert_eq!(err.to_string(), "Tipo de mensaje requerido");
    }

    #[tokio::test]
    async fn test_save_interaction() {
        let (store, service) = service();
        let mut state = SessionState::default();
        state.case_id = Some(Uuid::new_v4());
        let input = InteractionInput {
            interaction_type: Some("identificacion".to_string()),
            duration_seconds: Some(95),
            ..Default::default()
        };

        let outcome = service.save_interaction(&state, input).await.unwrap();

        assert_eq!(outcome.message, "Interacción identificacion registrada exitosamente");
        let interactions = store.interactions();
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].data.duration_seconds, Some(95));
        assert!(!interactions[0].data.completed);
        assert!(!interactions[0].data.error_occurred);
    }

    #[tokio::test]
    async fn test_save_interaction_required_fields() {
        let (_, service) = service();

        let err = service
            .save_interaction(&SessionState::default(), InteractionInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ID de caso requerido para registrar interacción");

        let mut state = SessionState::default();
        state.case_id = Some(Uuid::new_v4());
        let err = service
            .save_interaction(&state, InteractionInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tipo de interacción requerido");
    }
}
