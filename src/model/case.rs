//! Persisted intake records: clients, cases and everything attached to a case
//!
//! JSON keys follow the column names of the store so API consumers see the
//! same vocabulary as the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{
    AttachmentType, CaseStatus, CaseType, Channel, Criticality, Justification, ProductState,
    RegistrantType,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Client {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: NewClient,
    #[serde(rename = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client fields as collected and normalized by the intake flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewClient {
    #[serde(rename = "nombre_apellido")]
    pub full_name: String,
    #[serde(rename = "razon_social")]
    pub business_name: String,
    /// Normalized tax id, `XX-XXXXXXXX-X`
    #[serde(rename = "cuit")]
    pub tax_id: String,
    #[serde(rename = "direccion_calle")]
    pub street: String,
    #[serde(rename = "direccion_numero")]
    pub street_number: Option<String>,
    #[serde(rename = "localidad")]
    pub locality: String,
    #[serde(rename = "provincia")]
    pub province: String,
    /// Normalized phone, `XX-XXXX-XXXX`
    #[serde(rename = "telefono")]
    pub phone: String,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Case {
    pub id: Uuid,
    #[serde(rename = "numero_caso")]
    pub case_number: String,
    #[serde(flatten)]
    pub data: NewCase,
    #[serde(rename = "estado")]
    pub status: CaseStatus,
    #[serde(rename = "resolucion")]
    pub resolution: Option<String>,
    #[serde(rename = "acciones_correctivas")]
    pub corrective_actions: Option<String>,
    #[serde(rename = "acciones_preventivas")]
    pub preventive_actions: Option<String>,
    #[serde(rename = "fecha_cierre")]
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewCase {
    #[serde(rename = "cliente_id")]
    pub client_id: Uuid,
    #[serde(rename = "colaborador_registro_id")]
    pub registered_by_staff_id: Option<Uuid>,
    #[serde(rename = "tipo_usuario_registro")]
    pub registrant_type: RegistrantType,
    #[serde(rename = "tipo_caso")]
    pub case_type: CaseType,
    #[serde(rename = "criticidad")]
    pub criticality: Criticality,
    #[serde(rename = "justificacion")]
    pub justification: Justification,
    #[serde(rename = "canal")]
    pub channel: Channel,
    #[serde(rename = "descripcion_que_sucedio")]
    pub incident_description: String,
    #[serde(rename = "descripcion_donde_ocurrio")]
    pub incident_location: Option<String>,
    #[serde(rename = "descripcion_cuando_ocurrio")]
    pub incident_date: Option<DateTime<Utc>>,
    #[serde(rename = "descripcion_libre")]
    pub freeform_notes: Option<String>,
    #[serde(rename = "numero_remito")]
    pub delivery_note_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AffectedProduct {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: NewAffectedProduct,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewAffectedProduct {
    #[serde(rename = "caso_id")]
    pub case_id: Uuid,
    #[serde(rename = "nombre_producto")]
    pub product_name: String,
    #[serde(rename = "presentacion")]
    pub presentation: String,
    #[serde(rename = "numero_lote")]
    pub lot_number: String,
    #[serde(rename = "fecha_vencimiento")]
    pub expiry_date: NaiveDate,
    #[serde(rename = "estado_producto")]
    pub product_state: Option<ProductState>,
    #[serde(rename = "cantidad_afectada")]
    pub affected_quantity: i32,
    #[serde(rename = "unidad_medida")]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: NewAttachment,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewAttachment {
    #[serde(rename = "caso_id")]
    pub case_id: Uuid,
    #[serde(rename = "tipo_adjunto")]
    pub attachment_type: AttachmentType,
    #[serde(rename = "url_original")]
    pub original_url: Option<String>,
    #[serde(rename = "nombre_archivo")]
    pub file_name: String,
    #[serde(rename = "procesado")]
    pub processed: bool,
}

/// One chat message exchanged during the intake conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: NewMessage,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewMessage {
    #[serde(rename = "caso_id")]
    pub case_id: Uuid,
    #[serde(rename = "interaccion_id")]
    pub interaction_id: Option<Uuid>,
    /// Message id assigned by the messaging platform
    #[serde(rename = "mensaje_id_externo")]
    pub external_id: Option<String>,
    /// true when the customer sent it, false when the bot did
    #[serde(rename = "es_entrante")]
    pub inbound: bool,
    #[serde(rename = "remitente_numero")]
    pub sender_number: Option<String>,
    #[serde(rename = "destinatario_numero")]
    pub recipient_number: Option<String>,
    #[serde(rename = "tipo_mensaje")]
    pub message_type: String,
    #[serde(rename = "contenido")]
    pub content: Option<String>,
    #[serde(rename = "contenido_estructurado")]
    #[schema(value_type = Option<Object>)]
    pub structured_content: Option<Value>,
    #[serde(rename = "entregado")]
    pub delivered: bool,
    #[serde(rename = "leido")]
    pub read: bool,
    pub error: bool,
    #[serde(rename = "error_detalle")]
    pub error_detail: Option<String>,
    #[serde(rename = "timestamp_envio")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(rename = "timestamp_entrega")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(rename = "timestamp_lectura")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Delivery receipt reported by the messaging platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageReceipt {
    Delivered(DateTime<Utc>),
    Read(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Interaction {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: NewInteraction,
    pub created_at: DateTime<Utc>,
}

/// One pass through a segment of the chat flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewInteraction {
    #[serde(rename = "caso_id")]
    pub case_id: Uuid,
    pub session_id: Option<String>,
    pub flow_id: Option<String>,
    /// inicio, identificacion, producto, descripcion, cierre
    #[serde(rename = "tipo_interaccion")]
    pub interaction_type: String,
    #[serde(rename = "nodo_inicio")]
    pub start_node: Option<String>,
    #[serde(rename = "nodo_fin")]
    pub end_node: Option<String>,
    #[serde(rename = "duracion_segundos")]
    pub duration_seconds: Option<i32>,
    #[serde(rename = "completada")]
    pub completed: bool,
    #[serde(rename = "error_ocurrido")]
    pub error_occurred: bool,
    #[serde(rename = "error_detalle")]
    pub error_detail: Option<String>,
}

/// Audit row written every time a case changes classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassificationRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: NewClassificationRecord,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewClassificationRecord {
    #[serde(rename = "caso_id")]
    pub case_id: Uuid,
    #[serde(rename = "tipo_caso_anterior")]
    pub previous_case_type: Option<CaseType>,
    #[serde(rename = "tipo_caso_nuevo")]
    pub case_type: CaseType,
    #[serde(rename = "criticidad_anterior")]
    pub previous_criticality: Option<Criticality>,
    #[serde(rename = "criticidad_nueva")]
    pub criticality: Criticality,
    #[serde(rename = "justificacion_anterior")]
    pub previous_justification: Option<Justification>,
    #[serde(rename = "justificacion_nueva")]
    pub justification: Justification,
    #[serde(rename = "clasificado_por")]
    pub classified_by: Option<Uuid>,
    #[serde(rename = "clasificacion_automatica")]
    pub automatic: bool,
    #[serde(rename = "motivo")]
    pub reason: String,
}

/// A case with every related record, as shown to reviewers
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: Case,
    #[serde(rename = "cliente")]
    pub client: Option<Client>,
    #[serde(rename = "productos_afectados")]
    pub products: Vec<AffectedProduct>,
    #[serde(rename = "adjuntos")]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "interacciones")]
    pub interactions: Vec<Interaction>,
    #[serde(rename = "mensajes")]
    pub messages: Vec<Message>,
    #[serde(rename = "clasificaciones")]
    pub classifications: Vec<ClassificationRecord>,
}

/// Status change requested by a reviewer
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CaseStatusUpdate {
    #[serde(rename = "estado")]
    pub status: CaseStatus,
    #[serde(rename = "resolucion")]
    pub resolution: Option<String>,
    #[serde(rename = "acciones_correctivas")]
    pub corrective_actions: Option<String>,
    #[serde(rename = "acciones_preventivas")]
    pub preventive_actions: Option<String>,
}
