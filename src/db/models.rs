//! Database rows for the intake tables and list/query types

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::DbError;
use crate::model::{
    AffectedProduct, Attachment, Case, CaseStatus, CaseType, Client, ClassificationRecord,
    Criticality, Interaction, Message, NewAffectedProduct, NewAttachment, NewCase,
    NewClassificationRecord, NewClient, NewInteraction, NewMessage, UnknownVariant,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

fn parse_column<T>(value: &str) -> Result<T, DbError>
where
    T: FromStr<Err = UnknownVariant>,
{
    value
        .parse()
        .map_err(|e: UnknownVariant| DbError::Serialization(e.to_string()))
}

fn parse_optional_column<T>(value: Option<&str>) -> Result<Option<T>, DbError>
where
    T: FromStr<Err = UnknownVariant>,
{
    value.map(parse_column::<T>).transpose()
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub nombre_apellido: String,
    pub razon_social: String,
    pub cuit: String,
    pub direccion_calle: String,
    pub direccion_numero: Option<String>,
    pub localidad: String,
    pub provincia: String,
    pub telefono: String,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            data: NewClient {
                full_name: row.nombre_apellido,
                business_name: row.razon_social,
                tax_id: row.cuit,
                street: row.direccion_calle,
                street_number: row.direccion_numero,
                locality: row.localidad,
                province: row.provincia,
                phone: row.telefono,
                email: row.email,
                whatsapp_number: row.whatsapp_number,
            },
            active: row.activo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub id: Uuid,
    pub numero_caso: String,
    pub cliente_id: Uuid,
    pub colaborador_registro_id: Option<Uuid>,
    pub tipo_usuario_registro: String,
    pub tipo_caso: String,
    pub criticidad: String,
    pub justificacion: String,
    pub canal: String,
    pub estado: String,
    pub descripcion_que_sucedio: String,
    pub descripcion_donde_ocurrio: Option<String>,
    pub descripcion_cuando_ocurrio: Option<DateTime<Utc>>,
    pub descripcion_libre: Option<String>,
    pub numero_remito: String,
    pub resolucion: Option<String>,
    pub acciones_correctivas: Option<String>,
    pub acciones_preventivas: Option<String>,
    pub fecha_cierre: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> Result<Case, DbError> {
        Ok(Case {
            id: self.id,
            case_number: self.numero_caso,
            data: NewCase {
                client_id: self.cliente_id,
                registered_by_staff_id: self.colaborador_registro_id,
                registrant_type: parse_column(&self.tipo_usuario_registro)?,
                case_type: parse_column(&self.tipo_caso)?,
                criticality: parse_column(&self.criticidad)?,
                justification: parse_column(&self.justificacion)?,
                channel: parse_column(&self.canal)?,
                incident_description: self.descripcion_que_sucedio,
                incident_location: self.descripcion_donde_ocurrio,
                incident_date: self.descripcion_cuando_ocurrio,
                freeform_notes: self.descripcion_libre,
                delivery_note_number: self.numero_remito,
            },
            status: parse_column(&self.estado)?,
            resolution: self.resolucion,
            corrective_actions: self.acciones_correctivas,
            preventive_actions: self.acciones_preventivas,
            closed_at: self.fecha_cierre,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AffectedProductRow {
    pub id: Uuid,
    pub caso_id: Uuid,
    pub nombre_producto: String,
    pub presentacion: String,
    pub numero_lote: String,
    pub fecha_vencimiento: NaiveDate,
    pub estado_producto: Option<String>,
    pub cantidad_afectada: i32,
    pub unidad_medida: String,
    pub created_at: DateTime<Utc>,
}

impl AffectedProductRow {
    pub fn into_domain(self) -> Result<AffectedProduct, DbError> {
        Ok(AffectedProduct {
            id: self.id,
            data: NewAffectedProduct {
                case_id: self.caso_id,
                product_name: self.nombre_producto,
                presentation: self.presentacion,
                lot_number: self.numero_lote,
                expiry_date: self.fecha_vencimiento,
                product_state: parse_optional_column(self.estado_producto.as_deref())?,
                affected_quantity: self.cantidad_afectada,
                unit: self.unidad_medida,
            },
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    pub id: Uuid,
    pub caso_id: Uuid,
    pub tipo_adjunto: String,
    pub url_original: Option<String>,
    pub nombre_archivo: String,
    pub procesado: bool,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRow {
    pub fn into_domain(self) -> Result<Attachment, DbError> {
        Ok(Attachment {
            id: self.id,
            data: NewAttachment {
                case_id: self.caso_id,
                attachment_type: parse_column(&self.tipo_adjunto)?,
                original_url: self.url_original,
                file_name: self.nombre_archivo,
                processed: self.procesado,
            },
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub caso_id: Uuid,
    pub interaccion_id: Option<Uuid>,
    pub mensaje_id_externo: Option<String>,
    pub es_entrante: bool,
    pub remitente_numero: Option<String>,
    pub destinatario_numero: Option<String>,
    pub tipo_mensaje: String,
    pub contenido: Option<String>,
    pub contenido_estructurado: Option<serde_json::Value>,
    pub entregado: bool,
    pub leido: bool,
    pub error: bool,
    pub error_detalle: Option<String>,
    pub timestamp_envio: Option<DateTime<Utc>>,
    pub timestamp_entrega: Option<DateTime<Utc>>,
    pub timestamp_lectura: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            data: NewMessage {
                case_id: row.caso_id,
                interaction_id: row.interaccion_id,
                external_id: row.mensaje_id_externo,
                inbound: row.es_entrante,
                sender_number: row.remitente_numero,
                recipient_number: row.destinatario_numero,
                message_type: row.tipo_mensaje,
                content: row.contenido,
                structured_content: row.contenido_estructurado,
                delivered: row.entregado,
                read: row.leido,
                error: row.error,
                error_detail: row.error_detalle,
                sent_at: row.timestamp_envio,
                delivered_at: row.timestamp_entrega,
                read_at: row.timestamp_lectura,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InteractionRow {
    pub id: Uuid,
    pub caso_id: Uuid,
    pub session_id: Option<String>,
    pub flow_id: Option<String>,
    pub tipo_interaccion: String,
    pub nodo_inicio: Option<String>,
    pub nodo_fin: Option<String>,
    pub duracion_segundos: Option<i32>,
    pub completada: bool,
    pub error_ocurrido: bool,
    pub error_detalle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<InteractionRow> for Interaction {
    fn from(row: InteractionRow) -> Self {
        Interaction {
            id: row.id,
            data: NewInteraction {
                case_id: row.caso_id,
                session_id: row.session_id,
                flow_id: row.flow_id,
                interaction_type: row.tipo_interaccion,
                start_node: row.nodo_inicio,
                end_node: row.nodo_fin,
                duration_seconds: row.duracion_segundos,
                completed: row.completada,
                error_occurred: row.error_ocurrido,
                error_detail: row.error_detalle,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClassificationRow {
    pub id: Uuid,
    pub caso_id: Uuid,
    pub tipo_caso_anterior: Option<String>,
    pub tipo_caso_nuevo: String,
    pub criticidad_anterior: Option<String>,
    pub criticidad_nueva: String,
    pub justificacion_anterior: Option<String>,
    pub justificacion_nueva: String,
    pub clasificado_por: Option<Uuid>,
    pub clasificacion_automatica: bool,
    pub motivo: String,
    pub created_at: DateTime<Utc>,
}

impl ClassificationRow {
    pub fn into_domain(self) -> Result<ClassificationRecord, DbError> {
        Ok(ClassificationRecord {
            id: self.id,
            data: NewClassificationRecord {
                case_id: self.caso_id,
                previous_case_type: parse_optional_column(self.tipo_caso_anterior.as_deref())?,
                case_type: parse_column(&self.tipo_caso_nuevo)?,
                previous_criticality: parse_optional_column(self.criticidad_anterior.as_deref())?,
                criticality: parse_column(&self.criticidad_nueva)?,
                previous_justification: parse_optional_column(
                    self.justificacion_anterior.as_deref(),
                )?,
                justification: parse_column(&self.justificacion_nueva)?,
                classified_by: self.clasificado_por,
                automatic: self.clasificacion_automatica,
                reason: self.motivo,
            },
            created_at: self.created_at,
        })
    }
}

/// Classification and status of one case, for statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseSummary {
    pub case_type: CaseType,
    pub criticality: Criticality,
    pub status: CaseStatus,
}

#[derive(Debug, Clone, FromRow)]
pub struct CaseSummaryRow {
    pub tipo_caso: String,
    pub criticidad: String,
    pub estado: String,
}

impl CaseSummaryRow {
    pub fn into_domain(self) -> Result<CaseSummary, DbError> {
        Ok(CaseSummary {
            case_type: parse_column(&self.tipo_caso)?,
            criticality: parse_column(&self.criticidad)?,
            status: parse_column(&self.estado)?,
        })
    }
}

/// Filters and pagination for listing cases
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CaseListQuery {
    #[serde(rename = "tipo_caso")]
    pub case_type: Option<CaseType>,
    #[serde(rename = "criticidad")]
    pub criticality: Option<Criticality>,
    #[serde(rename = "estado")]
    pub status: Option<CaseStatus>,
    /// Created at or after (RFC 3339)
    #[serde(rename = "fecha_desde")]
    pub from: Option<DateTime<Utc>>,
    /// Created at or before (RFC 3339)
    #[serde(rename = "fecha_hasta")]
    pub to: Option<DateTime<Utc>>,
    #[serde(rename = "cliente_id")]
    pub client_id: Option<Uuid>,
    /// Page number (1-based, default 1)
    pub page: Option<u32>,
    /// Page size (default 20, max 100)
    pub limit: Option<u32>,
}

impl CaseListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip; computed in `u64` so a huge `page` cannot overflow
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1).saturating_mul(u64::from(self.limit()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let total_pages = ((total as f64) / (limit as f64)).ceil() as u32;
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Paginated response for cases
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedCases {
    pub data: Vec<Case>,
    pub pagination: Pagination,
}
