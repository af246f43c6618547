//! Conversation session state exchanged with the chat-flow platform
//!
//! The flow accumulates customer, product and incident fields across
//! several function calls and sends the whole record on every call. Fields
//! this service does not know about are kept in `extra` and echoed back
//! untouched.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{AttachmentType, CaseType, Criticality, Justification, ProductState, RegistrantType};

/// Attachment reference captured during the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionAttachment {
    #[serde(deserialize_with = "from_str_required")]
    pub tipo: AttachmentType,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SessionState {
    #[serde(
        rename = "tipoUsuarioRegistro",
        deserialize_with = "from_str_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub registrant_type: Option<RegistrantType>,

    // Customer
    #[serde(rename = "clienteId", deserialize_with = "from_str_lenient", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    #[serde(rename = "clienteNombre", skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(rename = "clienteCUIT", skip_serializing_if = "Option::is_none")]
    pub client_tax_id: Option<String>,
    #[serde(rename = "clienteDireccion", skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(rename = "clienteTelefono", skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(rename = "clienteEmail", skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(rename = "clienteRazonSocial", skip_serializing_if = "Option::is_none")]
    pub client_business_name: Option<String>,

    // Staff member registering on behalf of a customer
    #[serde(rename = "colaboradorId", deserialize_with = "from_str_lenient", skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<Uuid>,
    #[serde(rename = "colaboradorNombre", skip_serializing_if = "Option::is_none")]
    pub staff_name: Option<String>,
    #[serde(rename = "colaboradorCargo", skip_serializing_if = "Option::is_none")]
    pub staff_role: Option<String>,
    #[serde(rename = "colaboradorArea", skip_serializing_if = "Option::is_none")]
    pub staff_area: Option<String>,

    // Product
    #[serde(rename = "productoNombre", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(rename = "productoPresentacion", skip_serializing_if = "Option::is_none")]
    pub product_presentation: Option<String>,
    #[serde(rename = "productoLote", skip_serializing_if = "Option::is_none")]
    pub product_lot: Option<String>,
    #[serde(rename = "productoVencimiento", skip_serializing_if = "Option::is_none")]
    pub product_expiry: Option<String>,
    #[serde(rename = "productoEstado", deserialize_with = "from_str_lenient", skip_serializing_if = "Option::is_none")]
    pub product_state: Option<ProductState>,
    #[serde(
        rename = "productoCantidadAfectada",
        deserialize_with = "number_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_affected_quantity: Option<f64>,
    #[serde(rename = "productoUnidadMedida", skip_serializing_if = "Option::is_none")]
    pub product_unit: Option<String>,

    // Incident
    #[serde(rename = "numeroRemito", skip_serializing_if = "Option::is_none")]
    pub delivery_note_number: Option<String>,
    #[serde(rename = "descripcionQueSucedio", skip_serializing_if = "Option::is_none")]
    pub incident_description: Option<String>,
    #[serde(rename = "descripcionDondeOcurrio", skip_serializing_if = "Option::is_none")]
    pub incident_location: Option<String>,
    #[serde(rename = "descripcionCuandoOcurrio", skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<String>,
    #[serde(rename = "descripcionLibre", skip_serializing_if = "Option::is_none")]
    pub freeform_notes: Option<String>,

    #[serde(rename = "adjuntos", skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<SessionAttachment>>,

    // Classification (written by the classifier or a reviewer)
    #[serde(rename = "tipoCaso", deserialize_with = "from_str_lenient")]
    pub case_type: Option<CaseType>,
    #[serde(rename = "criticidad", deserialize_with = "from_str_lenient")]
    pub criticality: Option<Criticality>,
    #[serde(rename = "justificacion", deserialize_with = "from_str_lenient", skip_serializing_if = "Option::is_none")]
    pub justification: Option<Justification>,

    // Persisted case
    #[serde(rename = "casoId", deserialize_with = "from_str_lenient", skip_serializing_if = "Option::is_none")]
    pub case_id: Option<Uuid>,
    #[serde(rename = "numeroCaso", skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,

    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

impl SessionState {
    /// Build a session state from a JSON object, query parameters included
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// Accept `null`, `""` or a parseable string; the flow sends empty strings for unset fields
fn from_str_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn from_str_required<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Accept a JSON number or a numeric string (query parameters arrive as strings)
fn number_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) => Ok(Some(n)),
            // "3 cajas" style answers keep their leading number
            Err(e) => crate::service::validation::extract_number(&s)
                .map(|n| Some(n as f64))
                .ok_or_else(|| serde::de::Error::custom(e)),
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}
