//! Domain enums shared by the classifier, the session state and the store
//!
//! Every enum serializes with the wire value used by the chat flows and the
//! database columns, so `as_str()` and the serde representation always agree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error returned when a wire value does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        $(#[$meta])*
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire / database representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = normalize_wire_value(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

/// Lowercase, trim and turn inner spaces into underscores ("Sin Usar" -> "sin_usar")
fn normalize_wire_value(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "_")
}

wire_enum! {
    /// Kind of customer-reported case
    CaseType ("case type") {
        /// Product non-conformity; the only type that carries a criticality
        Complaint => "reclamo",
        /// Dissatisfaction with service, price or delivery
        Grievance => "queja",
        /// Question or request for information
        Comment => "comentario",
        PendingClassification => "pendiente_clasificacion",
    }
}

wire_enum! {
    /// Severity tier of a complaint
    Criticality ("criticality") {
        Critical => "critico",
        Major => "mayor",
        Minor => "menor",
        NotApplicable => "no_aplica",
    }
}

wire_enum! {
    /// Post-investigation verdict on a case
    Justification ("justification") {
        Justified => "justificado",
        NotJustified => "no_justificado",
        PendingInvestigation => "pendiente_investigacion",
    }
}

wire_enum! {
    /// Structured flag describing the reported product
    ProductState ("product state") {
        Used => "usado",
        Unused => "sin_usar",
        ContainerBroken => "envase_roto",
        ContainerIntact => "envase_sano",
    }
}

wire_enum! {
    /// Lifecycle status of a persisted case
    CaseStatus ("case status") {
        New => "nuevo",
        UnderInvestigation => "en_investigacion",
        Resolved => "resuelto",
        Closed => "cerrado",
        Cancelled => "cancelado",
    }
}

wire_enum! {
    /// Channel the case was reported through
    Channel ("channel") {
        WhatsApp => "whatsapp",
        Email => "email",
        Phone => "telefono",
        Web => "web",
        InPerson => "presencial",
    }
}

wire_enum! {
    AttachmentType ("attachment type") {
        Photo => "foto",
        Video => "video",
        Document => "documento",
        Audio => "audio",
    }
}

wire_enum! {
    /// Who registered the case in the chat flow
    RegistrantType ("registrant type") {
        Customer => "cliente",
        Staff => "colaborador_vetanco",
    }
}

impl Criticality {
    /// Severity rank, higher is more severe
    pub fn severity(&self) -> u8 {
        match self {
            Criticality::NotApplicable => 0,
            Criticality::Minor => 1,
            Criticality::Major => 2,
            Criticality::Critical => 3,
        }
    }
}
