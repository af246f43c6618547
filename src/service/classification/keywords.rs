//! Keyword tables for case classification
//!
//! Terms are lowercase and matched as substrings of the lowercased text, so
//! multi-word terms ("no funciona") and stems both work.

/// Risk to animal health: death, poisoning, emergencies
pub const CRITICAL: &[&str] = &[
    "muerte",
    "muerto",
    "murió",
    "murieron",
    "fallecido",
    "intoxicación",
    "intoxicado",
    "tóxico",
    "toxicidad",
    "veneno",
    "envenenamiento",
    "grave",
    "gravísimo",
    "crítico",
    "emergencia",
    "urgente",
    "urgencia",
    "salud",
    "riesgo",
    "peligro",
    "peligroso",
    "hospitalizado",
    "veterinario urgente",
];

/// Product defect, expiry, contamination or malfunction
pub const MAJOR: &[&str] = &[
    "defecto",
    "defectuoso",
    "vencido",
    "expirado",
    "contaminado",
    "contaminación",
    "roto",
    "dañado",
    "no sirve",
    "no funciona",
    "ineficaz",
    "sin efecto",
    "malo",
    "mal estado",
    "deteriorado",
    "alterado",
    "anormal",
    "extraño",
    "sospechoso",
    "incorrecto",
    "incompleto",
    "faltante",
    "diferente",
    "cambiado",
    "problema serio",
];

/// Packaging, cosmetic or superficial issues
pub const MINOR: &[&str] = &[
    "envase",
    "empaque",
    "embalaje",
    "caja",
    "etiqueta",
    "estético",
    "estética",
    "apariencia",
    "externo",
    "externa",
    "mínimo",
    "pequeño",
    "leve",
    "levemente",
    "abolladura",
    "rayado",
    "manchado",
];

/// Questions, dosage and usage inquiries
pub const COMMENT: &[&str] = &[
    "consulta",
    "pregunta",
    "duda",
    "dosis",
    "dosificación",
    "cómo usar",
    "cómo aplicar",
    "modo de uso",
    "instrucciones",
    "indicaciones",
    "sugerencia",
    "recomendación",
    "información",
    "datos",
    "asesoramiento",
    "orientación",
    "compatibilidad",
    "compatible",
    "puedo usar",
    "se puede",
    "está bien",
    "cuánto",
    "cuándo",
    "cada cuánto",
];

/// Delay, service, price or delivery dissatisfaction
pub const GRIEVANCE: &[&str] = &[
    "demora",
    "demoró",
    "tardó",
    "lento",
    "atención",
    "servicio",
    "trato",
    "precio",
    "caro",
    "costoso",
    "valor",
    "entrega",
    "envío",
    "transporte",
    "logística",
    "pedido",
    "orden",
    "factura",
    "cobraron",
    "esperando",
    "espero",
    "todavía no",
];

pub(crate) const NEGATIVE_SENTIMENT: &[&str] = &[
    "mal",
    "malo",
    "mala",
    "pésimo",
    "terrible",
    "horrible",
    "deficiente",
    "problema",
    "falla",
    "error",
    "incorrecto",
    "inaceptable",
    "insatisfecho",
    "decepcionado",
    "molesto",
    "enojado",
    "frustrado",
];

pub(crate) const POSITIVE_SENTIMENT: &[&str] = &[
    "bien",
    "bueno",
    "buena",
    "excelente",
    "correcto",
    "satisfecho",
    "contento",
    "agradecido",
    "perfecto",
    "funciona",
];

/// Terms of `table` found in `text`, in table order
pub fn find_in(text: &str, table: &[&'static str]) -> Vec<&'static str> {
    table.iter().copied().filter(|k| text.contains(k)).collect()
}
