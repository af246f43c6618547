//! Helpers derived from a classification: customer reply, sentiment, urgency

use serde::Serialize;

use super::ClassificationResult;
use super::keywords::{NEGATIVE_SENTIMENT, POSITIVE_SENTIMENT};
use crate::model::{CaseType, Criticality};

/// Automated reply sent to the customer once the case is classified
pub fn summarize(result: &ClassificationResult) -> String {
    match result.case_type {
        CaseType::Complaint => {
            let detail = match result.criticality {
                Criticality::Critical => {
                    " CRÍTICO.\n\n⚠️ Debido a la gravedad reportada, este caso será tratado con máxima prioridad.\nUn especialista se comunicará con usted en las próximas 4 horas."
                }
                Criticality::Major => {
                    " MAYOR.\n\nEl equipo de Calidad investigará el caso y se comunicará en las próximas 48 horas."
                }
                Criticality::Minor => {
                    " MENOR.\n\nEl caso será evaluado por el área de Calidad en los próximos 7 días."
                }
                Criticality::NotApplicable => "",
            };
            format!("Su caso ha sido clasificado como RECLAMO{detail}")
        }
        CaseType::Grievance => "Su caso ha sido registrado como QUEJA.\n\nRevisaremos su inquietud y nos comunicaremos en las próximas 48 horas.".to_string(),
        CaseType::Comment => "Su consulta ha sido registrada como COMENTARIO.\n\nUn especialista de Asistencia Técnica le responderá en las próximas 2 horas.".to_string(),
        CaseType::PendingClassification => "Su caso ha sido registrado y será evaluado por nuestro equipo para determinar la clasificación correspondiente.".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Coarse sentiment of a customer message
///
/// Each listed term counts once if present; one side must lead by two or
/// more to win.
pub fn sentiment(text: &str) -> Sentiment {
    let text = text.to_lowercase();
    let negative = NEGATIVE_SENTIMENT.iter().filter(|w| text.contains(*w)).count();
    let positive = POSITIVE_SENTIMENT.iter().filter(|w| text.contains(*w)).count();

    if negative > positive + 1 {
        Sentiment::Negative
    } else if positive > negative + 1 {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

/// Priority score in 0..=100 used to order the review queue
pub fn urgency_score(result: &ClassificationResult) -> u8 {
    let type_base = match result.case_type {
        CaseType::Complaint => 40.0,
        CaseType::Grievance => 20.0,
        CaseType::Comment | CaseType::PendingClassification => 10.0,
    };
    let criticality_base = match result.criticality {
        Criticality::Critical => 50.0,
        Criticality::Major => 30.0,
        Criticality::Minor => 10.0,
        Criticality::NotApplicable => 0.0,
    };

    let score = (type_base + criticality_base + result.confidence * 10.0).round();
    score.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Justification;

    fn result(case_type: CaseType, criticality: Criticality, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            case_type,
            criticality,
            justification: Justification::PendingInvestigation,
            confidence,
            rationale: String::new(),
            matched_keywords: Vec::new(),
        }
    }

    #[test]
    fn test_summarize_complaints_name_response_time() {
        let critical = summarize(&result(CaseType::Complaint, Criticality::Critical, 0.95));
        assert!(critical.starts_with("Su caso ha sido clasificado como RECLAMO CRÍTICO."));
        assert!(critical.contains("4 horas"));

        let major = summarize(&result(CaseType::Complaint, Criticality::Major, 0.85));
        assert!(major.contains("48 horas"));

        let minor = summarize(&result(CaseType::Complaint, Criticality::Minor, 0.70));
        assert!(minor.contains("7 días"));
    }

    #[test]
    fn test_summarize_other_types() {
        assert!(
            summarize(&result(CaseType::Grievance, Criticality::NotApplicable, 0.75))
                .contains("QUEJA")
        );
        assert!(
            summarize(&result(CaseType::Comment, Criticality::NotApplicable, 0.80))
                .contains("2 horas")
        );
        assert!(
            summarize(&result(CaseType::PendingClassification, Criticality::NotApplicable, 0.40))
                .starts_with("Su caso ha sido registrado y será evaluado")
        );
    }

    #[test]
    fn test_sentiment() {
        assert_eq!(
            sentiment("Pésimo servicio, terrible, estoy muy molesto"),
            Sentiment::Negative
        );
        assert_eq!(
            sentiment("Excelente producto, quedé satisfecho y agradecido"),
            Sentiment::Positive
        );
        assert_eq!(sentiment("Recibí el pedido"), Sentiment::Neutral);
        // A one-term lead is not enough
        assert_eq!(sentiment("horrible"), Sentiment::Neutral);
        // "mal" inside "animales" counts alongside "problema"
        assert_eq!(sentiment("Los animales tienen un problema"), Sentiment::Negative);
    }

    #[test]
    fn test_urgency_score() {
        assert_eq!(urgency_score(&result(CaseType::Complaint, Criticality::Major, 0.6)), 76);
        assert_eq!(
            urgency_score(&result(CaseType::PendingClassification, Criticality::NotApplicable, 0.4)),
            14
        );
        assert_eq!(urgency_score(&result(CaseType::Complaint, Criticality::Critical, 1.0)), 100);
    }

    #[test]
    fn test_urgency_is_monotonic_in_severity() {
        let mut by_severity = Criticality::ALL.to_vec();
        by_severity.sort_by_key(|c| c.severity());

        for case_type in CaseType::ALL {
            for confidence in [0.0, 0.4, 0.75, 1.0] {
                let scores: Vec<u8> = by_severity
                    .iter()
                    .map(|c| urgency_score(&result(*case_type, *c, confidence)))
                    .collect();
                assert!(
                    scores.windows(2).all(|w| w[0] <= w[1]),
                    "{case_type} at {confidence}: {scores:?}"
                );
            }
        }
    }
}
