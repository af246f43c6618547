//! Rule-based case classification
//!
//! A case is classified by matching the lowercased incident text against
//! fixed keyword tables and then walking an ordered list of rules; the
//! first rule whose condition holds decides the result. Classification is
//! total: input with no text and no product state still yields a
//! low-confidence pending result.

pub mod keywords;
pub mod scoring;

use serde::Serialize;

use crate::model::{CaseType, Criticality, Justification, ProductState, SessionState};

pub use scoring::{Sentiment, sentiment, summarize, urgency_score};

/// Free-text and structured fields the classifier reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationInput {
    pub incident_description: String,
    pub freeform_notes: String,
    pub product_state: Option<ProductState>,
}

impl From<&SessionState> for ClassificationInput {
    fn from(state: &SessionState) -> Self {
        Self {
            incident_description: state.incident_description.clone().unwrap_or_default(),
            freeform_notes: state.freeform_notes.clone().unwrap_or_default(),
            product_state: state.product_state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub case_type: CaseType,
    pub criticality: Criticality,
    /// Always pending at automatic classification time
    pub justification: Justification,
    pub confidence: f64,
    pub rationale: String,
    pub matched_keywords: Vec<String>,
}

/// Keyword matches and structured fields a rule can look at
#[derive(Debug, Clone)]
pub struct Evidence {
    pub text: String,
    pub product_state: Option<ProductState>,
    pub critical: Vec<&'static str>,
    pub major: Vec<&'static str>,
    pub minor: Vec<&'static str>,
    pub comment: Vec<&'static str>,
    pub grievance: Vec<&'static str>,
}

impl Evidence {
    pub fn gather(input: &ClassificationInput) -> Self {
        let text = format!(
            "{} {}",
            input.incident_description.to_lowercase(),
            input.freeform_notes.to_lowercase()
        );

        Self {
            critical: keywords::find_in(&text, keywords::CRITICAL),
            major: keywords::find_in(&text, keywords::MAJOR),
            minor: keywords::find_in(&text, keywords::MINOR),
            comment: keywords::find_in(&text, keywords::COMMENT),
            grievance: keywords::find_in(&text, keywords::GRIEVANCE),
            product_state: input.product_state,
            text,
        }
    }

    fn state_is(&self, state: ProductState) -> bool {
        self.product_state == Some(state)
    }
}

/// One step of the decision cascade
pub struct Rule {
    pub name: &'static str,
    pub case_type: CaseType,
    pub criticality: Criticality,
    pub confidence: f64,
    pub rationale: &'static str,
    applies: fn(&Evidence) -> bool,
    keywords: fn(&Evidence) -> Vec<&'static str>,
}

impl Rule {
    pub fn applies(&self, evidence: &Evidence) -> bool {
        (self.applies)(evidence)
    }

    fn result(&self, evidence: &Evidence) -> ClassificationResult {
        ClassificationResult {
            case_type: self.case_type,
            criticality: self.criticality,
            justification: Justification::PendingInvestigation,
            confidence: self.confidence,
            rationale: self.rationale.to_string(),
            matched_keywords: (self.keywords)(evidence)
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

fn no_keywords(_: &Evidence) -> Vec<&'static str> {
    Vec::new()
}

/// Decision cascade in priority order; first match wins
static RULES: &[Rule] = &[
    Rule {
        name: "critical_keywords",
        case_type: CaseType::Complaint,
        criticality: Criticality::Critical,
        confidence: 0.95,
        rationale: "Detectadas palabras clave que indican riesgo grave para la salud animal",
        applies: |e| !e.critical.is_empty(),
        keywords: |e| e.critical.clone(),
    },
    Rule {
        name: "product_defect",
        case_type: CaseType::Complaint,
        criticality: Criticality::Major,
        confidence: 0.85,
        rationale: "Detectado defecto en producto o incumplimiento significativo",
        applies: |e| {
            !e.major.is_empty()
                || e.state_is(ProductState::ContainerBroken)
                || (e.state_is(ProductState::Used) && e.text.contains("problema"))
        },
        keywords: |e| e.major.clone(),
    },
    Rule {
        name: "technical_inquiry",
        case_type: CaseType::Comment,
        criticality: Criticality::NotApplicable,
        confidence: 0.80,
        rationale: "Detectada consulta técnica o solicitud de información",
        applies: |e| e.comment.len() >= 2 && e.state_is(ProductState::Unused),
        keywords: |e| e.comment.clone(),
    },
    Rule {
        name: "service_dissatisfaction",
        case_type: CaseType::Grievance,
        criticality: Criticality::NotApplicable,
        confidence: 0.75,
        rationale: "Detectada insatisfacción sin incumplimiento evidente del producto",
        applies: |e| {
            !e.grievance.is_empty() && e.state_is(ProductState::Unused) && e.major.is_empty()
        },
        keywords: |e| e.grievance.clone(),
    },
    Rule {
        name: "minor_issue",
        case_type: CaseType::Complaint,
        criticality: Criticality::Minor,
        confidence: 0.70,
        rationale: "Detectado problema menor que no afecta funcionalidad del producto",
        applies: |e| !e.minor.is_empty() && e.major.is_empty() && e.critical.is_empty(),
        keywords: |e| e.minor.clone(),
    },
    Rule {
        name: "used_product",
        case_type: CaseType::Complaint,
        criticality: Criticality::Major,
        confidence: 0.60,
        rationale: "Producto usado reportado con incidente, clasificado como reclamo por defecto",
        applies: |e| e.state_is(ProductState::Used),
        keywords: no_keywords,
    },
    // Shadowed by product_defect, kept so a broken container can never reach the fallback
    Rule {
        name: "broken_container",
        case_type: CaseType::Complaint,
        criticality: Criticality::Major,
        confidence: 0.75,
        rationale: "Envase roto puede comprometer integridad del producto",
        applies: |e| e.state_is(ProductState::ContainerBroken),
        keywords: |_| vec!["envase roto"],
    },
];

static FALLBACK: Rule = Rule {
    name: "manual_review",
    case_type: CaseType::PendingClassification,
    criticality: Criticality::NotApplicable,
    confidence: 0.40,
    rationale: "No se pudo clasificar automáticamente, requiere revisión manual",
    applies: |_| true,
    keywords: no_keywords,
};

/// Ordered decision rules, without the catch-all
pub fn rules() -> &'static [Rule] {
    RULES
}

/// Rule that decides `evidence`
pub fn decide(evidence: &Evidence) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| rule.applies(evidence))
        .unwrap_or(&FALLBACK)
}

/// Classify a case from its incident text and product state
pub fn classify(input: &ClassificationInput) -> ClassificationResult {
    let evidence = Evidence::gather(input);
    let rule = decide(&evidence);
    let result = rule.result(&evidence);

    tracing::debug!(
        rule = rule.name,
        case_type = %result.case_type,
        criticality = %result.criticality,
        confidence = result.confidence,
        keywords = result.matched_keywords.len(),
        "Case classified"
    );

    if requires_immediate_notification(result.case_type, result.criticality) {
        tracing::warn!(
            keywords = ?result.matched_keywords,
            "Critical complaint detected, immediate notification required"
        );
    }

    result
}

/// Only complaints carry a criticality, and every complaint carries one
pub fn validate_consistency(case_type: CaseType, criticality: Criticality) -> bool {
    match case_type {
        CaseType::Complaint => criticality != Criticality::NotApplicable,
        _ => criticality == Criticality::NotApplicable,
    }
}

/// Response time commitment in hours
pub fn sla_hours(case_type: CaseType, criticality: Criticality) -> u32 {
    match (case_type, criticality) {
        (CaseType::Complaint, Criticality::Critical) => 4,
        (CaseType::Complaint, Criticality::Major) => 48,
        (CaseType::Complaint, Criticality::Minor) => 168,
        (CaseType::Complaint, _) => 48,
        (CaseType::Grievance, _) => 48,
        (CaseType::Comment, _) => 2,
        _ => 24,
    }
}

pub fn requires_immediate_notification(case_type: CaseType, criticality: Criticality) -> bool {
    case_type == CaseType::Complaint && criticality == Criticality::Critical
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(description: &str, product_state: Option<ProductState>) -> ClassificationInput {
        ClassificationInput {
            incident_description: description.to_string(),
            freeform_notes: String::new(),
            product_state,
        }
    }

    fn sample_inputs() -> Vec<ClassificationInput> {
        let texts = [
            "",
            "el animal murió",
            "el producto no funciona y está roto",
            "tengo una duda sobre la dosis, cuánto debo aplicar",
            "el pedido tardó mucho en llegar",
            "la caja llegó con una abolladura",
            "tuvimos un problema con el producto",
            "todo bien, excelente",
        ];
        let states = [
            None,
            Some(ProductState::Used),
            Some(ProductState::Unused),
            Some(ProductState::ContainerBroken),
            Some(ProductState::ContainerIntact),
        ];
        texts
            .iter()
            .flat_map(|t| states.iter().map(move |s| input(t, *s)))
            .collect()
    }

    #[test]
    fn test_critical_keyword_has_absolute_priority() {
        let result = classify(&input("el animal murió", None));
        assert_eq!(result.case_type, CaseType::Complaint);
        assert_eq!(result.criticality, Criticality::Critical);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.matched_keywords, vec!["murió"]);

        // Product state and other tables never override a critical match
        let result = classify(&input(
            "consulta por la dosis, el perro está grave",
            Some(ProductState::Unused),
        ));
        assert_eq!(result.criticality, Criticality::Critical);
    }

    #[test]
    fn test_major_keywords() {
        let result = classify(&input("el producto no funciona y está roto", None));
        assert_eq!(result.case_type, CaseType::Complaint);
        assert_eq!(result.criticality, Criticality::Major);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.matched_keywords, vec!["roto", "no funciona"]);
    }

    #[test]
    fn test_broken_container_state_is_major() {
        let result = classify(&input("", Some(ProductState::ContainerBroken)));
        assert_eq!(result.criticality, Criticality::Major);
        assert_eq!(result.confidence, 0.85);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_used_product_with_problem_is_major() {
        let result = classify(&input(
            "tuvimos un problema con el producto",
            Some(ProductState::Used),
        ));
        assert_eq!(result.criticality, Criticality::Major);
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_problem_in_freeform_notes_counts() {
        let result = classify(&ClassificationInput {
            incident_description: "lo aplicamos ayer".to_string(),
            freeform_notes: "Hubo un PROBLEMA".to_string(),
            product_state: Some(ProductState::Used),
        });
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_technical_inquiry_needs_unused_product() {
        let text = "tengo una duda sobre la dosis, cuánto debo aplicar";
        let result = classify(&input(text, Some(ProductState::Unused)));
        assert_eq!(result.case_type, CaseType::Comment);
        assert_eq!(result.criticality, Criticality::NotApplicable);
        assert_eq!(result.confidence, 0.80);
        assert_eq!(result.matched_keywords, vec!["duda", "dosis", "cuánto"]);

        let result = classify(&input(text, None));
        assert_eq!(result.case_type, CaseType::PendingClassification);
    }

    #[test]
    fn test_service_dissatisfaction() {
        let result = classify(&input(
            "el pedido tardó mucho en llegar",
            Some(ProductState::Unused),
        ));
        assert_eq!(result.case_type, CaseType::Grievance);
        assert_eq!(result.criticality, Criticality::NotApplicable);
        assert_eq!(result.confidence, 0.75);
        assert_eq!(result.matched_keywords, vec!["tardó", "pedido"]);
    }

    #[test]
    fn test_minor_issue() {
        let result = classify(&input("la caja llegó con una abolladura", None));
        assert_eq!(result.case_type, CaseType::Complaint);
        assert_eq!(result.criticality, Criticality::Minor);
        assert_eq!(result.confidence, 0.70);
        assert_eq!(result.matched_keywords, vec!["caja", "abolladura"]);
    }

    #[test]
    fn test_used_product_without_keywords() {
        let result = classify(&input("", Some(ProductState::Used)));
        assert_eq!(result.case_type, CaseType::Complaint);
        assert_eq!(result.criticality, Criticality::Major);
        assert_eq!(result.confidence, 0.60);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_fallback_is_pending_classification() {
        let result = classify(&input("", None));
        assert_eq!(result.case_type, CaseType::PendingClassification);
        assert_eq!(result.criticality, Criticality::NotApplicable);
        assert_eq!(result.justification, Justification::PendingInvestigation);
        assert_eq!(result.confidence, 0.40);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_broken_container_rule_is_shadowed() {
        let evidence = Evidence::gather(&input("", Some(ProductState::ContainerBroken)));
        let broken = rules()
            .iter()
            .find(|r| r.name == "broken_container")
            .unwrap();
        assert!(broken.applies(&evidence));
        assert_eq!(decide(&evidence).name, "product_defect");
    }

    #[test]
    fn test_rules_are_in_priority_order() {
        let confidences: Vec<f64> = rules().iter().map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![0.95, 0.85, 0.80, 0.75, 0.70, 0.60, 0.75]);
    }

    #[test]
    fn test_every_result_is_consistent_and_bounded() {
        for input in sample_inputs() {
            let result = classify(&input);
            assert!(
                validate_consistency(result.case_type, result.criticality),
                "inconsistent result for {input:?}"
            );
            assert!((0.0..=1.0).contains(&result.confidence));
            assert_eq!(result.justification, Justification::PendingInvestigation);
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        for input in sample_inputs() {
            assert_eq!(classify(&input), classify(&input));
        }
    }

    #[test]
    fn test_every_rule_produces_consistent_results() {
        for rule in rules().iter().chain(std::iter::once(&FALLBACK)) {
            assert!(validate_consistency(rule.case_type, rule.criticality), "{}", rule.name);
        }
    }

    #[test]
    fn test_input_from_session_state() {
        let state = SessionState {
            incident_description: Some("Se rompió".to_string()),
            product_state: Some(ProductState::Used),
            ..Default::default()
        };
        let input = ClassificationInput::from(&state);
        assert_eq!(input.incident_description, "Se rompió");
        assert_eq!(input.freeform_notes, "");
        assert_eq!(input.product_state, Some(ProductState::Used));
    }

    #[test]
    fn test_validate_consistency() {
        assert!(validate_consistency(CaseType::Complaint, Criticality::Minor));
        assert!(!validate_consistency(CaseType::Complaint, Criticality::NotApplicable));
        assert!(validate_consistency(CaseType::Comment, Criticality::NotApplicable));
        assert!(!validate_consistency(CaseType::Grievance, Criticality::Major));
        assert!(!validate_consistency(CaseType::PendingClassification, Criticality::Critical));
    }

    #[test]
    fn test_sla_hours() {
        assert_eq!(sla_hours(CaseType::Complaint, Criticality::Critical), 4);
        assert_eq!(sla_hours(CaseType::Complaint, Criticality::Major), 48);
        assert_eq!(sla_hours(CaseType::Complaint, Criticality::Minor), 168);
        assert_eq!(sla_hours(CaseType::Complaint, Criticality::NotApplicable), 48);
        assert_eq!(sla_hours(CaseType::Grievance, Criticality::NotApplicable), 48);
        assert_eq!(sla_hours(CaseType::Comment, Criticality::NotApplicable), 2);
        assert_eq!(sla_hours(CaseType::PendingClassification, Criticality::NotApplicable), 24);
    }

    #[test]
    fn test_immediate_notification_only_for_critical_complaints() {
        for case_type in CaseType::ALL {
            for criticality in Criticality::ALL {
                let expected =
                    *case_type == CaseType::Complaint && *criticality == Criticality::Critical;
                assert_eq!(
                    requires_immediate_notification(*case_type, *criticality),
                    expected,
                    "{case_type} / {criticality}"
                );
            }
        }
    }
}
