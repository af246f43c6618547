//! Case management for reviewers: listing, detail, reclassification, status

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::models::{CaseListQuery, CaseSummary, PaginatedCases};
use crate::db::{DbError, IntakeStore};
use crate::model::{
    Case, CaseDetail, CaseStatus, CaseStatusUpdate, CaseType, Criticality, Justification,
    NewClassificationRecord,
};
use crate::service::classification;

const MIN_REASON_LENGTH: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum CaseServiceError {
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    #[error("Caso no encontrado: {0}")]
    CaseNotFound(String),

    #[error("Criticidad inválida para el tipo de caso")]
    InvalidClassification,

    #[error("{0}")]
    InvalidRequest(String),
}

/// Manual reclassification submitted by a reviewer
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReclassifyRequest {
    #[serde(rename = "tipo_caso")]
    pub case_type: CaseType,
    #[serde(rename = "criticidad")]
    pub criticality: Criticality,
    #[serde(rename = "justificacion")]
    pub justification: Justification,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "clasificado_por", default)]
    pub classified_by: Option<Uuid>,
}

/// Date window for statistics
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticsQuery {
    /// Created at or after (RFC 3339)
    pub fecha_desde: Option<DateTime<Utc>>,
    /// Created at or before (RFC 3339)
    pub fecha_hasta: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatisticsPeriod {
    pub desde: String,
    pub hasta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatisticsTotals {
    pub total_casos: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CaseStatistics {
    pub periodo: StatisticsPeriod,
    pub totales: StatisticsTotals,
    pub por_tipo: BTreeMap<String, u64>,
    pub por_criticidad: BTreeMap<String, u64>,
    pub por_estado: BTreeMap<String, u64>,
}

/// Count cases by type, criticality and status
pub fn aggregate(
    summaries: &[CaseSummary],
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> CaseStatistics {
    let mut stats = CaseStatistics {
        periodo: StatisticsPeriod {
            desde: from.map_or_else(|| "inicio".to_string(), |d| d.to_rfc3339()),
            hasta: to.map_or_else(|| "ahora".to_string(), |d| d.to_rfc3339()),
        },
        totales: StatisticsTotals {
            total_casos: summaries.len() as u64,
        },
        por_tipo: BTreeMap::new(),
        por_criticidad: BTreeMap::new(),
        por_estado: BTreeMap::new(),
    };

    for summary in summaries {
        *stats
            .por_tipo
            .entry(summary.case_type.to_string())
            .or_default() += 1;
        *stats
            .por_criticidad
            .entry(summary.criticality.to_string())
            .or_default() += 1;
        *stats
            .por_estado
            .entry(summary.status.to_string())
            .or_default() += 1;
    }

    stats
}

/// Service behind the `/api/*` endpoints
pub struct CaseService {
    store: Arc<dyn IntakeStore>,
}

impl CaseService {
    pub fn new(store: Arc<dyn IntakeStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &CaseListQuery) -> Result<PaginatedCases, CaseServiceError> {
        Ok(self.store.list_cases(query).await?)
    }

    pub async fn detail(&self, case_number: &str) -> Result<CaseDetail, CaseServiceError> {
        self.store
            .get_case_detail(case_number)
            .await?
            .ok_or_else(|| CaseServiceError::CaseNotFound(case_number.to_string()))
    }

    async fn find(&self, case_number: &str) -> Result<Case, CaseServiceError> {
        self.store
            .find_case_by_number(case_number)
            .await?
            .ok_or_else(|| CaseServiceError::CaseNotFound(case_number.to_string()))
    }

    /// Apply a reviewer's classification and record it in the history
    pub async fn reclassify(
        &self,
        case_number: &str,
        request: ReclassifyRequest,
    ) -> Result<Case, CaseServiceError> {
        if !classification::validate_consistency(request.case_type, request.criticality) {
            return Err(CaseServiceError::InvalidClassification);
        }
        if request.reason.trim().chars().count() < MIN_REASON_LENGTH {
            return Err(CaseServiceError::InvalidRequest(format!(
                "Motivo debe tener al menos {} caracteres",
                MIN_REASON_LENGTH
            )));
        }

        let case = self.find(case_number).await?;
        let record = NewClassificationRecord {
            case_id: case.id,
            previous_case_type: Some(case.data.case_type),
            case_type: request.case_type,
            previous_criticality: Some(case.data.criticality),
            criticality: request.criticality,
            previous_justification: Some(case.data.justification),
            justification: request.justification,
            classified_by: request.classified_by,
            automatic: false,
            reason: request.reason.trim().to_string(),
        };

        let updated = self.store.reclassify_case(&record).await?;
        tracing::info!(
            case_number = %updated.case_number,
            from = %case.data.case_type,
            to = %updated.data.case_type,
            criticality = %updated.data.criticality,
            "Case reclassified"
        );

        Ok(updated)
    }

    /// Move a case to a new status; closing stamps the closing time
    pub async fn change_status(
        &self,
        case_number: &str,
        update: CaseStatusUpdate,
    ) -> Result<Case, CaseServiceError> {
        let case = self.find(case_number).await?;
        let closed_at = (update.status == CaseStatus::Closed).then(Utc::now);

        let updated = self
            .store
            .update_case_status(case.id, &update, closed_at)
            .await?;
        tracing::info!(
            case_number = %updated.case_number,
            from = %case.status,
            to = %updated.status,
            "Case status changed"
        );

        Ok(updated)
    }

    pub async fn statistics(
        &self,
        query: &StatisticsQuery,
    ) -> Result<CaseStatistics, CaseServiceError> {
        let summaries = self
            .store
            .case_summaries(query.fecha_desde, query.fecha_hasta)
            .await?;
        Ok(aggregate(&summaries, query.fecha_desde, query.fecha_hasta))
    }
}
