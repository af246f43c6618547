//! In-memory intake store used by service and handler tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use super::models::{CaseListQuery, CaseSummary, PaginatedCases, Pagination};
use super::{DbError, IntakeStore, format_case_number};
use crate::model::{
    AffectedProduct, Attachment, Case, CaseDetail, CaseStatus, CaseStatusUpdate,
    ClassificationRecord, Client, Interaction, Message, MessageReceipt, NewAffectedProduct,
    NewAttachment, NewCase, NewClassificationRecord, NewClient, NewInteraction, NewMessage,
};

#[derive(Default)]
struct Tables {
    sequence: i64,
    clients: Vec<Client>,
    cases: Vec<Case>,
    products: Vec<AffectedProduct>,
    attachments: Vec<Attachment>,
    messages: Vec<Message>,
    interactions: Vec<Interaction>,
    classifications: Vec<ClassificationRecord>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn clients(&self) -> Vec<Client> {
        self.tables.lock().unwrap().clients.clone()
    }

    pub fn cases(&self) -> Vec<Case> {
        self.tables.lock().unwrap().cases.clone()
    }

    pub fn products(&self) -> Vec<AffectedProduct> {
        self.tables.lock().unwrap().products.clone()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.tables.lock().unwrap().attachments.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.tables.lock().unwrap().interactions.clone()
    }

    pub fn classifications(&self) -> Vec<ClassificationRecord> {
        self.tables.lock().unwrap().classifications.clone()
    }

    fn check(&self) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DbError::Connection(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn in_window(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
        from.is_none_or(|f| at >= f) && to.is_none_or(|t| at <= t)
    }
}

#[async_trait]
impl IntakeStore for InMemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        self.check()
    }

    async fn find_client_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, DbError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .clients
            .iter()
            .find(|c| c.active && c.data.tax_id == tax_id)
            .cloned())
    }

    async fn create_client(&self, client: &NewClient) -> Result<Client, DbError> {
        self.check()?;
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            data: client.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().clients.push(client.clone());
        Ok(client)
    }

    async fn create_case(&self, case: &NewCase) -> Result<Case, DbError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        tables.sequence += 1;
        let now = Utc::now();
        let case = Case {
            id: Uuid::new_v4(),
            case_number: format_case_number(now.year(), tables.sequence),
            data: case.clone(),
            status: CaseStatus::New,
            resolution: None,
            corrective_actions: None,
            preventive_actions: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.cases.push(case.clone());
        Ok(case)
    }

    async fn create_affected_product(
        &self,
        product: &NewAffectedProduct,
    ) -> Result<AffectedProduct, DbError> {
        self.check()?;
        let product = AffectedProduct {
            id: Uuid::new_v4(),
            data: product.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().products.push(product.clone());
        Ok(product)
    }

    async fn create_attachment(&self, attachment: &NewAttachment) -> Result<Attachment, DbError> {
        self.check()?;
        let attachment = Attachment {
            id: Uuid::new_v4(),
            data: attachment.clone(),
            created_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .attachments
            .push(attachment.clone());
        Ok(attachment)
    }

    async fn create_message(&self, message: &NewMessage) -> Result<Message, DbError> {
        self.check()?;
        let message = Message {
            id: Uuid::new_v4(),
            data: message.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().messages.push(message.clone());
        Ok(message)
    }

    async fn update_message_receipt(
        &self,
        external_id: &str,
        receipt: MessageReceipt,
    ) -> Result<u64, DbError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let mut updated = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.data.external_id.as_deref() == Some(external_id))
        {
            match receipt {
                MessageReceipt::Delivered(at) => {
                    message.data.delivered = true;
                    message.data.delivered_at = Some(at);
                }
                MessageReceipt::Read(at) => {
                    message.data.read = true;
                    message.data.read_at = Some(at);
                }
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn create_interaction(
        &self,
        interaction: &NewInteraction,
    ) -> Result<Interaction, DbError> {
        self.check()?;
        let interaction = Interaction {
            id: Uuid::new_v4(),
            data: interaction.clone(),
            created_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .interactions
            .push(interaction.clone());
        Ok(interaction)
    }

    async fn find_case_by_number(&self, case_number: &str) -> Result<Option<Case>, DbError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .cases
            .iter()
            .find(|c| c.case_number == case_number)
            .cloned())
    }

    async fn get_case_detail(&self, case_number: &str) -> Result<Option<CaseDetail>, DbError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let Some(case) = tables
            .cases
            .iter()
            .find(|c| c.case_number == case_number)
            .cloned()
        else {
            return Ok(None);
        };

        let id = case.id;
        let mut classifications: Vec<_> = tables
            .classifications
            .iter()
            .filter(|c| c.data.case_id == id)
            .cloned()
            .collect();
        classifications.reverse();

        Ok(Some(CaseDetail {
            client: tables
                .clients
                .iter()
                .find(|c| c.id == case.data.client_id)
                .cloned(),
            products: tables
                .products
                .iter()
                .filter(|p| p.data.case_id == id)
                .cloned()
                .collect(),
            attachments: tables
                .attachments
                .iter()
                .filter(|a| a.data.case_id == id)
                .cloned()
                .collect(),
            interactions: tables
                .interactions
                .iter()
                .filter(|i| i.data.case_id == id)
                .cloned()
                .collect(),
            messages: tables
                .messages
                .iter()
                .filter(|m| m.data.case_id == id)
                .cloned()
                .collect(),
            classifications,
            case,
        }))
    }

    async fn list_cases(&self, query: &CaseListQuery) -> Result<PaginatedCases, DbError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();

        // Newest first; insertion order breaks timestamp ties
        let matching: Vec<&Case> = tables
            .cases
            .iter()
            .rev()
            .filter(|c| query.case_type.is_none_or(|t| c.data.case_type == t))
            .filter(|c| query.criticality.is_none_or(|v| c.data.criticality == v))
            .filter(|c| query.status.is_none_or(|s| c.status == s))
            .filter(|c| query.client_id.is_none_or(|id| c.data.client_id == id))
            .filter(|c| Self::in_window(c.created_at, query.from, query.to))
            .collect();

        let data = matching
            .iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit() as usize)
            .map(|c| (*c).clone())
            .collect();

        Ok(PaginatedCases {
            data,
            pagination: Pagination::new(matching.len() as i64, query.page(), query.limit()),
        })
    }

    async fn reclassify_case(&self, record: &NewClassificationRecord) -> Result<Case, DbError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let case = tables
            .cases
            .iter_mut()
            .find(|c| c.id == record.case_id)
            .ok_or_else(|| DbError::NotFound(record.case_id.to_string()))?;

        case.data.case_type = record.case_type;
        case.data.criticality = record.criticality;
        case.data.justification = record.justification;
        case.updated_at = Utc::now();
        let case = case.clone();

        tables.classifications.push(ClassificationRecord {
            id: Uuid::new_v4(),
            data: record.clone(),
            created_at: Utc::now(),
        });
        Ok(case)
    }

    async fn update_case_status(
        &self,
        case_id: Uuid,
        update: &CaseStatusUpdate,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<Case, DbError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let case = tables
            .cases
            .iter_mut()
            .find(|c| c.id == case_id)
            .ok_or_else(|| DbError::NotFound(case_id.to_string()))?;

        case.status = update.status;
        if update.resolution.is_some() {
            case.resolution = update.resolution.clone();
        }
        if update.corrective_actions.is_some() {
            case.corrective_actions = update.corrective_actions.clone();
        }
        if update.preventive_actions.is_some() {
            case.preventive_actions = update.preventive_actions.clone();
        }
        if closed_at.is_some() {
            case.closed_at = closed_at;
        }
        case.updated_at = Utc::now();
        Ok(case.clone())
    }

    async fn case_summaries(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CaseSummary>, DbError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .cases
            .iter()
            .filter(|c| Self::in_window(c.created_at, from, to))
            .map(|c| CaseSummary {
                case_type: c.data.case_type,
                criticality: c.data.criticality,
                status: c.status,
            })
            .collect())
    }
}
