//! PostgreSQL implementation of the intake store

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    AffectedProductRow, AttachmentRow, CaseListQuery, CaseRow, CaseSummary, CaseSummaryRow,
    ClassificationRow, ClientRow, InteractionRow, MessageRow, PaginatedCases, Pagination,
};
use super::{DbError, IntakeStore, format_case_number};
use crate::model::{
    AffectedProduct, Attachment, Case, CaseDetail, CaseStatus, CaseStatusUpdate, Client,
    Interaction, Message, MessageReceipt, NewAffectedProduct, NewAttachment, NewCase,
    NewClassificationRecord, NewClient, NewInteraction, NewMessage,
};

/// Intake store backed by a Postgres pool
#[derive(Clone)]
pub struct PgIntakeStore {
    pool: PgPool,
}

impl PgIntakeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn case_by_id(&self, id: Uuid) -> Result<Case, DbError> {
        let row: CaseRow = sqlx::query_as("SELECT * FROM casos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        row.into_domain()
    }
}

#[async_trait]
impl IntakeStore for PgIntakeStore {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_client_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, DbError> {
        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT * FROM clientes WHERE cuit = $1 AND activo = TRUE
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    async fn create_client(&self, client: &NewClient) -> Result<Client, DbError> {
        let row: ClientRow = sqlx::query_as(
            r#"
            INSERT INTO clientes (
                id, nombre_apellido, razon_social, cuit, direccion_calle, direccion_numero,
                localidad, provincia, telefono, email, whatsapp_number, activo
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&client.full_name)
        .bind(&client.business_name)
        .bind(&client.tax_id)
        .bind(&client.street)
        .bind(&client.street_number)
        .bind(&client.locality)
        .bind(&client.province)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.whatsapp_number)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(client_id = %row.id, "Inserted client");
        Ok(row.into())
    }

    async fn create_case(&self, case: &NewCase) -> Result<Case, DbError> {
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('casos_numero_seq')")
            .fetch_one(&self.pool)
            .await?;
        let case_number = format_case_number(Utc::now().year(), sequence);

        let row: CaseRow = sqlx::query_as(
            r#"
            INSERT INTO casos (
                id, numero_caso, cliente_id, colaborador_registro_id, tipo_usuario_registro,
                tipo_caso, criticidad, justificacion, canal, estado,
                descripcion_que_sucedio, descripcion_donde_ocurrio, descripcion_cuando_ocurrio,
                descripcion_libre, numero_remito
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&case_number)
        .bind(case.client_id)
        .bind(case.registered_by_staff_id)
        .bind(case.registrant_type.as_str())
        .bind(case.case_type.as_str())
        .bind(case.criticality.as_str())
        .bind(case.justification.as_str())
        .bind(case.channel.as_str())
        .bind(CaseStatus::New.as_str())
        .bind(&case.incident_description)
        .bind(&case.incident_location)
        .bind(case.incident_date)
        .bind(&case.freeform_notes)
        .bind(&case.delivery_note_number)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(case_number = %case_number, "Inserted case");
        row.into_domain()
    }

    async fn create_affected_product(
        &self,
        product: &NewAffectedProduct,
    ) -> Result<AffectedProduct, DbError> {
        let row: AffectedProductRow = sqlx::query_as(
            r#"
            INSERT INTO productos_afectados (
                id, caso_id, nombre_producto, presentacion, numero_lote, fecha_vencimiento,
                estado_producto, cantidad_afectada, unidad_medida
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.case_id)
        .bind(&product.product_name)
        .bind(&product.presentation)
        .bind(&product.lot_number)
        .bind(product.expiry_date)
        .bind(product.product_state.map(|s| s.as_str()))
        .bind(product.affected_quantity)
        .bind(&product.unit)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn create_attachment(&self, attachment: &NewAttachment) -> Result<Attachment, DbError> {
        let row: AttachmentRow = sqlx::query_as(
            r#"
            INSERT INTO adjuntos (id, caso_id, tipo_adjunto, url_original, nombre_archivo, procesado)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(attachment.case_id)
        .bind(attachment.attachment_type.as_str())
        .bind(&attachment.original_url)
        .bind(&attachment.file_name)
        .bind(attachment.processed)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn create_message(&self, message: &NewMessage) -> Result<Message, DbError> {
        let row: MessageRow = sqlx::query_as(
            r#"
            INSERT INTO mensajes (
                id, caso_id, interaccion_id, mensaje_id_externo, es_entrante,
                remitente_numero, destinatario_numero, tipo_mensaje, contenido,
                contenido_estructurado, entregado, leido, error, error_detalle,
                timestamp_envio, timestamp_entrega, timestamp_lectura
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.case_id)
        .bind(message.interaction_id)
        .bind(&message.external_id)
        .bind(message.inbound)
        .bind(&message.sender_number)
        .bind(&message.recipient_number)
        .bind(&message.message_type)
        .bind(&message.content)
        .bind(&message.structured_content)
        .bind(message.delivered)
        .bind(message.read)
        .bind(message.error)
        .bind(&message.error_detail)
        .bind(message.sent_at)
        .bind(message.delivered_at)
        .bind(message.read_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_message_receipt(
        &self,
        external_id: &str,
        receipt: MessageReceipt,
    ) -> Result<u64, DbError> {
        let (sql, at) = match receipt {
            MessageReceipt::Delivered(at) => (
                "UPDATE mensajes SET entregado = TRUE, timestamp_entrega = $2 WHERE mensaje_id_externo = $1",
                at,
            ),
            MessageReceipt::Read(at) => (
                "UPDATE mensajes SET leido = TRUE, timestamp_lectura = $2 WHERE mensaje_id_externo = $1",
                at,
            ),
        };

        let result = sqlx::query(sql)
            .bind(external_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn create_interaction(
        &self,
        interaction: &NewInteraction,
    ) -> Result<Interaction, DbError> {
        let row: InteractionRow = sqlx::query_as(
            r#"
            INSERT INTO interacciones (
                id, caso_id, session_id, flow_id, tipo_interaccion, nodo_inicio, nodo_fin,
                duracion_segundos, completada, error_ocurrido, error_detalle
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(interaction.case_id)
        .bind(&interaction.session_id)
        .bind(&interaction.flow_id)
        .bind(&interaction.interaction_type)
        .bind(&interaction.start_node)
        .bind(&interaction.end_node)
        .bind(interaction.duration_seconds)
        .bind(interaction.completed)
        .bind(interaction.error_occurred)
        .bind(&interaction.error_detail)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_case_by_number(&self, case_number: &str) -> Result<Option<Case>, DbError> {
        let row: Option<CaseRow> = sqlx::query_as("SELECT * FROM casos WHERE numero_caso = $1")
            .bind(case_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CaseRow::into_domain).transpose()
    }

    async fn get_case_detail(&self, case_number: &str) -> Result<Option<CaseDetail>, DbError> {
        let Some(case) = self.find_case_by_number(case_number).await? else {
            return Ok(None);
        };

        let client: Option<ClientRow> = sqlx::query_as("SELECT * FROM clientes WHERE id = $1")
            .bind(case.data.client_id)
            .fetch_optional(&self.pool)
            .await?;

        let products: Vec<AffectedProductRow> = sqlx::query_as(
            "SELECT * FROM productos_afectados WHERE caso_id = $1 ORDER BY created_at",
        )
        .bind(case.id)
        .fetch_all(&self.pool)
        .await?;

        let attachments: Vec<AttachmentRow> =
            sqlx::query_as("SELECT * FROM adjuntos WHERE caso_id = $1 ORDER BY created_at")
                .bind(case.id)
                .fetch_all(&self.pool)
                .await?;

        let interactions: Vec<InteractionRow> =
            sqlx::query_as("SELECT * FROM interacciones WHERE caso_id = $1 ORDER BY created_at")
                .bind(case.id)
                .fetch_all(&self.pool)
                .await?;

        let messages: Vec<MessageRow> =
            sqlx::query_as("SELECT * FROM mensajes WHERE caso_id = $1 ORDER BY created_at")
                .bind(case.id)
                .fetch_all(&self.pool)
                .await?;

        let classifications: Vec<ClassificationRow> = sqlx::query_as(
            "SELECT * FROM clasificaciones WHERE caso_id = $1 ORDER BY created_at DESC",
        )
        .bind(case.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(CaseDetail {
            case,
            client: client.map(Client::from),
            products: products
                .into_iter()
                .map(AffectedProductRow::into_domain)
                .collect::<Result<_, _>>()?,
            attachments: attachments
                .into_iter()
                .map(AttachmentRow::into_domain)
                .collect::<Result<_, _>>()?,
            interactions: interactions.into_iter().map(Interaction::from).collect(),
            messages: messages.into_iter().map(Message::from).collect(),
            classifications: classifications
                .into_iter()
                .map(ClassificationRow::into_domain)
                .collect::<Result<_, _>>()?,
        }))
    }

    async fn list_cases(&self, query: &CaseListQuery) -> Result<PaginatedCases, DbError> {
        let page = query.page();
        let limit = query.limit();

        // Build dynamic query; every parameter is bound as text and cast in SQL
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(case_type) = query.case_type {
            params.push(case_type.as_str().to_string());
            conditions.push(format!("tipo_caso = ${}", params.len()));
        }
        if let Some(criticality) = query.criticality {
            params.push(criticality.as_str().to_string());
            conditions.push(format!("criticidad = ${}", params.len()));
        }
        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("estado = ${}", params.len()));
        }
        if let Some(from) = query.from {
            params.push(from.to_rfc3339());
            conditions.push(format!("created_at >= ${}::timestamptz", params.len()));
        }
        if let Some(to) = query.to {
            params.push(to.to_rfc3339());
            conditions.push(format!("created_at <= ${}::timestamptz", params.len()));
        }
        if let Some(client_id) = query.client_id {
            params.push(client_id.to_string());
            conditions.push(format!("cliente_id = ${}::uuid", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM casos {}", where_clause);
        let total: i64 = {
            let mut q = sqlx::query_scalar(&count_query);
            for param in &params {
                q = q.bind(param);
            }
            q.fetch_one(&self.pool).await?
        };

        let select_query = format!(
            r#"
            SELECT * FROM casos
            {}
            ORDER BY created_at DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause,
            limit,
            query.offset()
        );
        let rows: Vec<CaseRow> = {
            let mut q = sqlx::query_as(&select_query);
            for param in &params {
                q = q.bind(param);
            }
            q.fetch_all(&self.pool).await?
        };

        let data = rows
            .into_iter()
            .map(CaseRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedCases {
            data,
            pagination: Pagination::new(total, page, limit),
        })
    }

    async fn reclassify_case(&self, record: &NewClassificationRecord) -> Result<Case, DbError> {
        let mut tx = self.pool.begin().await?;

        let row: CaseRow = sqlx::query_as(
            r#"
            UPDATE casos
            SET tipo_caso = $2, criticidad = $3, justificacion = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record.case_id)
        .bind(record.case_type.as_str())
        .bind(record.criticality.as_str())
        .bind(record.justification.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::NotFound(record.case_id.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO clasificaciones (
                id, caso_id, tipo_caso_anterior, tipo_caso_nuevo, criticidad_anterior,
                criticidad_nueva, justificacion_anterior, justificacion_nueva,
                clasificado_por, clasificacion_automatica, motivo
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.case_id)
        .bind(record.previous_case_type.map(|t| t.as_str()))
        .bind(record.case_type.as_str())
        .bind(record.previous_criticality.map(|c| c.as_str()))
        .bind(record.criticality.as_str())
        .bind(record.previous_justification.map(|j| j.as_str()))
        .bind(record.justification.as_str())
        .bind(record.classified_by)
        .bind(record.automatic)
        .bind(&record.reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(case_id = %record.case_id, "Case reclassified");
        row.into_domain()
    }

    async fn update_case_status(
        &self,
        case_id: Uuid,
        update: &CaseStatusUpdate,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<Case, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE casos
            SET estado = $2,
                resolucion = COALESCE($3, resolucion),
                acciones_correctivas = COALESCE($4, acciones_correctivas),
                acciones_preventivas = COALESCE($5, acciones_preventivas),
                fecha_cierre = COALESCE($6, fecha_cierre),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(case_id)
        .bind(update.status.as_str())
        .bind(&update.resolution)
        .bind(&update.corrective_actions)
        .bind(&update.preventive_actions)
        .bind(closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(case_id.to_string()));
        }

        self.case_by_id(case_id).await
    }

    async fn case_summaries(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CaseSummary>, DbError> {
        let rows: Vec<CaseSummaryRow> = sqlx::query_as(
            r#"
            SELECT tipo_caso, criticidad, estado FROM casos
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CaseSummaryRow::into_domain).collect()
    }
}
