//! Database module for PostgreSQL persistence

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::model::{
    AffectedProduct, Attachment, Case, CaseDetail, CaseStatusUpdate, Client, DatabaseConfig,
    Interaction, Message, MessageReceipt, NewAffectedProduct, NewAttachment, NewCase,
    NewClassificationRecord, NewClient, NewInteraction, NewMessage,
};
use models::{CaseListQuery, CaseSummary, PaginatedCases};

pub use repository::PgIntakeStore;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Human-facing case number, `CASO-2026-000042`
pub fn format_case_number(year: i32, sequence: i64) -> String {
    format!("CASO-{}-{:06}", year, sequence)
}

/// Persistence operations needed by the intake flow and the case API
#[async_trait]
pub trait IntakeStore: Send + Sync {
    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> Result<(), DbError>;

    /// Active client with the given normalized tax id
    async fn find_client_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, DbError>;
    async fn create_client(&self, client: &NewClient) -> Result<Client, DbError>;

    /// Insert a case with a freshly allocated case number and status `nuevo`
    async fn create_case(&self, case: &NewCase) -> Result<Case, DbError>;
    async fn create_affected_product(
        &self,
        product: &NewAffectedProduct,
    ) -> Result<AffectedProduct, DbError>;
    async fn create_attachment(&self, attachment: &NewAttachment) -> Result<Attachment, DbError>;

    async fn create_message(&self, message: &NewMessage) -> Result<Message, DbError>;
    /// Record a delivery receipt; returns how many stored messages matched
    async fn update_message_receipt(
        &self,
        external_id: &str,
        receipt: MessageReceipt,
    ) -> Result<u64, DbError>;
    async fn create_interaction(&self, interaction: &NewInteraction)
    -> Result<Interaction, DbError>;

    async fn find_case_by_number(&self, case_number: &str) -> Result<Option<Case>, DbError>;
    async fn get_case_detail(&self, case_number: &str) -> Result<Option<CaseDetail>, DbError>;
    async fn list_cases(&self, query: &CaseListQuery) -> Result<PaginatedCases, DbError>;

    /// Apply a new classification and append it to the history, atomically
    async fn reclassify_case(&self, record: &NewClassificationRecord) -> Result<Case, DbError>;
    async fn update_case_status(
        &self,
        case_id: Uuid,
        update: &CaseStatusUpdate,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<Case, DbError>;

    /// Classification and status of every case created in the window
    async fn case_summaries(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CaseSummary>, DbError>;
}

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    tracing::debug!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url())
        .await?;

    tracing::info!(host = %config.host, port = config.port, "PostgreSQL connection established");

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clientes (
        id UUID PRIMARY KEY,
        nombre_apellido TEXT NOT NULL,
        razon_social TEXT NOT NULL,
        cuit VARCHAR(13) NOT NULL,
        direccion_calle TEXT NOT NULL,
        direccion_numero TEXT,
        localidad TEXT NOT NULL,
        provincia TEXT NOT NULL,
        telefono VARCHAR(20) NOT NULL,
        email TEXT,
        whatsapp_number TEXT,
        activo BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE SEQUENCE IF NOT EXISTS casos_numero_seq",
    r#"
    CREATE TABLE IF NOT EXISTS casos (
        id UUID PRIMARY KEY,
        numero_caso VARCHAR(32) NOT NULL UNIQUE,
        cliente_id UUID NOT NULL REFERENCES clientes(id),
        colaborador_registro_id UUID,
        tipo_usuario_registro VARCHAR(32) NOT NULL,
        tipo_caso VARCHAR(32) NOT NULL,
        criticidad VARCHAR(16) NOT NULL,
        justificacion VARCHAR(32) NOT NULL,
        canal VARCHAR(16) NOT NULL,
        estado VARCHAR(32) NOT NULL DEFAULT 'nuevo',
        descripcion_que_sucedio TEXT NOT NULL,
        descripcion_donde_ocurrio TEXT,
        descripcion_cuando_ocurrio TIMESTAMPTZ,
        descripcion_libre TEXT,
        numero_remito TEXT NOT NULL,
        resolucion TEXT,
        acciones_correctivas TEXT,
        acciones_preventivas TEXT,
        fecha_cierre TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS productos_afectados (
        id UUID PRIMARY KEY,
        caso_id UUID NOT NULL REFERENCES casos(id) ON DELETE CASCADE,
        nombre_producto TEXT NOT NULL,
        presentacion TEXT NOT NULL,
        numero_lote TEXT NOT NULL,
        fecha_vencimiento DATE NOT NULL,
        estado_producto VARCHAR(16),
        cantidad_afectada INTEGER NOT NULL,
        unidad_medida TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS adjuntos (
        id UUID PRIMARY KEY,
        caso_id UUID NOT NULL REFERENCES casos(id) ON DELETE CASCADE,
        tipo_adjunto VARCHAR(16) NOT NULL,
        url_original TEXT,
        nombre_archivo TEXT NOT NULL,
        procesado BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS interacciones (
        id UUID PRIMARY KEY,
        caso_id UUID NOT NULL REFERENCES casos(id) ON DELETE CASCADE,
        session_id TEXT,
        flow_id TEXT,
        tipo_interaccion TEXT NOT NULL,
        nodo_inicio TEXT,
        nodo_fin TEXT,
        duracion_segundos INTEGER,
        completada BOOLEAN NOT NULL DEFAULT FALSE,
        error_ocurrido BOOLEAN NOT NULL DEFAULT FALSE,
        error_detalle TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS mensajes (
        id UUID PRIMARY KEY,
        caso_id UUID NOT NULL REFERENCES casos(id) ON DELETE CASCADE,
        interaccion_id UUID REFERENCES interacciones(id),
        mensaje_id_externo TEXT,
        es_entrante BOOLEAN NOT NULL,
        remitente_numero TEXT,
        destinatario_numero TEXT,
        tipo_mensaje TEXT NOT NULL,
        contenido TEXT,
        contenido_estructurado JSONB,
        entregado BOOLEAN NOT NULL DEFAULT FALSE,
        leido BOOLEAN NOT NULL DEFAULT FALSE,
        error BOOLEAN NOT NULL DEFAULT FALSE,
        error_detalle TEXT,
        timestamp_envio TIMESTAMPTZ,
        timestamp_entrega TIMESTAMPTZ,
        timestamp_lectura TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clasificaciones (
        id UUID PRIMARY KEY,
        caso_id UUID NOT NULL REFERENCES casos(id) ON DELETE CASCADE,
        tipo_caso_anterior VARCHAR(32),
        tipo_caso_nuevo VARCHAR(32) NOT NULL,
        criticidad_anterior VARCHAR(16),
        criticidad_nueva VARCHAR(16) NOT NULL,
        justificacion_anterior VARCHAR(32),
        justificacion_nueva VARCHAR(32) NOT NULL,
        clasificado_por UUID,
        clasificacion_automatica BOOLEAN NOT NULL DEFAULT FALSE,
        motivo TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_clientes_cuit ON clientes(cuit)",
    "CREATE INDEX IF NOT EXISTS idx_casos_cliente_id ON casos(cliente_id)",
    "CREATE INDEX IF NOT EXISTS idx_casos_created_at ON casos(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_mensajes_externo ON mensajes(mensaje_id_externo)",
    "CREATE INDEX IF NOT EXISTS idx_clasificaciones_caso_id ON clasificaciones(caso_id)",
];

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = SCHEMA.len(), "Database schema initialized");

    Ok(())
}
