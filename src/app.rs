//! Application state and service initialization
//!
//! This module centralizes service construction so `main` and the tests
//! wire handlers the same way.

use std::sync::Arc;

use actix_web::web;

use crate::db::{IntakeStore, PgIntakeStore};
use crate::model::Config;
use crate::service::{CaseService, IntakeService, WebhookService};

/// Process-wide facts reported by the liveness probe
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub environment: String,
}

/// Application state containing all services and shared resources
#[derive(Clone)]
pub struct AppState {
    /// Persistence shared by every service
    pub store: web::Data<dyn IntakeStore>,
    pub intake_service: web::Data<IntakeService>,
    pub case_service: web::Data<CaseService>,
    pub webhook_service: web::Data<WebhookService>,
    pub runtime: web::Data<RuntimeInfo>,
}

impl AppState {
    /// Connect to PostgreSQL, create the schema and build the services
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let pool = crate::db::create_pool(&config.database)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        Self::with_store(Arc::new(PgIntakeStore::new(pool)), config)
    }

    /// Build the services on top of an existing store
    pub fn with_store(store: Arc<dyn IntakeStore>, config: &Config) -> Result<Self, AppError> {
        let verify = config.webhook.verify_signature;
        if verify && config.webhook_secret.is_none() {
            tracing::warn!(
                "INTAKE_WEBHOOK_SECRET is not set, every webhook delivery will be rejected"
            );
        }

        Ok(Self {
            intake_service: web::Data::new(IntakeService::new(Arc::clone(&store))),
            case_service: web::Data::new(CaseService::new(Arc::clone(&store))),
            webhook_service: web::Data::new(WebhookService::new(
                Arc::clone(&store),
                config.webhook_secret.clone(),
                verify,
            )),
            runtime: web::Data::new(RuntimeInfo {
                environment: config.environment.clone(),
            }),
            store: web::Data::from(store),
        })
    }

    /// Register every shared value on an actix `App`
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.store.clone())
            .app_data(self.intake_service.clone())
            .app_data(self.case_service.clone())
            .app_data(self.webhook_service.clone())
            .app_data(self.runtime.clone());
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::db::memory::InMemoryStore;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.environment = "test".to_string();
        config.webhook.verify_signature = false;
        config
    }

    #[actix_web::test]
    async fn test_full_application_wiring() {
        let state = AppState::with_store(Arc::new(InMemoryStore::new()), &test_config()).unwrap();
        let app = test::init_service(
            App::new()
                .configure(|cfg| state.register(cfg))
                .configure(crate::api::configure)
                .default_service(web::to(crate::api::not_found)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["environment"], json!("test"));

        let req = test::TestRequest::get().uri("/health/ready").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/webhooks/kapso")
            .set_payload(r#"{"event":"message.sent","data":{}}"#)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/openapi.json").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/no/such/route").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Endpoint no encontrado"}));
    }

    #[actix_web::test]
    async fn test_webhook_requires_signature_by_default() {
        let mut config = test_config();
        config.webhook.verify_signature = true;
        let state = AppState::with_store(Arc::new(InMemoryStore::new()), &config).unwrap();
        let app = test::init_service(
            App::new()
                .configure(|cfg| state.register(cfg))
                .configure(crate::api::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/webhooks/kapso")
            .set_payload(r#"{"event":"message.sent","data":{}}"#)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
