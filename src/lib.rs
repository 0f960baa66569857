pub mod audit;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::audit::{AuditRecorder, AuditSettings, EventBus};
use crate::services::{
    attachment_service::AttachmentService,
    classification_service::ClassificationService,
    comment_service::CommentService,
    entity_fetcher::PgEntityFetcher,
    operation_store::{OperationStore, PgOperationStore},
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub recorder: Arc<AuditRecorder>,
    pub operation_store: Arc<dyn OperationStore>,
    pub classification_service: ClassificationService,
    pub attachment_service: AttachmentService,
    pub comment_service: CommentService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let store: Arc<dyn OperationStore> = Arc::new(PgOperationStore::new(pool.clone()));
        Self::with_store(pool, store, config.audit_settings())
    }

    /// Wires the services against an arbitrary operation store. The audit
    /// recorder is the only lifecycle listener.
    pub fn with_store(
        pool: PgPool,
        operation_store: Arc<dyn OperationStore>,
        settings: AuditSettings,
    ) -> Self {
        let fetcher = Arc::new(PgEntityFetcher::new(pool.clone()));
        let recorder = Arc::new(AuditRecorder::new(
            operation_store.clone(),
            fetcher,
            settings,
        ));
        let events = EventBus::new().with_listener(recorder.clone());

        let classification_service = ClassificationService::new(pool.clone(), events.clone());
        let attachment_service = AttachmentService::new(pool.clone(), events.clone());
        let comment_service = CommentService::new(pool.clone(), events);

        Self {
            pool,
            recorder,
            operation_store,
            classification_service,
            attachment_service,
            comment_service,
        }
    }
}
