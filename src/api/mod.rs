pub mod handlers;

pub use handlers::*;

use crate::db::ImportRepository;
use crate::service::PmsImporter;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;

/// 构建路由
pub fn router<R: ImportRepository + 'static>(importer: Arc<PmsImporter<R>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/import/pms", post(import_document::<R>))
        .route("/api/import/pms/batch", post(import_batch::<R>))
        .route("/api/import/pms/preview", post(preview_document::<R>))
        .with_state(importer)
}
