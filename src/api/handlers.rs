use crate::db::ImportRepository;
use crate::error::ImportError;
use crate::models::{DocumentImportResult, ParsedDocument};
use crate::parser::parse_document_with;
use crate::service::PmsImporter;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 已从 PDF 提取的文本
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub text: String,
}

/// 请求体: 多份文档文本
#[derive(Debug, Deserialize)]
pub struct BatchImportRequest {
    pub documents: Vec<String>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub result: Option<DocumentImportResult>,
}

#[derive(Debug, Serialize)]
pub struct BatchImportResponse {
    pub success: bool,
    pub message: String,
    pub documents: Vec<ImportResponse>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub message: String,
    pub document: Option<ParsedDocument>,
}

impl ImportError {
    fn status_code(&self) -> StatusCode {
        match self {
            ImportError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ImportError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        let response = ImportResponse {
            success: false,
            message: format!("Error: {}", self),
            result: None,
        };
        (self.status_code(), Json(response)).into_response()
    }
}

fn import_response(result: Result<DocumentImportResult, ImportError>) -> ImportResponse {
    match result {
        Ok(result) => ImportResponse {
            success: true,
            message: format!(
                "Imported {} of {} visits ({} skipped, {} failed)",
                result.imported, result.total_visits, result.skipped, result.failed
            ),
            result: Some(result),
        },
        Err(e) => ImportResponse {
            success: false,
            message: format!("Error: {}", e),
            result: None,
        },
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 导入单份文档
pub async fn import_document<R: ImportRepository + 'static>(
    State(importer): State<Arc<PmsImporter<R>>>,
    Json(req): Json<ImportRequest>,
) -> Response {
    match importer.import_text(&req.text).await {
        Ok(result) => (StatusCode::OK, Json(import_response(Ok(result)))).into_response(),
        Err(e) => {
            tracing::warn!("Document import rejected: {}", e);
            e.into_response()
        }
    }
}

/// 批量导入, 每份文档独立返回结果
pub async fn import_batch<R: ImportRepository + 'static>(
    State(importer): State<Arc<PmsImporter<R>>>,
    Json(req): Json<BatchImportRequest>,
) -> Response {
    let results = importer.import_batch(&req.documents).await;
    let documents: Vec<ImportResponse> = results.into_iter().map(import_response).collect();
    let accepted = documents.iter().filter(|d| d.success).count();

    let response = BatchImportResponse {
        success: accepted == documents.len(),
        message: format!("{} of {} documents imported", accepted, documents.len()),
        documents,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 仅解析, 不访问数据库
pub async fn preview_document<R: ImportRepository + 'static>(
    State(importer): State<Arc<PmsImporter<R>>>,
    Json(req): Json<ImportRequest>,
) -> Response {
    match parse_document_with(&req.text, importer.parse_options()) {
        Ok(document) => {
            let response = PreviewResponse {
                success: true,
                message: format!("Parsed {} visits", document.visits.len()),
                document: Some(document),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = PreviewResponse {
                success: false,
                message: format!("Error: {}", e),
                document: None,
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::parser::ParseOptions;
    use crate::service::StaffDirectory;

    const DOC: &str = "For Max (P1)\nOwner Jane Tan (C1)\nMobile 9123 4567\n\
        Bill No: 1/100 Date: 5/6/2024\n[HL]\nHL 1 Consultation Fee $150\n";

    fn state() -> State<Arc<PmsImporter<MemoryRepository>>> {
        let repo = MemoryRepository::new();
        let client = repo.add_client("Jane Tan", "91234567");
        repo.add_patient(client, "Max");
        State(Arc::new(PmsImporter::new(repo, StaffDirectory::default(), ParseOptions::default())))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn import_returns_result() {
        let response = import_document(state(), Json(ImportRequest { text: DOC.to_string() })).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["imported"], 1);
        assert_eq!(body["result"]["clientFound"], true);
    }

    #[tokio::test]
    async fn missing_header_is_unprocessable() {
        let response = import_document(state(), Json(ImportRequest { text: "Bill No: 1/1 Date: 1/1/2024".to_string() })).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn batch_reports_each_document() {
        let request = BatchImportRequest { documents: vec![DOC.to_string(), "garbage".to_string()] };
        let response = import_batch(state(), Json(request)).await;
        let body = body_json(response).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["documents"][0]["success"], true);
        assert_eq!(body["documents"][1]["success"], false);
    }

    #[tokio::test]
    async fn preview_does_not_write() {
        let state = state();
        let importer = state.0.clone();
        let response = preview_document(state, Json(ImportRequest { text: DOC.to_string() })).await;
        let body = body_json(response).await;

        assert_eq!(body["document"]["ownerPhone"], "91234567");
        assert_eq!(body["document"]["visits"][0]["billNumber"], "1/100");
        assert_eq!(importer.repository().row_counts().invoices, 0);
    }
}
