use crate::config::MatchingConfig;
use crate::error::RecError;
use crate::models::{
    AliasDictionary, MatchResult, Receivable, ReconciliationReport, RunStats, TransactionRecord,
};
use crate::service::{NameResolver, ReconciliationEngine, TransactionPool};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 流水、应收、字典，可选覆盖容差
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub transactions: Vec<TransactionRecord>,
    pub receivables: Vec<Receivable>,
    #[serde(default)]
    pub dictionary: serde_json::Map<String, serde_json::Value>,
    pub tolerance: Option<BigDecimal>,
}

/// 响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub results: Option<Vec<MatchResult>>,
    pub stats: Option<RunStats>,
}

impl ReconcileResponse {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            results: None,
            stats: None,
        }
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 对账接口
pub async fn reconcile(
    State(matching): State<Arc<MatchingConfig>>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Response {
    // 请求体解析失败同样返回 {success, message}
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            tracing::warn!("Rejected reconcile request body: {}", rejection.body_text());
            let response = ReconcileResponse::failure(format!("Error: {}", rejection.body_text()));
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let mut config = (*matching).clone();
    if let Some(tolerance) = req.tolerance.clone() {
        config.tolerance = Some(tolerance);
    }

    // 子集和搜索为 CPU 密集型，放到阻塞线程池执行
    let outcome = tokio::task::spawn_blocking(move || run_request(req, &config)).await;

    match outcome {
        Ok(Ok(report)) => {
            let message = format!(
                "Reconciled {} receivables: {} matched, {} unmatched",
                report.stats.total,
                report.stats.matched(),
                report.stats.unmatched
            );
            let response = ReconcileResponse {
                success: true,
                message,
                results: Some(report.results),
                stats: Some(report.stats),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => {
            let status = if e.is_input_error() {
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!("Reconciliation failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(ReconcileResponse::failure(format!("Error: {}", e)))).into_response()
        }
        Err(e) => {
            tracing::error!("Reconciliation task panicked: {}", e);
            let response = ReconcileResponse::failure(format!("Error: {}", e));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

fn run_request(req: ReconcileRequest, config: &MatchingConfig) -> Result<ReconciliationReport, RecError> {
    let dictionary = AliasDictionary::from_json_map(&req.dictionary)?;
    let resolver = NameResolver::from_dictionary(&dictionary)?;
    let pool = TransactionPool::new(req.transactions);

    let receivables: Vec<Receivable> = req
        .receivables
        .into_iter()
        .filter(Receivable::is_billable)
        .collect();

    let mut engine = ReconciliationEngine::new(resolver, pool, config)?;
    engine.reconcile(&receivables)
}
