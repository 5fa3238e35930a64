use crate::models::{InvoiceStatus, SourceMode};
use crate::service::{AuditDesk, AuditSession, RefreshReport, SessionError, SessionId, StatusFilter};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// 队列查询参数
#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

/// 刷新响应体
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub mode: SourceMode,
}

/// 启动审核响应体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAuditResponse {
    pub success: bool,
    pub session_id: SessionId,
}

/// 决策响应体
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub success: bool,
    pub status: InvoiceStatus,
}

fn failure(code: StatusCode, message: impl Into<String>) -> Response {
    let response = ApiResponse {
        success: false,
        message: message.into(),
    };
    (code, Json(response)).into_response()
}

fn session_error(e: SessionError) -> Response {
    let code = match e {
        SessionError::UnknownInvoice(_) => StatusCode::NOT_FOUND,
        SessionError::NotReady(_) | SessionError::InvalidTransition { .. } => StatusCode::CONFLICT,
    };
    failure(code, e.to_string())
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 当前队列 (筛选 + 搜索)
pub async fn get_queue(State(desk): State<AuditDesk>, Query(q): Query<QueueQuery>) -> Response {
    let filter = match q.status.as_deref().unwrap_or("All").parse::<StatusFilter>() {
        Ok(f) => f,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e),
    };
    let view = desk.query(filter, q.search.as_deref().unwrap_or("")).await;
    (StatusCode::OK, Json(view)).into_response()
}

/// 手动刷新；后端不可用时降级为模拟数据，接口本身总是成功
pub async fn refresh_queue(State(desk): State<AuditDesk>) -> Response {
    let RefreshReport { mode, outcome } = desk.refresh_report().await;

    let response = match outcome {
        Ok(()) => RefreshResponse {
            success: true,
            message: "Queue synchronized from backend".to_string(),
            mode,
        },
        Err(e) => RefreshResponse {
            success: false,
            message: format!("Backend unavailable, showing simulated queue: {}", e),
            mode,
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 选中发票并启动审核
pub async fn start_audit(State(desk): State<AuditDesk>, Path(invoice_id): Path<String>) -> Response {
    match desk.select(&invoice_id).await {
        Ok(session_id) => {
            let response = StartAuditResponse {
                success: true,
                session_id,
            };
            (StatusCode::ACCEPTED, Json(response)).into_response()
        }
        Err(e) => session_error(e),
    }
}

pub async fn get_session(State(desk): State<AuditDesk>) -> Json<AuditSession> {
    Json(desk.session())
}

pub async fn clear_session(State(desk): State<AuditDesk>) -> StatusCode {
    desk.clear_selection();
    StatusCode::NO_CONTENT
}

pub async fn approve_session(State(desk): State<AuditDesk>) -> Response {
    decision_response(desk.approve().await)
}

pub async fn dispute_session(State(desk): State<AuditDesk>) -> Response {
    decision_response(desk.dispute().await)
}

fn decision_response(outcome: Result<InvoiceStatus, SessionError>) -> Response {
    match outcome {
        Ok(status) => {
            let response = DecisionResponse {
                success: true,
                status,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => session_error(e),
    }
}
