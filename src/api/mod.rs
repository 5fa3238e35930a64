pub mod handlers;

pub use handlers::*;

use crate::service::AuditDesk;
use axum::{
    routing::{get, post},
    Router,
};

/// 控制台 API 路由
pub fn router(desk: AuditDesk) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/queue", get(get_queue))
        .route("/api/queue/refresh", post(refresh_queue))
        .route("/api/invoices/:invoice_id/audit", post(start_audit))
        .route("/api/session", get(get_session).delete(clear_session))
        .route("/api/session/approve", post(approve_session))
        .route("/api/session/dispute", post(dispute_session))
        .with_state(desk)
}
