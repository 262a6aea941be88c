pub mod extract;
pub mod handlers;

use crate::service::DeskService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// 上传文档大小上限
pub const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

pub fn router(desk: Arc<DeskService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/queues", get(handlers::list_queues))
        .route("/api/sessions", post(handlers::open_session))
        .route(
            "/api/sessions/:id",
            get(handlers::page_view).delete(handlers::close_session),
        )
        .route("/api/sessions/:id/sort", post(handlers::sort))
        .route("/api/sessions/:id/page", post(handlers::go_to_page))
        .route("/api/sessions/:id/expand", post(handlers::toggle_expand))
        .route("/api/sessions/:id/filter", post(handlers::set_filter))
        .route("/api/sessions/:id/refresh", post(handlers::refresh))
        .route("/api/sessions/:id/export", get(handlers::export))
        .route(
            "/api/invoices/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/api/invoices/:id/approve", post(handlers::approve))
        .route("/api/invoices/:id/decline", post(handlers::decline))
        .route("/api/invoices/:id/resubmit", post(handlers::resubmit))
        .with_state(desk)
}
