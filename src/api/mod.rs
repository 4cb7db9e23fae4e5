pub mod handlers;

pub use handlers::*;

use crate::service::LabelService;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 构建路由
pub fn router(service: Arc<LabelService>) -> Router {
    let session_routes = Router::new()
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/:id", delete(close_session))
        .route("/api/sessions/:id/receipt", post(lookup_receipt))
        .route("/api/sessions/:id/overrides", put(update_overrides))
        .route("/api/sessions/:id/fields", get(get_fields))
        .route("/api/sessions/:id/preview", get(get_preview))
        .route("/api/sessions/:id/print", post(print_label));

    let print_routes = Router::new()
        .route("/api/printers", get(list_printers))
        .route("/api/print/status", get(print_status))
        .route("/api/print/cancel", post(cancel_print));

    Router::new()
        .route("/health", get(health_check))
        .merge(session_routes)
        .merge(print_routes)
        .layer(ServiceBuilder::new())
        .with_state(service)
}
