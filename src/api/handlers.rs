use crate::engine::EngineError;
use crate::erp::ErpError;
use crate::models::{LabelOverrides, PrintProgress, ReceiptMode, ReceiptQuery};
use crate::service::{LabelService, PrintError, ServiceError, SessionError, SessionId};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

const NOT_FOUND_GUIDANCE: &str = "查无相关资料, 请确认单别、单号、项次是否正确后重新输入";

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 开启模板请求
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub template: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub template: PathBuf,
}

/// 单据查询请求
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub doc_type: String,
    pub doc_number: String,
    pub doc_item: String,
    /// 勾选 "托外进货"
    #[serde(default)]
    pub subcontract: bool,
}

/// 列印请求; 未指定印表机时使用预设印表机
#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub printer: Option<String>,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct PrinterList {
    pub engine: &'static str,
    pub default_printer: String,
    pub printers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PrintStatus {
    pub progress: PrintProgress,
}

fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    let response = ApiResponse {
        success: true,
        message: message.into(),
        data: Some(data),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn fail(e: ServiceError) -> Response {
    let status = status_of(&e);
    let message = match &e {
        ServiceError::Erp(erp) if erp.is_not_found() => NOT_FOUND_GUIDANCE.to_string(),
        _ => format!("Error: {}", e),
    };
    if status.is_server_error() {
        tracing::error!("请求失败 ({}): {}", status, e);
    } else {
        tracing::warn!("请求失败 ({}): {}", status, e);
    }

    let response: ApiResponse<()> = ApiResponse {
        success: false,
        message,
        data: None,
    };
    (status, Json(response)).into_response()
}

/// 错误 -> HTTP 状态
///
/// 查无资料为 404, 输入错误为 400, 列印忙碌为 409, 外部系统失败为 502。
pub fn status_of(e: &ServiceError) -> StatusCode {
    match e {
        ServiceError::Erp(erp) if erp.is_not_found() => StatusCode::NOT_FOUND,
        ServiceError::Erp(ErpError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
        ServiceError::Erp(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
        ServiceError::Session(SessionError::Map(_)) => StatusCode::BAD_REQUEST,
        ServiceError::Session(SessionError::Engine(EngineError::TemplateNotFound(_))) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Session(SessionError::Engine(_)) => StatusCode::BAD_GATEWAY,
        ServiceError::Session(SessionError::Poisoned) => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Print(PrintError::InvalidCopies(_) | PrintError::NoPrinter) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Print(PrintError::Busy | PrintError::Cancelled) => StatusCode::CONFLICT,
        ServiceError::Print(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 可用印表机
pub async fn list_printers(State(service): State<Arc<LabelService>>) -> Response {
    let printers = PrinterList {
        engine: service.engine_name(),
        default_printer: service.default_printer().to_string(),
        printers: service.printers(),
    };
    ok(format!("{} printers", printers.printers.len()), printers)
}

/// 载入标签模板
pub async fn open_session(
    State(service): State<Arc<LabelService>>,
    Json(req): Json<OpenSessionRequest>,
) -> Response {
    match service.open_template(&req.template) {
        Ok(session) => {
            let info = SessionInfo {
                session_id: session.id(),
                template: session.template().to_path_buf(),
            };
            ok(format!("Session {} opened", info.session_id), info)
        }
        Err(e) => fail(e),
    }
}

pub async fn close_session(
    State(service): State<Arc<LabelService>>,
    Path(id): Path<SessionId>,
) -> Response {
    match service.close_session(id) {
        Ok(()) => ok(format!("Session {} closed", id), ()),
        Err(e) => fail(e),
    }
}

/// 查询 ERP 单据并带入标签栏位
pub async fn lookup_receipt(
    State(service): State<Arc<LabelService>>,
    Path(id): Path<SessionId>,
    Json(req): Json<LookupRequest>,
) -> Response {
    let query = ReceiptQuery::new(
        req.doc_type,
        req.doc_number,
        req.doc_item,
        ReceiptMode::from_subcontract_flag(req.subcontract),
    );
    match service.lookup_receipt(id, &query).await {
        Ok(result) => {
            let message = format!(
                "Loaded {} {}-{}-{}",
                query.mode.label(),
                result.record.doc_type,
                result.record.doc_number,
                result.record.doc_item
            );
            ok(message, result)
        }
        Err(e) => fail(e),
    }
}

/// 更新手动输入栏位
pub async fn update_overrides(
    State(service): State<Arc<LabelService>>,
    Path(id): Path<SessionId>,
    Json(overrides): Json<LabelOverrides>,
) -> Response {
    match service.update_overrides(id, overrides).await {
        Ok(fields) => ok(format!("{} fields pushed", fields.len()), fields),
        Err(e) => fail(e),
    }
}

pub async fn get_fields(
    State(service): State<Arc<LabelService>>,
    Path(id): Path<SessionId>,
) -> Response {
    match service.fields(id) {
        Ok(fields) => ok(format!("{} fields", fields.len()), fields),
        Err(e) => fail(e),
    }
}

pub async fn get_preview(
    State(service): State<Arc<LabelService>>,
    Path(id): Path<SessionId>,
) -> Response {
    match service.preview(id).await {
        Ok(preview) => ok(format!("Preview of {}", preview.template), preview),
        Err(e) => fail(e),
    }
}

/// 送印
pub async fn print_label(
    State(service): State<Arc<LabelService>>,
    Path(id): Path<SessionId>,
    Json(req): Json<PrintRequest>,
) -> Response {
    match service.print(id, req.printer, req.copies).await {
        Ok(outcome) => {
            let message = format!(
                "Printed {} copies of {} on {}",
                outcome.copies, outcome.template, outcome.printer
            );
            ok(message, outcome)
        }
        Err(e) => fail(e),
    }
}

pub async fn print_status(State(service): State<Arc<LabelService>>) -> Response {
    let status = PrintStatus {
        progress: service.print_progress(),
    };
    ok("Print status", status)
}

/// 取消尚未送出的列印工作
pub async fn cancel_print(State(service): State<Arc<LabelService>>) -> Response {
    if service.cancel_print() {
        ok("Cancellation requested", ())
    } else {
        let response: ApiResponse<()> = ApiResponse {
            success: false,
            message: "No queued print job to cancel".to_string(),
            data: None,
        };
        (StatusCode::CONFLICT, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MapError;
    use std::time::Duration;

    #[test]
    fn error_status_mapping() {
        let cases = [
            (ServiceError::Erp(ErpError::NotFound), StatusCode::NOT_FOUND),
            (ServiceError::Erp(ErpError::Malformed("x".into())), StatusCode::NOT_FOUND),
            (ServiceError::Erp(ErpError::InvalidQuery("DocType".into())), StatusCode::BAD_REQUEST),
            (ServiceError::Erp(ErpError::Status(500)), StatusCode::BAD_GATEWAY),
            (ServiceError::Session(SessionError::NotFound(7)), StatusCode::NOT_FOUND),
            (
                ServiceError::Session(SessionError::Map(MapError::InvalidQuantity("x".into()))),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::Print(PrintError::InvalidCopies(0)), StatusCode::BAD_REQUEST),
            (ServiceError::Print(PrintError::Busy), StatusCode::CONFLICT),
            (
                ServiceError::Print(PrintError::Timeout(Duration::from_secs(30))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ServiceError::Print(PrintError::Engine(EngineError::PrinterUnavailable("p".into()))),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_of(&err), status, "{err}");
        }
    }

    #[test]
    fn print_request_defaults_to_one_copy() {
        let req: PrintRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.copies, 1);
        assert!(req.printer.is_none());
    }
}
