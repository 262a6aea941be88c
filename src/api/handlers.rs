use crate::error::AppError;
use crate::models::{
    DecisionAction, DecisionStage, InvoiceEdit, InvoiceId, Queue, SessionContext, UploadReceipt,
    UploadedDocument,
};
use crate::service::workflow::{available_queues, default_queue};
use crate::service::{DeskService, PageView, SortColumn};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap,
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const FILE_NAME_HEADER: &str = "x-file-name";

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| AppError::MalformedPayload(e.body_text()))
}

/// 可打开的队列
#[derive(Debug, Serialize)]
pub struct QueuesResponse {
    pub available: Vec<Queue>,
    pub default: Queue,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub queue: Option<Queue>,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub column: SortColumn,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRequest {
    pub invoice_id: InvoiceId,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub stage: DecisionStage,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclineRequest {
    pub stage: DecisionStage,
    pub reason: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResubmitRequest {
    #[serde(flatten)]
    pub edit: InvoiceEdit,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// 意图转发结果；带 sessionId 时附上刷新后的页面
#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub success: bool,
    pub message: String,
    pub page: Option<PageView>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub receipt: UploadReceipt,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn list_queues(ctx: SessionContext) -> Json<QueuesResponse> {
    Json(QueuesResponse {
        available: available_queues(ctx.roles),
        default: default_queue(ctx.roles),
    })
}

pub async fn open_session(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    body: Result<Json<OpenSessionRequest>, JsonRejection>,
) -> Result<Json<PageView>, AppError> {
    let req = payload(body)?;
    Ok(Json(desk.open_session(&ctx, req.queue).await?))
}

pub async fn page_view(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PageView>, AppError> {
    Ok(Json(desk.page_view(&ctx, id)?))
}

pub async fn sort(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    body: Result<Json<SortRequest>, JsonRejection>,
) -> Result<Json<PageView>, AppError> {
    let req = payload(body)?;
    Ok(Json(desk.sort(&ctx, id, req.column)?))
}

pub async fn go_to_page(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    body: Result<Json<PageRequest>, JsonRejection>,
) -> Result<Json<PageView>, AppError> {
    let req = payload(body)?;
    Ok(Json(desk.go_to_page(&ctx, id, req.page)?))
}

pub async fn toggle_expand(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    body: Result<Json<ExpandRequest>, JsonRejection>,
) -> Result<Json<PageView>, AppError> {
    let req = payload(body)?;
    Ok(Json(desk.toggle_expand(&ctx, id, &req.invoice_id)?))
}

pub async fn set_filter(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    body: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<PageView>, AppError> {
    let req = payload(body)?;
    Ok(Json(desk.set_filter(&ctx, id, req.query.as_deref())?))
}

pub async fn refresh(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PageView>, AppError> {
    Ok(Json(desk.refresh(&ctx, id).await?))
}

pub async fn export(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = desk.export(&ctx, id)?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"invoices.csv\""),
        ],
        bytes,
    ))
}

pub async fn close_session(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<IntentResponse>, AppError> {
    desk.close(&ctx, id)?;
    Ok(Json(IntentResponse {
        success: true,
        message: format!("Closed view session {}", id),
        page: None,
    }))
}

async fn after_intent(
    desk: &DeskService,
    ctx: &SessionContext,
    session_id: Option<Uuid>,
    message: String,
) -> Result<Json<IntentResponse>, AppError> {
    let page = match session_id {
        Some(id) => Some(desk.refresh(ctx, id).await?),
        None => None,
    };
    Ok(Json(IntentResponse {
        success: true,
        message,
        page,
    }))
}

pub async fn approve(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(invoice_id): Path<String>,
    body: Result<Json<ApproveRequest>, JsonRejection>,
) -> Result<Json<IntentResponse>, AppError> {
    let req = payload(body)?;
    let invoice_id = InvoiceId::from_path(&invoice_id);
    desk.decide(&ctx, invoice_id.clone(), DecisionAction::Approve, req.stage, req.comment)
        .await?;
    after_intent(&desk, &ctx, req.session_id, format!("Invoice {} approved", invoice_id)).await
}

pub async fn decline(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(invoice_id): Path<String>,
    body: Result<Json<DeclineRequest>, JsonRejection>,
) -> Result<Json<IntentResponse>, AppError> {
    let req = payload(body)?;
    let invoice_id = InvoiceId::from_path(&invoice_id);
    desk.decide(&ctx, invoice_id.clone(), DecisionAction::Decline, req.stage, Some(req.reason))
        .await?;
    after_intent(&desk, &ctx, req.session_id, format!("Invoice {} declined", invoice_id)).await
}

pub async fn resubmit(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    Path(invoice_id): Path<String>,
    body: Result<Json<ResubmitRequest>, JsonRejection>,
) -> Result<Json<IntentResponse>, AppError> {
    let req = payload(body)?;
    let invoice_id = InvoiceId::from_path(&invoice_id);
    desk.resubmit(&ctx, req.session_id, &invoice_id, &req.edit).await?;
    after_intent(&desk, &ctx, req.session_id, format!("Invoice {} resubmitted", invoice_id)).await
}

pub async fn upload(
    State(desk): State<Arc<DeskService>>,
    ctx: SessionContext,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let file_name = text(FILE_NAME_HEADER)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::MalformedPayload("X-File-Name header required".into()))?;
    let content_type = text(CONTENT_TYPE.as_str())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let document = UploadedDocument {
        file_name: file_name.clone(),
        content_type,
        bytes: body.to_vec(),
    };
    let receipt = desk.upload(&ctx, document).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: format!("Uploaded {}", file_name),
        receipt,
    }))
}
