use crate::models::{effective_status, Invoice, InvoiceId, Queue, SessionContext, StatusBadge};
use crate::service::format::{format_currency, format_date, format_date_time, format_time_elapsed_at};
use crate::service::view_state::{ListViewState, SortState, PAGE_SIZE};
use crate::service::workflow::{row_actions, RowAction};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 渲染后的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRow {
    pub id: InvoiceId,
    pub vendor: String,
    pub invoice_date: String,
    pub amount: String,
    pub category: String,
    pub status: StatusBadge,
    pub submitted_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub approved_by: Option<String>,
    pub submitted: String,
    pub reviewed_at: String,
    pub approved_at: String,
    pub review_comment: Option<String>,
    pub approval_comment: Option<String>,
    pub document_url: Option<String>,
    pub expanded: bool,
    pub actions: Vec<RowAction>,
}

/// 一页视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub session_id: Uuid,
    pub queue: Queue,
    pub rows: Vec<InvoiceRow>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub page_size: usize,
    pub sort: SortState,
    pub filter: Option<String>,
}

pub fn render_row(
    invoice: &Invoice,
    state: &ListViewState,
    ctx: &SessionContext,
    now: DateTime<Utc>,
) -> InvoiceRow {
    InvoiceRow {
        id: invoice.id.clone(),
        vendor: invoice.vendor.clone().unwrap_or_default(),
        invoice_date: invoice.invoice_date.as_deref().map(format_date).unwrap_or_default(),
        amount: format_currency(invoice.amount.as_ref(), invoice.currency.as_deref()),
        category: invoice.category.clone().unwrap_or_default(),
        status: effective_status(invoice).badge(),
        submitted_by: invoice.submitted_by.clone(),
        reviewed_by: invoice.reviewed_by.clone(),
        approved_by: invoice.approved_by.clone(),
        submitted: format_time_elapsed_at(invoice.submitted_at.as_deref(), now),
        reviewed_at: format_date_time(invoice.reviewed_at.as_deref()),
        approved_at: format_date_time(invoice.approved_at.as_deref()),
        review_comment: invoice.review_comment.clone(),
        approval_comment: invoice.approval_comment.clone(),
        document_url: invoice.document_url.clone(),
        expanded: state.is_expanded(&invoice.id),
        actions: row_actions(invoice, ctx),
    }
}

pub fn render_page(
    session_id: Uuid,
    queue: Queue,
    invoices: &[Invoice],
    state: &ListViewState,
    ctx: &SessionContext,
    now: DateTime<Utc>,
) -> PageView {
    let total_records = state.derive(invoices).len();
    let rows = state
        .visible(invoices)
        .into_iter()
        .map(|invoice| render_row(invoice, state, ctx, now))
        .collect();

    PageView {
        session_id,
        queue,
        rows,
        current_page: state.current_page(),
        total_pages: crate::service::view_state::total_pages(total_records),
        total_records,
        page_size: PAGE_SIZE,
        sort: state.sort_state(),
        filter: state.filter().map(str::to_string),
    }
}

/// CSV 表头
const EXPORT_HEADER: [&str; 12] = [
    "id",
    "vendor",
    "invoice_date",
    "amount",
    "currency",
    "category",
    "status",
    "submitted_by",
    "reviewed_by",
    "approved_by",
    "review_comment",
    "approval_comment",
];

/// 导出过滤 + 排序后的完整列表（不分页）
pub fn export_csv(invoices: &[Invoice], state: &ListViewState) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for invoice in state.derive(invoices) {
        let status = effective_status(invoice);
        writer.write_record([
            invoice.id.to_string(),
            invoice.vendor.clone().unwrap_or_default(),
            invoice.invoice_date.as_deref().map(format_date).unwrap_or_default(),
            format_currency(invoice.amount.as_ref(), invoice.currency.as_deref()),
            invoice.currency_code().to_string(),
            invoice.category.clone().unwrap_or_default(),
            status.label().to_string(),
            invoice.submitted_by.clone().unwrap_or_default(),
            invoice.reviewed_by.clone().unwrap_or_default(),
            invoice.approved_by.clone().unwrap_or_default(),
            invoice.review_comment.clone().unwrap_or_default(),
            invoice.approval_comment.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
