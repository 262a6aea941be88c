use crate::error::AppError;
use crate::models::{
    Decision, Invoice, InvoiceEdit, InvoiceId, Queue, SessionContext, UploadReceipt,
    UploadedDocument,
};
use async_trait::async_trait;

/// 远程发票存储 (抓取、审批、重提、上传都在 webhook 后面完成)
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn fetch_invoices(
        &self,
        ctx: &SessionContext,
        queue: Queue,
    ) -> Result<Vec<Invoice>, AppError>;

    async fn submit_decision(
        &self,
        ctx: &SessionContext,
        decision: &Decision,
    ) -> Result<(), AppError>;

    async fn resubmit(
        &self,
        ctx: &SessionContext,
        id: &InvoiceId,
        edit: &InvoiceEdit,
    ) -> Result<(), AppError>;

    async fn upload(
        &self,
        ctx: &SessionContext,
        document: UploadedDocument,
    ) -> Result<UploadReceipt, AppError>;
}
