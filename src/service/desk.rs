use crate::error::AppError;
use crate::models::{
    Decision, DecisionAction, DecisionStage, Invoice, InvoiceEdit, InvoiceId, Queue,
    SessionContext, UploadReceipt, UploadedDocument,
};
use crate::remote::InvoiceStore;
use crate::service::presenter::{export_csv, render_page, PageView};
use crate::service::sessions::{ViewSession, ViewSessions};
use crate::service::sorting::SortColumn;
use crate::service::workflow::{
    authorize_decision, authorize_queue, authorize_resubmit, default_queue,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// 发票工作台服务：抓取批次、维护视图会话、转发审批意图
pub struct DeskService {
    store: Arc<dyn InvoiceStore>,
    sessions: ViewSessions,
}

impl DeskService {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self {
            store,
            sessions: ViewSessions::new(),
        }
    }

    fn render(&self, ctx: &SessionContext, id: Uuid) -> Result<PageView, AppError> {
        let now = Utc::now();
        self.sessions.with_session(ctx, id, |s| {
            render_page(id, s.queue, &s.invoices, &s.state, ctx, now)
        })
    }

    /// 打开队列：抓取批次并新建视图会话 (视图状态从头开始)
    pub async fn open_session(
        &self,
        ctx: &SessionContext,
        queue: Option<Queue>,
    ) -> Result<PageView, AppError> {
        let queue = queue.unwrap_or_else(|| default_queue(ctx.roles));
        if let Err(e) = authorize_queue(ctx.roles, queue) {
            tracing::warn!("{} tried to open queue {}", ctx.user_id, queue);
            return Err(e);
        }

        let invoices = self.store.fetch_invoices(ctx, queue).await?;
        let id = self.sessions.open(ViewSession::new(&ctx.user_id, queue, invoices));
        self.render(ctx, id)
    }

    pub fn page_view(&self, ctx: &SessionContext, id: Uuid) -> Result<PageView, AppError> {
        self.render(ctx, id)
    }

    pub fn sort(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        column: SortColumn,
    ) -> Result<PageView, AppError> {
        self.sessions
            .with_session(ctx, id, |s| s.state.sort(column, &s.invoices))?;
        self.render(ctx, id)
    }

    pub fn go_to_page(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        page: usize,
    ) -> Result<PageView, AppError> {
        self.sessions
            .with_session(ctx, id, |s| s.state.go_to_page(page, &s.invoices))?;
        self.render(ctx, id)
    }

    pub fn toggle_expand(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        invoice_id: &InvoiceId,
    ) -> Result<PageView, AppError> {
        self.sessions
            .with_session(ctx, id, |s| s.state.toggle_expand(invoice_id))?;
        self.render(ctx, id)
    }

    pub fn set_filter(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        query: Option<&str>,
    ) -> Result<PageView, AppError> {
        self.sessions
            .with_session(ctx, id, |s| s.state.set_filter(query, &s.invoices))?;
        self.render(ctx, id)
    }

    /// 重新抓取当前队列，保留排序和过滤
    pub async fn refresh(&self, ctx: &SessionContext, id: Uuid) -> Result<PageView, AppError> {
        let queue = self.sessions.with_session(ctx, id, |s| s.queue)?;
        let invoices = self.store.fetch_invoices(ctx, queue).await?;
        self.sessions
            .with_session(ctx, id, |s| s.replace_batch(invoices))?;
        self.render(ctx, id)
    }

    pub fn export(&self, ctx: &SessionContext, id: Uuid) -> Result<Vec<u8>, AppError> {
        let bytes = self
            .sessions
            .with_session(ctx, id, |s| export_csv(&s.invoices, &s.state))??;
        Ok(bytes)
    }

    pub fn close(&self, ctx: &SessionContext, id: Uuid) -> Result<(), AppError> {
        self.sessions.close(ctx, id)
    }

    /// 审批/拒绝：校验角色后转发给 webhook
    pub async fn decide(
        &self,
        ctx: &SessionContext,
        invoice_id: InvoiceId,
        action: DecisionAction,
        stage: DecisionStage,
        comment: Option<String>,
    ) -> Result<(), AppError> {
        if let Err(e) = authorize_decision(ctx.roles, stage) {
            tracing::warn!("{} tried to {:?} invoice {} at {:?}", ctx.user_id, action, invoice_id, stage);
            return Err(e);
        }
        let comment = comment.filter(|c| !c.trim().is_empty());
        if action == DecisionAction::Decline && comment.is_none() {
            return Err(AppError::MalformedPayload("a decline needs a reason".into()));
        }

        let decision = Decision {
            invoice_id,
            action,
            stage,
            comment,
        };
        self.store.submit_decision(ctx, &decision).await?;
        tracing::info!(
            "{} forwarded {:?} for invoice {} ({:?} stage)",
            ctx.user_id,
            decision.action,
            decision.invoice_id,
            decision.stage
        );
        Ok(())
    }

    /// 重新提交：发票取自调用方的视图会话，无会话时取其已提交队列
    pub async fn resubmit(
        &self,
        ctx: &SessionContext,
        session_id: Option<Uuid>,
        invoice_id: &InvoiceId,
        edit: &InvoiceEdit,
    ) -> Result<(), AppError> {
        let find = |invoices: &[Invoice]| invoices.iter().find(|i| &i.id == invoice_id).cloned();
        let invoice = match session_id {
            Some(id) => self.sessions.with_session(ctx, id, |s| find(&s.invoices))?,
            None => find(&self.store.fetch_invoices(ctx, Queue::Submitted).await?),
        };
        let Some(invoice) = invoice else {
            return Err(AppError::Forbidden(format!(
                "invoice {} cannot be resubmitted",
                invoice_id
            )));
        };
        if let Err(e) = authorize_resubmit(&invoice, ctx) {
            tracing::warn!("{} tried to resubmit invoice {}", ctx.user_id, invoice_id);
            return Err(e);
        }

        self.store.resubmit(ctx, invoice_id, edit).await?;
        tracing::info!("{} resubmitted invoice {}", ctx.user_id, invoice_id);
        Ok(())
    }

    pub async fn upload(
        &self,
        ctx: &SessionContext,
        document: UploadedDocument,
    ) -> Result<UploadReceipt, AppError> {
        if document.bytes.is_empty() {
            return Err(AppError::MalformedPayload("empty document".into()));
        }
        self.store.upload(ctx, document).await
    }
}
