use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use invoice_desk::models::{
    AmountValue, Decision, Invoice, InvoiceEdit, InvoiceId, Queue, SessionContext, UploadReceipt,
    UploadedDocument,
};
use invoice_desk::{api, AppError, DeskService, InvoiceStore};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// 内存中的 webhook 替身，记录收到的意图
#[derive(Default)]
pub struct MemoryStore {
    pub invoices: Mutex<Vec<Invoice>>,
    pub decisions: Mutex<Vec<Decision>>,
    pub resubmitted: Mutex<Vec<(InvoiceId, InvoiceEdit)>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub fetches: Mutex<Vec<Queue>>,
}

impl MemoryStore {
    pub fn with_invoices(invoices: Vec<Invoice>) -> Arc<Self> {
        Arc::new(Self {
            invoices: Mutex::new(invoices),
            ..Self::default()
        })
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn fetch_invoices(
        &self,
        _ctx: &SessionContext,
        queue: Queue,
    ) -> Result<Vec<Invoice>, AppError> {
        self.fetches.lock().unwrap().push(queue);
        Ok(self.invoices.lock().unwrap().clone())
    }

    async fn submit_decision(
        &self,
        _ctx: &SessionContext,
        decision: &Decision,
    ) -> Result<(), AppError> {
        self.decisions.lock().unwrap().push(decision.clone());
        Ok(())
    }

    async fn resubmit(
        &self,
        _ctx: &SessionContext,
        id: &InvoiceId,
        edit: &InvoiceEdit,
    ) -> Result<(), AppError> {
        self.resubmitted.lock().unwrap().push((id.clone(), edit.clone()));
        Ok(())
    }

    async fn upload(
        &self,
        _ctx: &SessionContext,
        document: UploadedDocument,
    ) -> Result<UploadReceipt, AppError> {
        self.uploads
            .lock()
            .unwrap()
            .push((document.file_name, document.bytes.len()));
        Ok(UploadReceipt {
            id: Some(InvoiceId::Number(99)),
            message: Some("queued for extraction".into()),
        })
    }
}

/// 25 张待审核发票，id 14 被拒且带意见
pub fn sample_invoices() -> Vec<Invoice> {
    (1..=25i64)
        .map(|id| {
            let mut invoice = Invoice {
                vendor: Some(format!("Vendor {:02}", id)),
                invoice_date: Some(format!("2024-01-{:02}", id)),
                amount: Some(AmountValue::Number(id as f64 * 10.0)),
                category: Some("Office".into()),
                status: Some("for_review".into()),
                submitted_by: Some("bob".into()),
                ..Invoice::new(id)
            };
            if id == 14 {
                invoice.status = Some("declined".into());
                invoice.review_comment = Some("VAT number missing".into());
                invoice.submitted_by = Some("ann".into());
            }
            invoice
        })
        .collect()
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: axum::Router,
}

impl TestApp {
    pub fn new(invoices: Vec<Invoice>) -> Self {
        let store = MemoryStore::with_invoices(invoices);
        let desk = Arc::new(DeskService::new(store.clone()));
        Self {
            store,
            router: api::router(desk),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        roles: &str,
        body: Option<serde_json::Value>,
    ) -> (u16, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer test-token")
            .header("x-user-id", "ann")
            .header("x-user-roles", roles);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }
}
