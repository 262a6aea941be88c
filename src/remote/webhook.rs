use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{
    Decision, Invoice, InvoiceBatch, InvoiceEdit, InvoiceId, Queue, SessionContext,
    UploadReceipt, UploadedDocument,
};
use crate::remote::store::InvoiceStore;
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;

const USER_ID_HEADER: &str = "X-User-Id";

/// 基于 reqwest 的 webhook 存储
pub struct WebhookStore {
    client: Client,
    config: AppConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResubmitBody<'a> {
    invoice_id: &'a InvoiceId,
    #[serde(flatten)]
    edit: &'a InvoiceEdit,
}

impl WebhookStore {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.remote.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn authorized(&self, builder: RequestBuilder, ctx: &SessionContext) -> RequestBuilder {
        builder
            .bearer_auth(&ctx.token)
            .header(USER_ID_HEADER, &ctx.user_id)
    }

    fn checked(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::warn!("webhook {} returned {}", response.url(), status);
            Err(AppError::UpstreamStatus(status.as_u16()))
        }
    }
}

#[async_trait]
impl InvoiceStore for WebhookStore {
    async fn fetch_invoices(
        &self,
        ctx: &SessionContext,
        queue: Queue,
    ) -> Result<Vec<Invoice>, AppError> {
        let url = self.config.endpoint(&self.config.remote.invoices_path);
        let request = self.client.get(&url).query(&[("queue", queue.as_str())]);
        let response = self.authorized(request, ctx).send().await?;
        let batch: InvoiceBatch = Self::checked(response)?.json().await?;
        let invoices = batch.into_invoices();

        tracing::info!("Fetched {} invoices for queue {}", invoices.len(), queue);
        Ok(invoices)
    }

    async fn submit_decision(
        &self,
        ctx: &SessionContext,
        decision: &Decision,
    ) -> Result<(), AppError> {
        let url = self.config.endpoint(&self.config.remote.decision_path);
        let request = self.client.post(&url).json(decision);
        let response = self.authorized(request, ctx).send().await?;
        Self::checked(response)?;
        Ok(())
    }

    async fn resubmit(
        &self,
        ctx: &SessionContext,
        id: &InvoiceId,
        edit: &InvoiceEdit,
    ) -> Result<(), AppError> {
        let url = self.config.endpoint(&self.config.remote.resubmit_path);
        let body = ResubmitBody { invoice_id: id, edit };
        let request = self.client.post(&url).json(&body);
        let response = self.authorized(request, ctx).send().await?;
        Self::checked(response)?;
        Ok(())
    }

    async fn upload(
        &self,
        ctx: &SessionContext,
        document: UploadedDocument,
    ) -> Result<UploadReceipt, AppError> {
        let url = self.config.endpoint(&self.config.remote.upload_path);
        let size = document.bytes.len();
        // 内容类型由客户端提供，非法时属于请求错误
        let part = multipart::Part::bytes(document.bytes)
            .file_name(document.file_name.clone())
            .mime_str(&document.content_type)
            .map_err(|_| {
                AppError::MalformedPayload(format!(
                    "invalid content type: {}",
                    document.content_type
                ))
            })?;
        let form = multipart::Form::new().part("file", part);

        let request = self.client.post(&url).multipart(form);
        let response = self.authorized(request, ctx).send().await?;
        let response = Self::checked(response)?;

        // 部分 webhook 返回空响应体
        let bytes = response.bytes().await?;
        let receipt = if bytes.is_empty() {
            UploadReceipt::default()
        } else {
            serde_json::from_slice(&bytes).unwrap_or_default()
        };

        tracing::info!("Uploaded {} ({} bytes)", document.file_name, size);
        Ok(receipt)
    }
}
