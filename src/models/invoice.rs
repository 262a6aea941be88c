use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// 发票 ID：webhook 可能返回数字或字符串
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvoiceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceId::Number(n) => write!(f, "{}", n),
            InvoiceId::Text(s) => f.write_str(s),
        }
    }
}

impl InvoiceId {
    /// 路径参数中的 ID：能解析为整数的按数字处理
    pub fn from_path(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(InvoiceId::Number)
            .unwrap_or_else(|_| InvoiceId::Text(raw.to_string()))
    }
}

impl From<i64> for InvoiceId {
    fn from(n: i64) -> Self {
        InvoiceId::Number(n)
    }
}

impl From<&str> for InvoiceId {
    fn from(s: &str) -> Self {
        InvoiceId::Text(s.to_string())
    }
}

/// 金额原始值：数字或字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Number(f64),
    Text(String),
}

/// 发票记录 (由远程 webhook 提供，只读)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(deserialize_with = "lenient_id")]
    pub id: InvoiceId,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountValue>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub approved: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub declined: Option<bool>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default, rename = "review_comment")]
    pub review_comment: Option<String>,
    #[serde(default, rename = "approval_comment")]
    pub approval_comment: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<String>,
    #[serde(default)]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
}

/// 整数值的浮点 ID (`2.0`) 归为数字
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<InvoiceId, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(InvoiceId::Number(i)),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(InvoiceId::Number(f as i64))
            }
            _ => Ok(InvoiceId::Text(n.to_string())),
        },
        Value::String(s) => Ok(InvoiceId::Text(s)),
        other => Err(D::Error::custom(format!("invalid invoice id: {}", other))),
    }
}

/// 标志位：接受布尔、"true"/"false" 字符串和 0/1，其余视为缺失
fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}

impl Default for InvoiceId {
    fn default() -> Self {
        InvoiceId::Number(0)
    }
}

impl Invoice {
    pub fn new(id: impl Into<InvoiceId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// 币种，缺省 USD
    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }

    /// 是否带有非空的审核/审批意见
    pub fn has_comment(&self) -> bool {
        let non_empty = |c: &Option<String>| c.as_deref().is_some_and(|s| !s.is_empty());
        non_empty(&self.review_comment) || non_empty(&self.approval_comment)
    }
}

/// 批量响应：`{ "invoices": [...] }` 或直接数组；逐条解析
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InvoiceBatch {
    Wrapped { invoices: Vec<Value> },
    Bare(Vec<Value>),
}

impl InvoiceBatch {
    /// 解析失败的记录记一条警告后跳过，不影响其余记录
    pub fn into_invoices(self) -> Vec<Invoice> {
        let records = match self {
            InvoiceBatch::Wrapped { invoices } => invoices,
            InvoiceBatch::Bare(invoices) => invoices,
        };
        records
            .into_iter()
            .enumerate()
            .filter_map(|(idx, record)| match serde_json::from_value::<Invoice>(record) {
                Ok(invoice) => Some(invoice),
                Err(e) => {
                    tracing::warn!("Skipping malformed invoice record #{}: {}", idx, e);
                    None
                }
            })
            .collect()
    }
}

/// 编辑后重新提交的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceEdit {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountValue>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// 上传的发票文档
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 上传回执
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub id: Option<InvoiceId>,
    #[serde(default)]
    pub message: Option<String>,
}
